//! リクエストデコーダーのプロパティテスト

use pbt::field_name;
use proptest::prelude::*;
use shiguredo_tinyhttpd::{RequestDecoder, encode_request};

/// HTTP メソッドらしいトークン
fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
        "[A-Z]{1,8}".prop_map(|s| s),
    ]
}

/// リクエストターゲット (パスのみ、空白なし)
fn target() -> impl Strategy<Value = String> {
    "/[a-z0-9/._-]{0,24}".prop_map(|s| s)
}

/// ヘッダー値 (CR/LF と前後空白を含まない)
fn header_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ._/;=-]{0,24}".prop_map(|s| s.trim().to_string())
}

fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((field_name(), header_value()), 0..=6).prop_map(|pairs| {
        pairs
            .into_iter()
            // Content-Length はエンコーダーが付与するので除外
            .filter(|(name, _)| name != "Content-Length")
            .collect()
    })
}

fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=64)
}

proptest! {
    /// エンコード → デコードで開始行・ヘッダー・ボディが復元される
    #[test]
    fn prop_encode_decode_roundtrip(
        method in method(),
        target in target(),
        headers in headers(),
        body in body(),
    ) {
        let bytes = encode_request(&method, &target, &headers, &body);

        let mut decoder = RequestDecoder::new();
        decoder.feed(&bytes).unwrap();
        let request = decoder.finish().unwrap().unwrap();

        prop_assert_eq!(request.method(), method.as_str());
        prop_assert_eq!(request.full_path(), target.as_str());
        prop_assert_eq!(request.body(), body.as_slice());
        for (name, _) in &headers {
            // 同名ヘッダーは最後の値が勝つ
            let last = headers.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
            prop_assert_eq!(request.header(name), last);
        }
    }

    /// 投入単位の分割に結果が依存しない
    #[test]
    fn prop_feed_chunking_is_irrelevant(
        target in target(),
        body in body(),
        split in 0usize..=128,
    ) {
        let headers = Vec::new();
        let bytes = encode_request("POST", &target, &headers, &body);

        let mut whole = RequestDecoder::new();
        whole.feed(&bytes).unwrap();
        let expected = whole.finish().unwrap().unwrap();

        let split = split.min(bytes.len());
        let mut chunked = RequestDecoder::new();
        chunked.feed(&bytes[..split]).unwrap();
        let early = chunked.decode().unwrap();
        let request = match early {
            Some(request) => request,
            None => {
                chunked.feed(&bytes[split..]).unwrap();
                chunked.finish().unwrap().unwrap()
            }
        };

        prop_assert_eq!(request.method(), expected.method());
        prop_assert_eq!(request.full_path(), expected.full_path());
        prop_assert_eq!(request.body(), expected.body());
    }
}
