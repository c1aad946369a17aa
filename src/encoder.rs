//! ワイヤフォーマットへのエンコード
//!
//! レスポンスは `HTTP/1.1 <code> <reason>\r\n` + ヘッダー + 空行 + ボディ
//! のバイト列になる。Content-Length は未設定なら必ず自動付与する
//! (ボディが空でも `Content-Length: 0`)。

use crate::response::Response;

/// レスポンスをエンコード
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line: VERSION SP STATUS-CODE SP REASON-PHRASE CRLF
    buf.extend_from_slice(response.version.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.status_code.to_string().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.reason_phrase.as_bytes());
    buf.extend_from_slice(b"\r\n");

    // Headers
    for (name, value) in &response.headers {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Content-Length (未設定なら自動付与)
    if !response.has_header("Content-Length") {
        buf.extend_from_slice(b"Content-Length: ");
        buf.extend_from_slice(response.body.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // End of headers
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&response.body);

    buf
}

/// リクエストをエンコード
///
/// テストやクライアント側でワイヤバイト列を組み立てるためのヘルパー。
/// ボディが空でなく Content-Length が未設定なら自動付与する。
pub fn encode_request(
    method: &str,
    target: &str,
    headers: &[(String, String)],
    body: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::new();

    // Request line: METHOD SP TARGET SP VERSION CRLF
    buf.extend_from_slice(method.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(target.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    // Headers
    for (name, value) in headers {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    let has_content_length = headers.iter().any(|(n, _)| n == "Content-Length");
    if !body.is_empty() && !has_content_length {
        buf.extend_from_slice(b"Content-Length: ");
        buf.extend_from_slice(body.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // End of headers
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(body);

    buf
}

impl Response {
    /// レスポンスをバイト列にエンコード
    pub fn encode(&self) -> Vec<u8> {
        encode_response(self)
    }
}
