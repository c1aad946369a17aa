//! URL エンコードのプロパティテスト

use pbt::{field_name, field_value};
use proptest::prelude::*;
use shiguredo_tinyhttpd::urlencoded::{self, Params};

proptest! {
    /// エンコード → デコードのラウンドトリップで、キーごとの値の
    /// 出現順を含めて元のマッピングが再現される
    #[test]
    fn prop_encode_decode_roundtrip(
        pairs in proptest::collection::vec((field_name(), field_value()), 0..=8)
    ) {
        let mut params = Params::new();
        for (name, value) in &pairs {
            params.push(name, value);
        }

        let encoded = urlencoded::encode(&params);
        let decoded = urlencoded::parse(&encoded);

        prop_assert_eq!(decoded, params);
    }

    /// 単一構成要素のエンコード → デコードは恒等変換
    #[test]
    fn prop_component_roundtrip(value in field_value()) {
        let encoded = urlencoded::encode_component(&value);
        prop_assert_eq!(urlencoded::decode_component(&encoded), value);
    }

    /// どんな入力でもパースはパニックしない (壊れたエスケープ含む)
    #[test]
    fn prop_parse_never_panics(input in "\\PC{0,64}") {
        let params = urlencoded::parse(&input);
        // アクセサも落ちない
        for (name, _) in params.iter() {
            let _ = params.first(name);
            let _ = params.all(name);
        }
    }

    /// クエリサフィックスの有無にかかわらず split_target のパス部は
    /// 元のターゲットの接頭辞になる
    #[test]
    fn prop_split_target_path_is_prefix(target in "/[a-z0-9/?=&]{0,32}") {
        let (path, _query) = urlencoded::split_target(&target);
        prop_assert!(target.starts_with(path));
    }
}
