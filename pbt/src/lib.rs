//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// フォームデータ生成
// ========================================

/// フィールド名: 安全なトークン文字のみ (1-8 文字)
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{1,8}".prop_map(|s| s)
}

/// フィールド値: 空白や記号、非 ASCII を含みうる文字列
pub fn field_value() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            prop::char::range('a', 'z'),
            prop::char::range('0', '9'),
            Just(' '),
            Just('&'),
            Just('='),
            Just('%'),
            Just('+'),
            Just('/'),
            Just('日'),
            Just('本'),
        ],
        0..=16,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// (名前, 値) の組のリスト
pub fn field_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((field_name(), field_value()), 0..=8)
}

/// multipart パートの名前: 終端マーカー `--` と衝突しないよう
/// `-` を含まないトークン
pub fn part_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._]{1,8}".prop_map(|s| s)
}

/// multipart パートの内容: 境界や終端マーカーと衝突しない文字のみ
/// (`-` を含まない)
pub fn part_content() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!]{0,32}".prop_map(|s| s)
}

/// multipart の境界トークン
pub fn boundary() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{4,16}".prop_map(|s| s)
}
