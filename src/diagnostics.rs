//! デコード診断イベント
//!
//! 寛容なパースで読み飛ばした・切り詰めた入力を記録する。
//! デコーダーはこれらの状況で接続を落とさず空の結果に退避するため、
//! ログ文字列に頼らず「失敗が観測されたこと」をテストで検証できるよう
//! 構造化されたイベントとして [`Request::warnings`](crate::Request::warnings)
//! から参照できる。

use std::fmt;

/// デコード中に観測された警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// コロンを含まないヘッダー行を読み飛ばした
    HeaderLineWithoutColon { line: String },
    /// Content-Length の値が数値として解釈できなかった (ボディは空として扱う)
    BadContentLength { value: String },
    /// ストリームが Content-Length より早く終端した (ボディは短いまま確定)
    TruncatedBody { expected: usize, received: usize },
    /// multipart の Content-Type から boundary を抽出できなかった (結果は空)
    MissingBoundary,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::HeaderLineWithoutColon { line } => {
                write!(f, "header line without colon skipped: {:?}", line)
            }
            DecodeWarning::BadContentLength { value } => {
                write!(f, "unparsable Content-Length treated as empty body: {:?}", value)
            }
            DecodeWarning::TruncatedBody { expected, received } => {
                write!(f, "body truncated: expected {} bytes, received {}", expected, received)
            }
            DecodeWarning::MissingBoundary => {
                write!(f, "multipart boundary missing in Content-Type")
            }
        }
    }
}
