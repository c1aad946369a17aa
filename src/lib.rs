//! # shiguredo_tinyhttpd
//!
//! 依存なしの最小 HTTP/1.1 サーバー向けプロトコルライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **依存なし**: 標準ライブラリのみ使用
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **寛容なパース**: 不正なヘッダー行や壊れたフォーム入力は
//!   接続を落とさず、構造化された警告イベントに退避する
//!
//! ボディの読み取りは Content-Length 単位のみ対応。chunked 転送や
//! キープアライブ接続の管理はスコープ外 (接続ごとに 1 リクエスト)。
//!
//! ## 使い方
//!
//! ### リクエストのデコード
//!
//! ```rust
//! use shiguredo_tinyhttpd::RequestDecoder;
//!
//! let mut decoder = RequestDecoder::new();
//! decoder
//!     .feed(b"GET /search?q=rust&tag=a&tag=b HTTP/1.1\r\nHost: example.com\r\n\r\n")
//!     .unwrap();
//!
//! let request = decoder.decode().unwrap().unwrap();
//! assert_eq!(request.method(), "GET");
//! assert_eq!(request.path(), "/search");
//! assert_eq!(request.query_param("q"), Some("rust"));
//! assert_eq!(request.query_params("tag"), vec!["a", "b"]);
//! ```
//!
//! ### レスポンスのエンコード
//!
//! ```rust
//! use shiguredo_tinyhttpd::Response;
//!
//! let response = Response::new(200, "OK")
//!     .header("Content-Type", "text/plain")
//!     .header("Connection", "close")
//!     .body(b"Hello, World!".to_vec());
//! let bytes = response.encode();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

mod decoder;
pub mod diagnostics;
mod encoder;
mod error;
mod limits;
pub mod multipart;
mod request;
mod response;
pub mod urlencoded;

pub use decoder::RequestDecoder;
pub use diagnostics::DecodeWarning;
pub use encoder::{encode_request, encode_response};
pub use error::Error;
pub use limits::DecoderLimits;
pub use request::Request;
pub use response::Response;
