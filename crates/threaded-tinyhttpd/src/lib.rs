//! # threaded_tinyhttpd
//!
//! std::net と固定サイズスレッドプールによる shiguredo_tinyhttpd の
//! サーバー統合。
//!
//! アクセプタースレッドが 1 本、接続処理ワーカーが固定本数。各接続は
//! 「読み取り → ルーティング → ハンドラー実行 → クローズ」を 1 つの
//! ワーカー上で同期的に処理し、成否にかかわらず必ず閉じる
//! (`Connection: close` 方式、1 接続 1 リクエスト)。
//!
//! ルーティングテーブルはサーブ開始前にのみ登録でき、サーブ中は
//! 読み取り専用 (ロックなし)。ジョブキューは有界で、満杯のときは
//! アクセプターがブロックする (バックプレッシャー)。
//!
//! ## 使い方
//!
//! ```no_run
//! use threaded_tinyhttpd::{HandlerResult, Request, Response, ResponseSink, Server};
//!
//! fn hello(_request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
//!     let response = Response::new(200, "OK")
//!         .header("Content-Type", "text/plain")
//!         .body(b"Hello, World!".to_vec());
//!     sink.send(&response)?;
//!     Ok(())
//! }
//!
//! fn main() -> threaded_tinyhttpd::Result<()> {
//!     let mut server = Server::new();
//!     server.register("GET", "/hello", hello);
//!     server.listen(9999)
//! }
//! ```

mod error;
mod pool;
pub mod router;
mod server;

pub use error::{Error, Result};
pub use pool::WorkerPool;
pub use router::Router;
pub use server::{
    BoundServer, Handler, HandlerError, HandlerResult, ResponseSink, Server, ShutdownHandle,
};

// ハンドラー実装で使う型の再エクスポート
pub use shiguredo_tinyhttpd::{DecodeWarning, Request, Response};
