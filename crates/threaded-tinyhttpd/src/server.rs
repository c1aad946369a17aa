//! HTTP サーバー
//!
//! std::net の TCP リスナーと固定サイズスレッドプールによる同期サーバー。
//!
//! アクセプターは接続の受理だけを行い、リクエスト処理では一切
//! ブロックしない。1 接続は 1 つのワーカー上で読み取りから応答書き込み
//! までを同期的に処理し、成否にかかわらず必ず閉じる。接続間に順序の
//! 保証はなく、接続内の各ステップは厳密に逐次。読み取りやハンドラーの
//! タイムアウトは設けない。
//!
//! ## 使い方
//!
//! ```no_run
//! use threaded_tinyhttpd::{HandlerResult, Request, Response, ResponseSink, Server};
//!
//! fn ping(_request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
//!     sink.send(&Response::new(200, "OK").body(b"pong".to_vec()))?;
//!     Ok(())
//! }
//!
//! let mut server = Server::new();
//! server.register("GET", "/ping", ping);
//! server.listen(8080).unwrap();
//! ```

use std::io::{BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shiguredo_tinyhttpd::{Request, RequestDecoder, Response};

use crate::error::Result;
use crate::pool::WorkerPool;
use crate::router::Router;

/// デフォルトのワーカースレッド数
pub const DEFAULT_POOL_SIZE: usize = 64;

/// デフォルトのジョブキュー容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// デフォルトの読み取りバッファサイズ
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8192;

/// ハンドラーが返すエラー
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// ハンドラーの戻り値
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// HTTP リクエストハンドラー
///
/// パース済みリクエストとレスポンスシンクを受け取り、レスポンスを
/// 書き切る。エラーを返した場合、接続はそのまま閉じられる
/// (部分的に書き込まれたバイトは取り消されない)。
pub trait Handler: Send + Sync + 'static {
    /// リクエストを処理してレスポンスを書き込む
    fn handle(&self, request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult;
}

/// 関数からハンドラーを作成
impl<F> Handler for F
where
    F: Fn(&Request, &mut ResponseSink<'_>) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
        (self)(request, sink)
    }
}

/// レスポンス書き込み用シンク
///
/// ソケットへのバッファ付きライター。生のバイト列を受け付け、
/// ハンドラーが明示的に [`flush`](Self::flush) する。
pub struct ResponseSink<'a> {
    writer: BufWriter<&'a TcpStream>,
}

impl<'a> ResponseSink<'a> {
    fn new(stream: &'a TcpStream) -> Self {
        Self {
            writer: BufWriter::with_capacity(DEFAULT_READ_BUFFER_SIZE, stream),
        }
    }

    /// 生のバイト列を書き込む
    pub fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(data)
    }

    /// バッファをソケットに書き出す
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// レスポンスをエンコードして書き込み、フラッシュする
    ///
    /// `Connection` ヘッダーが未設定なら `close` を付与する
    /// (このサーバーは接続を使い回さない)。
    pub fn send(&mut self, response: &Response) -> std::io::Result<()> {
        if response.has_header("Connection") {
            self.write(&response.encode())?;
        } else {
            let mut response = response.clone();
            response.add_header("Connection", "close");
            self.write(&response.encode())?;
        }
        self.flush()
    }
}

/// HTTP サーバー
///
/// ルート登録はサーブ開始前にのみ行うこと。[`listen`](Self::listen) か
/// [`bind`](Self::bind) + [`serve`](BoundServer::serve) で起動する。
pub struct Server {
    router: Router,
    pool_size: usize,
    queue_capacity: usize,
    read_buffer_size: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// 新しいサーバーを作成
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            pool_size: DEFAULT_POOL_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// ワーカースレッド数を設定
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// ジョブキュー容量を設定
    ///
    /// キューが満杯のとき、アクセプターは空きが出るまでブロックする。
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// 読み取りバッファサイズを設定
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// ハンドラーを登録
    ///
    /// 同じ (メソッド, パス) への再登録は上書き。サーブ開始後に
    /// 呼んではならない。
    pub fn register<H: Handler>(&mut self, method: &str, path: &str, handler: H) {
        self.router.register(method, path, handler);
    }

    /// 指定アドレスにバインド
    pub fn bind(self, addr: &str) -> Result<BoundServer> {
        let listener = TcpListener::bind(addr)?;
        Ok(BoundServer {
            listener,
            router: Arc::new(self.router),
            pool_size: self.pool_size,
            queue_capacity: self.queue_capacity,
            read_buffer_size: self.read_buffer_size,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 指定ポートでサーブを開始 (シャットダウンまでブロック)
    pub fn listen(self, port: u16) -> Result<()> {
        self.bind(&format!("0.0.0.0:{}", port))?.serve()
    }
}

/// バインド済みサーバー
pub struct BoundServer {
    listener: TcpListener,
    router: Arc<Router>,
    pool_size: usize,
    queue_capacity: usize,
    read_buffer_size: usize,
    running: Arc<AtomicBool>,
}

impl BoundServer {
    /// ローカルアドレスを取得
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// シャットダウン用ハンドルを取得
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            running: Arc::clone(&self.running),
            addr: self.listener.local_addr()?,
        })
    }

    /// アクセプトループを実行 (シャットダウンまでブロック)
    ///
    /// accept の失敗は致命的ではない: 稼働中はログに残してループを
    /// 続ける。稼働フラグが false になったらループを抜け、プールへの
    /// 新規投入を締め切り、投入済みの接続は処理し切ってから戻る。
    pub fn serve(self) -> Result<()> {
        self.running.store(true, Ordering::Release);
        let pool = WorkerPool::new(self.pool_size, self.queue_capacity);

        while self.running.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => {
                    if !self.running.load(Ordering::Acquire) {
                        // シャットダウン後の起床接続はそのまま閉じる
                        break;
                    }
                    let router = Arc::clone(&self.router);
                    let read_buffer_size = self.read_buffer_size;
                    pool.execute(move || {
                        if let Err(e) =
                            handle_connection(&stream, &router, read_buffer_size)
                        {
                            eprintln!("Connection error from {}: {}", peer_addr, e);
                        }
                    });
                }
                Err(e) => {
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    eprintln!("Accept error: {}", e);
                }
            }
        }

        // WorkerPool の Drop が投入済みジョブの完了を待つ
        drop(pool);
        Ok(())
    }
}

/// サーバーのシャットダウントリガー
///
/// 稼働フラグを落とし、ブロック中の accept を起こすための接続を
/// 1 回だけ試みる (失敗しても無視)。
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// サーバーを停止する
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        let _ = TcpStream::connect(self.addr);
    }

    /// サーバーが稼働中かどうか
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// 1 接続を処理する
///
/// 読み取り → ルーティング → ハンドラー実行、と進み、戻るときに
/// ストリームが閉じられる。スタートラインの不成立やソケットエラーは
/// `Err` で戻り、呼び出し側でログに残す (応答は書かない)。
fn handle_connection(
    stream: &TcpStream,
    router: &Router,
    read_buffer_size: usize,
) -> Result<()> {
    let mut decoder = RequestDecoder::new();
    let mut buf = vec![0u8; read_buffer_size];
    let mut reader = stream;

    let request = loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            // EOF: 受信済みの範囲で確定する
            match decoder.finish()? {
                Some(request) => break request,
                None => return Ok(()),
            }
        }
        decoder.feed(&buf[..n])?;
        if let Some(request) = decoder.decode()? {
            break request;
        }
    };

    for warning in request.warnings() {
        eprintln!("Decode warning: {}", warning);
    }

    let mut sink = ResponseSink::new(stream);
    match router.resolve(request.method(), request.full_path()) {
        Some(handler) => {
            if let Err(e) = handler.handle(&request, &mut sink) {
                eprintln!(
                    "Handler error for {} {}: {}",
                    request.method(),
                    request.path(),
                    e
                );
            }
        }
        None => {
            sink.send(&not_found_response())?;
        }
    }

    Ok(())
}

/// 組み込みの 404 レスポンス
///
/// ボディはステータスフレーズそのもの。
fn not_found_response() -> Response {
    Response::new(404, "Not Found")
        .header("Content-Type", "text/plain")
        .body(b"Not Found".to_vec())
}
