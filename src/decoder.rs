//! HTTP リクエストデコーダー (Sans I/O)
//!
//! バイトストリームを [`Request`] に変換する状態機械。場当たり的な
//! 文字列分割ではなく、スタートライン → ヘッダー → ボディの明示的な
//! フェーズ遷移で進む。
//!
//! ボディのフレーミングは Content-Length のみ。ヘッダーが宣言されて
//! いない、または数値として解釈できない場合、ボディは空として扱う。
//! ストリームが宣言より早く終端した場合は [`finish`](RequestDecoder::finish)
//! が短いボディのまま確定させる (エラーにはしない)。
//!
//! 寛容なパースの範囲:
//!
//! - コロンを含まないヘッダー行は読み飛ばす (警告として記録)
//! - バージョントークンは読み取るだけで検証しない
//!
//! 唯一の致命的エラーはスタートラインの不成立
//! ([`Error::InvalidStartLine`]) で、この場合は接続ごと破棄される。

use crate::diagnostics::DecodeWarning;
use crate::error::Error;
use crate::limits::DecoderLimits;
use crate::request::Request;

/// デコード状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodePhase {
    /// スタートライン待ち
    StartLine,
    /// ヘッダー待ち
    Headers,
    /// ボディ読み取り中 (Content-Length)
    Body { remaining: usize },
}

/// スタートラインの分解結果
#[derive(Debug, Clone, PartialEq, Eq)]
struct StartLine {
    method: String,
    target: String,
    version: String,
}

/// HTTP リクエストデコーダー (Sans I/O)
///
/// サーバー側でクライアントからのリクエストをパースする際に使用。
/// 受信データを [`feed`](Self::feed) で投入し、[`decode`](Self::decode)
/// でリクエストの完成を試みる。ストリームが終端 (EOF) したら
/// [`finish`](Self::finish) を呼び、受信済みの範囲で確定させる。
#[derive(Debug)]
pub struct RequestDecoder {
    buf: Vec<u8>,
    phase: DecodePhase,
    start_line: Option<StartLine>,
    headers: Vec<(String, String)>,
    body_buf: Vec<u8>,
    warnings: Vec<DecodeWarning>,
    limits: DecoderLimits,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    /// 新しいデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            buf: Vec::new(),
            phase: DecodePhase::StartLine,
            start_line: None,
            headers: Vec::new(),
            body_buf: Vec::new(),
            warnings: Vec::new(),
            limits,
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// バッファにデータを追加
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        let new_size = self.buf.len() + data.len();
        if new_size > self.limits.max_buffer_size {
            return Err(Error::BufferOverflow {
                size: new_size,
                limit: self.limits.max_buffer_size,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// バッファの残りデータを取得
    pub fn remaining(&self) -> &[u8] {
        &self.buf
    }

    /// デコーダーをリセット
    pub fn reset(&mut self) {
        self.buf.clear();
        self.phase = DecodePhase::StartLine;
        self.start_line = None;
        self.headers.clear();
        self.body_buf.clear();
        self.warnings.clear();
    }

    /// CRLF で終わる行を探す
    fn find_line(&self) -> Option<usize> {
        self.buf.windows(2).position(|w| w == b"\r\n")
    }

    /// リクエストをデコード
    ///
    /// データ不足の場合は `Ok(None)` を返す。追加データを `feed` して
    /// から再度呼び出す。
    pub fn decode(&mut self) -> Result<Option<Request>, Error> {
        loop {
            match self.phase {
                DecodePhase::StartLine => {
                    let Some(pos) = self.find_line() else {
                        return Ok(None);
                    };
                    let line = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
                    self.buf.drain(..pos + 2);
                    self.start_line = Some(parse_start_line(&line)?);
                    self.phase = DecodePhase::Headers;
                }
                DecodePhase::Headers => {
                    let Some(pos) = self.find_line() else {
                        return Ok(None);
                    };
                    if pos == 0 {
                        // 空行 - ヘッダー終了
                        self.buf.drain(..2);
                        match self.declared_content_length() {
                            Some(len) if len > 0 => {
                                if len > self.limits.max_body_size {
                                    return Err(Error::BodyTooLarge {
                                        size: len,
                                        limit: self.limits.max_body_size,
                                    });
                                }
                                self.phase = DecodePhase::Body { remaining: len };
                            }
                            _ => return self.finish_request().map(Some),
                        }
                    } else {
                        if pos > self.limits.max_header_line_size {
                            return Err(Error::HeaderLineTooLong {
                                size: pos,
                                limit: self.limits.max_header_line_size,
                            });
                        }
                        if self.headers.len() >= self.limits.max_headers_count {
                            return Err(Error::TooManyHeaders {
                                count: self.headers.len() + 1,
                                limit: self.limits.max_headers_count,
                            });
                        }

                        let line = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
                        self.buf.drain(..pos + 2);
                        self.push_header_line(line);
                    }
                }
                DecodePhase::Body { remaining } => {
                    if self.buf.len() < remaining {
                        return Ok(None);
                    }
                    self.body_buf = self.buf.drain(..remaining).collect();
                    return self.finish_request().map(Some);
                }
            }
        }
    }

    /// ストリーム終端 (EOF) でのデコード確定
    ///
    /// 完全なリクエストがバッファに残っていればそれを返す。そうでなければ
    /// 行指向リーダーの終端と同じ扱いをする: CRLF で終わらない最終行も
    /// 1 行と数え、宣言より短いボディは切り詰めたまま確定する
    /// ([`DecodeWarning::TruncatedBody`] を記録)。
    ///
    /// 何も受信しないまま終端した場合は `Ok(None)`。
    pub fn finish(&mut self) -> Result<Option<Request>, Error> {
        if let Some(request) = self.decode()? {
            return Ok(Some(request));
        }

        match self.phase {
            DecodePhase::StartLine => {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let line = self.take_final_line();
                self.start_line = Some(parse_start_line(&line)?);
                self.phase = DecodePhase::Headers;
                self.finish_without_body()
            }
            DecodePhase::Headers => {
                if !self.buf.is_empty() {
                    let line = self.take_final_line();
                    self.push_header_line(line);
                }
                self.finish_without_body()
            }
            DecodePhase::Body { remaining } => {
                let received = self.buf.len().min(remaining);
                self.warnings.push(DecodeWarning::TruncatedBody {
                    expected: remaining,
                    received,
                });
                self.body_buf = self.buf.drain(..received).collect();
                self.finish_request().map(Some)
            }
        }
    }

    /// EOF によりヘッダーまでで打ち切られたリクエストを確定
    fn finish_without_body(&mut self) -> Result<Option<Request>, Error> {
        if let Some(expected) = self.declared_content_length() {
            if expected > 0 {
                self.warnings.push(DecodeWarning::TruncatedBody {
                    expected,
                    received: 0,
                });
            }
        }
        self.finish_request().map(Some)
    }

    /// CRLF で終わらない残りデータを最終行として取り出す
    fn take_final_line(&mut self) -> String {
        let mut line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        if line.ends_with('\r') {
            line.pop();
        }
        line
    }

    /// ヘッダー行を 1 行取り込む
    ///
    /// コロンを含まない行は読み飛ばして警告を記録する。
    fn push_header_line(&mut self, line: String) {
        match line.split_once(':') {
            Some((name, value)) => {
                self.headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
            None => {
                self.warnings
                    .push(DecodeWarning::HeaderLineWithoutColon { line });
            }
        }
    }

    /// 宣言された Content-Length を取得
    ///
    /// ヘッダー名は受信したままの表記で比較し、同名が複数あれば最後が
    /// 勝つ。数値として解釈できない値は警告を記録し、ボディなしとして
    /// 扱う。
    fn declared_content_length(&mut self) -> Option<usize> {
        let value = self
            .headers
            .iter()
            .rev()
            .find(|(name, _)| name == "Content-Length")
            .map(|(_, value)| value.clone())?;
        match value.parse::<usize>() {
            Ok(len) => Some(len),
            Err(_) => {
                self.warnings.push(DecodeWarning::BadContentLength { value });
                None
            }
        }
    }

    /// 蓄積した素材から [`Request`] を組み立て、状態をリセットする
    fn finish_request(&mut self) -> Result<Request, Error> {
        let start_line = self
            .start_line
            .take()
            .ok_or_else(|| Error::InvalidData("missing request line".to_string()))?;

        let request = Request::from_wire(
            start_line.method,
            start_line.target,
            start_line.version,
            std::mem::take(&mut self.headers),
            std::mem::take(&mut self.body_buf),
            std::mem::take(&mut self.warnings),
        );

        self.phase = DecodePhase::StartLine;
        Ok(request)
    }
}

/// スタートラインをパース
///
/// 空白区切りで最低 2 トークン (メソッド、パス) を要求する。
/// 3 番目のトークン (バージョン) は読み取るだけで検証しない。
fn parse_start_line(line: &str) -> Result<StartLine, Error> {
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::InvalidStartLine(line.to_string()));
    }

    Ok(StartLine {
        method: parts[0].to_string(),
        target: parts[1].to_string(),
        version: parts.get(2).copied().unwrap_or("").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_get() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.full_path(), "/index.html");
        assert_eq!(request.version(), "HTTP/1.1");
        assert_eq!(request.header("Host"), Some("example.com"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_decode_incomplete_returns_none() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
        assert!(decoder.decode().unwrap().is_none());

        decoder.feed(b"mple.com\r\n\r\n").unwrap();
        assert!(decoder.decode().unwrap().is_some());
    }

    #[test]
    fn test_decode_body_with_content_length() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.body(), b"hello");
    }

    #[test]
    fn test_decode_body_arrives_in_chunks() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel")
            .unwrap();
        assert!(decoder.decode().unwrap().is_none());

        decoder.feed(b"lo wo").unwrap();
        assert!(decoder.decode().unwrap().is_none());

        decoder.feed(b"rld").unwrap();
        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.body(), b"hello world");
    }

    #[test]
    fn test_decode_zero_content_length() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_decode_missing_content_length_means_empty_body() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nHost: x\r\n\r\nignored")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_decode_bad_content_length_means_empty_body() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nContent-Length: many\r\n\r\n")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert!(request.body().is_empty());
        assert!(request.warnings().iter().any(|w| matches!(
            w,
            DecodeWarning::BadContentLength { value } if value == "many"
        )));
    }

    #[test]
    fn test_decode_header_line_without_colon_skipped() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"GET / HTTP/1.1\r\nHost: x\r\nthis line has no colon\r\nX-Ok: 1\r\n\r\n")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.header("Host"), Some("x"));
        assert_eq!(request.header("X-Ok"), Some("1"));
        assert!(request.warnings().iter().any(|w| matches!(
            w,
            DecodeWarning::HeaderLineWithoutColon { line } if line == "this line has no colon"
        )));
    }

    #[test]
    fn test_decode_duplicate_header_last_wins() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 99\r\nContent-Length: 2\r\n\r\nok")
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.body(), b"ok");
    }

    #[test]
    fn test_invalid_start_line_is_fatal() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"GARBAGE\r\n\r\n").unwrap();
        assert!(matches!(
            decoder.decode(),
            Err(Error::InvalidStartLine(line)) if line == "GARBAGE"
        ));
    }

    #[test]
    fn test_start_line_without_version_is_accepted() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"GET /\r\n\r\n").unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.full_path(), "/");
        assert_eq!(request.version(), "");
    }

    #[test]
    fn test_finish_truncated_body() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"POST /api HTTP/1.1\r\nContent-Length: 100\r\n\r\nshort")
            .unwrap();
        assert!(decoder.decode().unwrap().is_none());

        let request = decoder.finish().unwrap().unwrap();
        assert_eq!(request.body(), b"short");
        assert!(request.warnings().contains(&DecodeWarning::TruncatedBody {
            expected: 100,
            received: 5,
        }));
    }

    #[test]
    fn test_finish_empty_stream() {
        let mut decoder = RequestDecoder::new();
        assert!(decoder.finish().unwrap().is_none());
    }

    #[test]
    fn test_finish_unterminated_start_line() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"GET /ping HTTP/1.1").unwrap();

        let request = decoder.finish().unwrap().unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.full_path(), "/ping");
    }

    #[test]
    fn test_finish_mid_headers() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(b"GET / HTTP/1.1\r\nHost: example.com\r\nX-Partial: y")
            .unwrap();

        let request = decoder.finish().unwrap().unwrap();
        assert_eq!(request.header("Host"), Some("example.com"));
        assert_eq!(request.header("X-Partial"), Some("y"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_feed_respects_buffer_limit() {
        let mut decoder = RequestDecoder::with_limits(DecoderLimits {
            max_buffer_size: 8,
            ..DecoderLimits::unlimited()
        });
        assert!(decoder.feed(b"12345678").is_ok());
        assert!(matches!(
            decoder.feed(b"9"),
            Err(Error::BufferOverflow { size: 9, limit: 8 })
        ));
    }

    #[test]
    fn test_query_and_post_derivation_through_decoder() {
        let mut decoder = RequestDecoder::new();
        decoder
            .feed(
                b"POST /api/register?src=form HTTP/1.1\r\n\
                  Content-Type: application/x-www-form-urlencoded\r\n\
                  Content-Length: 20\r\n\r\n\
                  name=John&role=admin",
            )
            .unwrap();

        let request = decoder.decode().unwrap().unwrap();
        assert_eq!(request.path(), "/api/register");
        assert_eq!(request.query_param("src"), Some("form"));
        assert_eq!(request.post_param("name"), Some("John"));
        assert_eq!(request.post_param("role"), Some("admin"));
    }
}
