//! multipart/form-data パース (RFC 7578 のサブセット)
//!
//! ## 概要
//!
//! フォーム送信された multipart ボディを、フィールド名ごとに
//! [`FormPart`] を出現順で蓄積する [`FormParts`] に変換します。
//!
//! パースは寛容に振る舞います:
//!
//! - boundary が抽出できない場合は [`MultipartError::MissingBoundary`]
//! - ヘッダーブロックと内容の区切り (CRLF CRLF) を持たないセグメントは捨てる
//! - `name` が取れないパートは捨てる
//! - 終端マーカー `--` を含むセグメント以降は処理しない
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_tinyhttpd::multipart;
//!
//! let content_type = "multipart/form-data; boundary=abc123";
//! let body = b"--abc123\r\n\
//!     Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
//!     value1\r\n\
//!     --abc123--\r\n";
//!
//! let parts = multipart::parse(body, content_type).unwrap();
//! let part = parts.first("field1").unwrap();
//! assert_eq!(part.content_str(), Some("value1"));
//! assert!(!part.is_file());
//! ```

use core::fmt;

/// multipart パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    /// Content-Type から boundary を抽出できなかった
    MissingBoundary,
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartError::MissingBoundary => write!(f, "missing multipart boundary"),
        }
    }
}

impl std::error::Error for MultipartError {}

/// multipart ボディから抽出した 1 パート
///
/// `filename` を持つパートはファイル、持たないパートはスカラー
/// フィールドとして扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    name: String,
    filename: Option<String>,
    content_type: String,
    content: Vec<u8>,
}

impl FormPart {
    /// パートを作成 (内容は UTF-8 バイト列)
    pub fn new(name: &str, filename: Option<&str>, content_type: &str, content: Vec<u8>) -> Self {
        FormPart {
            name: name.to_string(),
            filename: filename.map(str::to_string),
            content_type: content_type.to_string(),
            content,
        }
    }

    /// フィールド名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// ファイルパートかどうか (空でないファイル名を持つ)
    pub fn is_file(&self) -> bool {
        self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// 宣言された Content-Type を取得 (デフォルト: `text/plain`)
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// 内容のバイト列を取得
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 内容を文字列として取得
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// 内容のバイト数を取得
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// フィールド名ごとにパートを出現順で保持する多値マッピング
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormParts {
    parts: Vec<FormPart>,
}

impl FormParts {
    /// 空のマッピングを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// パートを末尾に追加
    pub fn push(&mut self, part: FormPart) {
        self.parts.push(part);
    }

    /// 指定した名前の最初のパートを取得
    pub fn first(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name() == name)
    }

    /// 指定した名前のパートをすべて出現順で取得
    pub fn all(&self, name: &str) -> Vec<&FormPart> {
        self.parts.iter().filter(|p| p.name() == name).collect()
    }

    /// 名前が存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name() == name)
    }

    /// パートを出現順で走査
    pub fn iter(&self) -> impl Iterator<Item = &FormPart> {
        self.parts.iter()
    }

    /// パートの数を取得
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Content-Type ヘッダー値から boundary を抽出
///
/// `boundary=` の直後から、次の `;` または値の終端までをトークンとし、
/// 前後の空白を取り除いて返す。
///
/// # 例
///
/// ```rust
/// use shiguredo_tinyhttpd::multipart::extract_boundary;
///
/// let ct = "multipart/form-data; boundary=----WebKitFormBoundary; charset=utf-8";
/// assert_eq!(extract_boundary(ct), Some("----WebKitFormBoundary".to_string()));
/// assert_eq!(extract_boundary("text/plain"), None);
/// ```
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let pos = content_type.find("boundary=")?;
    let rest = &content_type[pos + "boundary=".len()..];
    let token = match rest.find(';') {
        Some(end) if end > 0 => &rest[..end],
        _ => rest,
    };
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// multipart ボディをパース
///
/// ボディは UTF-8 テキストとして解釈する (不正なシーケンスは置換文字に
/// 落ちる)。`--<boundary>` でセグメントに分割し、最初のセグメント
/// (プリアンブル) は捨てる。`--` を含むセグメントは終端マーカーと
/// みなし、以降のセグメントは一切調べない。
pub fn parse(body: &[u8], content_type: &str) -> Result<FormParts, MultipartError> {
    let boundary = extract_boundary(content_type).ok_or(MultipartError::MissingBoundary)?;

    let mut parts = FormParts::new();
    if body.is_empty() {
        return Ok(parts);
    }

    let text = String::from_utf8_lossy(body);
    let delimiter = format!("--{}", boundary);

    let mut sections = text.split(delimiter.as_str());
    // 最初の境界より前はプリアンブル
    sections.next();

    for section in sections {
        if section.contains("--") {
            break;
        }
        if let Some(part) = parse_part(section) {
            parts.push(part);
        }
    }

    Ok(parts)
}

/// 1 セグメントをパートとして解釈
///
/// 最初の CRLF CRLF でヘッダーブロックと内容に分割する。区切りを
/// 持たないセグメント、`name` の取れないセグメントは `None`。
fn parse_part(section: &str) -> Option<FormPart> {
    let (header_block, content) = section.split_once("\r\n\r\n")?;

    // 次の境界の直前の CRLF は内容に含めない
    let content = content.strip_suffix("\r\n").unwrap_or(content);

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in header_block.split("\r\n") {
        let lower = line.to_ascii_lowercase();
        if lower.starts_with("content-disposition") {
            name = quoted_parameter(line, "name");
            filename = quoted_parameter(line, "filename");
        } else if lower.starts_with("content-type") {
            if let Some(pos) = line.find(':') {
                content_type = Some(line[pos + 1..].trim().to_string());
            }
        }
    }

    let name = name?;
    Some(FormPart {
        name,
        filename,
        content_type: content_type.unwrap_or_else(|| "text/plain".to_string()),
        content: content.as_bytes().to_vec(),
    })
}

/// `param="value"` 形式の引用パラメータを抽出
fn quoted_parameter(line: &str, param: &str) -> Option<String> {
    let pattern = format!("{}=\"", param);
    let start = line.find(&pattern)? + pattern.len();
    let end = line[start..].find('"')? + start;
    if end > start {
        Some(line[start..end].to_string())
    } else {
        None
    }
}

/// multipart ボディビルダー
///
/// テストやクライアント側でのフォーム送信に使用する。
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    parts: Vec<FormPart>,
}

impl MultipartBuilder {
    /// 境界を指定して作成
    pub fn with_boundary(boundary: &str) -> Self {
        MultipartBuilder {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    /// 境界文字列を取得
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type ヘッダー値を取得
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// テキストフィールドを追加
    pub fn text_field(mut self, name: &str, value: &str) -> Self {
        self.parts.push(FormPart::new(
            name,
            None,
            "text/plain",
            value.as_bytes().to_vec(),
        ));
        self
    }

    /// ファイルフィールドを追加
    pub fn file_field(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.parts.push(FormPart::new(
            name,
            Some(filename),
            content_type,
            data.to_vec(),
        ));
        self
    }

    /// ボディをビルド
    pub fn build(&self) -> Vec<u8> {
        let mut result = Vec::new();

        for part in &self.parts {
            result.extend_from_slice(b"--");
            result.extend_from_slice(self.boundary.as_bytes());
            result.extend_from_slice(b"\r\n");

            result.extend_from_slice(b"Content-Disposition: form-data; name=\"");
            result.extend_from_slice(part.name().as_bytes());
            result.extend_from_slice(b"\"");
            if let Some(filename) = part.filename() {
                result.extend_from_slice(b"; filename=\"");
                result.extend_from_slice(filename.as_bytes());
                result.extend_from_slice(b"\"");
            }
            result.extend_from_slice(b"\r\n");

            result.extend_from_slice(b"Content-Type: ");
            result.extend_from_slice(part.content_type().as_bytes());
            result.extend_from_slice(b"\r\n");

            result.extend_from_slice(b"\r\n");
            result.extend_from_slice(part.content());
            result.extend_from_slice(b"\r\n");
        }

        // 終端境界
        result.extend_from_slice(b"--");
        result.extend_from_slice(self.boundary.as_bytes());
        result.extend_from_slice(b"--\r\n");

        result
    }
}
