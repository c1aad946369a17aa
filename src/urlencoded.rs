//! URL エンコード文字列のパース (クエリ文字列 / `application/x-www-form-urlencoded`)
//!
//! ## 概要
//!
//! `key=value&key=value` 形式の文字列を、キーごとに値を出現順で蓄積する
//! 多値マッピング [`Params`] に変換します。`+` は空白、`%XX` はパーセント
//! エンコーディングとしてデコードします。壊れたエスケープはエラーに
//! せず、文字をそのまま残します。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_tinyhttpd::urlencoded;
//!
//! let params = urlencoded::parse("tag=a&tag=b&q=hello+world");
//! assert_eq!(params.first("q"), Some("hello world"));
//! assert_eq!(params.all("tag"), vec!["a", "b"]);
//! ```

/// キーごとに値を出現順で保持する多値マッピング
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// 空のマッピングを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// キーと値を末尾に追加
    pub fn push(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// 最初の値を取得
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// 指定したキーの値をすべて出現順で取得
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// キーが存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// キーの一覧を取得 (重複を除き、初出順)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (n, _) in &self.entries {
            if !names.contains(&n.as_str()) {
                names.push(n);
            }
        }
        names
    }

    /// (キー, 値) の組を出現順で走査
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// 組の数を取得
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// リクエストターゲットをパスとクエリ文字列に分割
///
/// `?` が先頭 (位置 0) にある場合はクエリなしとして扱う。
/// 分割規約は `indexOf('?') > 0` 相当。
///
/// # 例
///
/// ```rust
/// use shiguredo_tinyhttpd::urlencoded::split_target;
///
/// assert_eq!(split_target("/a?b=1"), ("/a", Some("b=1")));
/// assert_eq!(split_target("/a"), ("/a", None));
/// assert_eq!(split_target("?b=1"), ("?b=1", None));
/// ```
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.find('?') {
        Some(pos) if pos > 0 => (&target[..pos], Some(&target[pos + 1..])),
        _ => (target, None),
    }
}

/// URL エンコードされた文字列をパース
///
/// 空の入力は空のマッピングになる。`=` を含まない組は値を空文字列とする。
/// キーが空になる組は捨てる。
pub fn parse(input: &str) -> Params {
    let mut params = Params::new();
    if input.is_empty() {
        return params;
    }

    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name, value),
            None => (pair, ""),
        };
        let name = decode_component(name);
        if name.is_empty() {
            continue;
        }
        params.push(&name, &decode_component(value));
    }

    params
}

/// [`Params`] を URL エンコード文字列に戻す
///
/// `parse(&encode(&params)) == params` が成り立つ。
pub fn encode(params: &Params) -> String {
    let mut result = String::new();
    for (name, value) in params.iter() {
        if !result.is_empty() {
            result.push('&');
        }
        result.push_str(&encode_component(name));
        result.push('=');
        result.push_str(&encode_component(value));
    }
    result
}

/// 単一の構成要素をデコード
///
/// `+` は空白に、`%XX` は対応するバイトにデコードする。
/// 不正なエスケープ (`%` の後に 16 進数 2 桁が続かない) は
/// リテラル文字として残す。
pub fn decode_component(input: &str) -> String {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                result.push(b' ');
                i += 1;
            }
            b'%' => {
                match (
                    bytes.get(i + 1).copied().and_then(from_hex_char),
                    bytes.get(i + 2).copied().and_then(from_hex_char),
                ) {
                    (Some(high), Some(low)) => {
                        result.push((high << 4) | low);
                        i += 3;
                    }
                    _ => {
                        result.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// 単一の構成要素をエンコード
///
/// unreserved 文字 (RFC 3986 Section 2.3) はそのまま、空白は `+`、
/// それ以外はパーセントエンコードする。
pub fn encode_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        if is_unreserved(byte) {
            result.push(byte as char);
        } else if byte == b' ' {
            result.push('+');
        } else {
            result.push('%');
            result.push(to_hex_char(byte >> 4));
            result.push(to_hex_char(byte & 0x0F));
        }
    }
    result
}

/// パーセントエンコーディング対象外の文字 (unreserved characters)
/// RFC 3986 Section 2.3
fn is_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b'_' || c == b'~'
}

fn to_hex_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'A' + nibble - 10) as char,
        _ => unreachable!(),
    }
}

fn from_hex_char(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
