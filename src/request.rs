//! パース済み HTTP リクエストモデル
//!
//! ワイヤから読み取った素材 (メソッド、ターゲット、ヘッダー、ボディ) に
//! 派生データ (クエリパラメータ、POST パラメータ、フォームパート) を
//! 合成した不変ビュー。派生は構築時に一度だけ行われる。
//!
//! POST パラメータとフォームパートの派生は排他的で、Content-Type が
//! multipart のときは POST パラメータの解釈は行わない。

use crate::diagnostics::DecodeWarning;
use crate::multipart::{self, FormPart, FormParts, MultipartError};
use crate::urlencoded::{self, Params};

/// HTTP リクエスト
///
/// 接続ごとに作られ、ハンドラーの実行後に破棄される。
/// 接続間で共有されることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    /// クエリを含むフルパス
    target: String,
    /// クエリを除いたパス
    path: String,
    version: String,
    /// ワイヤ上の出現順のままのヘッダー
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    query_params: Params,
    post_params: Params,
    form_parts: FormParts,
    warnings: Vec<DecodeWarning>,
}

impl Request {
    /// ワイヤから読み取った素材からリクエストを構築
    ///
    /// クエリ/POST/multipart の派生をここで行う。multipart の失敗は
    /// 空のマッピングに退避し、警告として記録する。
    pub(crate) fn from_wire(
        method: String,
        target: String,
        version: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        mut warnings: Vec<DecodeWarning>,
    ) -> Self {
        let (path, query) = urlencoded::split_target(&target);
        let path = path.to_string();
        let query_params = query.map(urlencoded::parse).unwrap_or_default();

        let content_type = last_header(&headers, "Content-Type");
        let mut post_params = Params::new();
        let mut form_parts = FormParts::new();

        if let Some(content_type) = content_type {
            if content_type.contains("multipart/form-data") {
                match multipart::parse(&body, content_type) {
                    Ok(parts) => form_parts = parts,
                    Err(MultipartError::MissingBoundary) => {
                        warnings.push(DecodeWarning::MissingBoundary);
                    }
                }
            } else if content_type.contains("application/x-www-form-urlencoded") {
                post_params = urlencoded::parse(&String::from_utf8_lossy(&body));
            }
        }

        Request {
            method,
            target,
            path,
            version,
            headers,
            body,
            query_params,
            post_params,
            form_parts,
            warnings,
        }
    }

    /// HTTP メソッドを取得
    pub fn method(&self) -> &str {
        &self.method
    }

    /// クエリを含むフルパスを取得
    pub fn full_path(&self) -> &str {
        &self.target
    }

    /// クエリを除いたパスを取得
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP バージョントークンを取得 (検証はしない。省略時は空文字列)
    pub fn version(&self) -> &str {
        &self.version
    }

    /// ヘッダーを取得
    ///
    /// 名前は受信したままの表記で比較し、同名が複数あれば最後の値が勝つ。
    pub fn header(&self, name: &str) -> Option<&str> {
        last_header(&self.headers, name)
    }

    /// ヘッダー一覧をワイヤ上の出現順で取得
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Content-Type ヘッダーの値を取得
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Content-Length ヘッダーの値を取得
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    /// ボディのバイト列を取得
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// ボディを文字列として取得
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// クエリパラメータの最初の値を取得
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.first(name)
    }

    /// クエリパラメータの値をすべて出現順で取得
    pub fn query_params(&self, name: &str) -> Vec<&str> {
        self.query_params.all(name)
    }

    /// クエリパラメータ全体のスナップショットを取得
    pub fn all_query_params(&self) -> &Params {
        &self.query_params
    }

    /// POST パラメータの最初の値を取得
    ///
    /// Content-Type が `application/x-www-form-urlencoded` のときだけ
    /// 値を持つ。multipart リクエストでは常に空。
    pub fn post_param(&self, name: &str) -> Option<&str> {
        self.post_params.first(name)
    }

    /// POST パラメータの値をすべて出現順で取得
    pub fn post_params(&self, name: &str) -> Vec<&str> {
        self.post_params.all(name)
    }

    /// POST パラメータ全体のスナップショットを取得
    pub fn all_post_params(&self) -> &Params {
        &self.post_params
    }

    /// 指定した名前の最初のフォームパートを取得
    pub fn form_part(&self, name: &str) -> Option<&FormPart> {
        self.form_parts.first(name)
    }

    /// 指定した名前のフォームパートをすべて出現順で取得
    pub fn form_parts(&self, name: &str) -> Vec<&FormPart> {
        self.form_parts.all(name)
    }

    /// フォームパート全体のスナップショットを取得
    pub fn all_form_parts(&self) -> &FormParts {
        &self.form_parts
    }

    /// デコード中に観測された警告を取得
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }
}

/// 同名ヘッダーの最後の値を取得 (表記そのままの完全一致)
fn last_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        method: &str,
        target: &str,
        headers: Vec<(String, String)>,
        body: &[u8],
    ) -> Request {
        Request::from_wire(
            method.to_string(),
            target.to_string(),
            "HTTP/1.1".to_string(),
            headers,
            body.to_vec(),
            Vec::new(),
        )
    }

    fn header(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_query_derivation() {
        let request = request("GET", "/search?q=rust&tag=a&tag=b", Vec::new(), b"");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.full_path(), "/search?q=rust&tag=a&tag=b");
        assert_eq!(request.query_param("q"), Some("rust"));
        assert_eq!(request.query_params("tag"), vec!["a", "b"]);
        assert!(request.all_query_params().contains("q"));
    }

    #[test]
    fn test_no_query() {
        let request = request("GET", "/search", Vec::new(), b"");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.full_path(), "/search");
        assert!(request.all_query_params().is_empty());
    }

    #[test]
    fn test_leading_question_mark_is_not_a_query() {
        let request = request("GET", "?q=1", Vec::new(), b"");
        assert_eq!(request.path(), "?q=1");
        assert!(request.all_query_params().is_empty());
    }

    #[test]
    fn test_post_params_require_urlencoded_content_type() {
        let with_type = request(
            "POST",
            "/api/register",
            vec![header("Content-Type", "application/x-www-form-urlencoded")],
            b"name=John&role=a&role=b",
        );
        assert_eq!(with_type.post_param("name"), Some("John"));
        assert_eq!(with_type.post_params("role"), vec!["a", "b"]);

        let without_type = request("POST", "/api/register", Vec::new(), b"name=John");
        assert!(without_type.all_post_params().is_empty());
    }

    #[test]
    fn test_multipart_bypasses_post_params() {
        let body = b"--b\r\n\
            Content-Disposition: form-data; name=\"description\"\r\n\r\n\
            hello\r\n\
            --b--\r\n";
        let request = request(
            "POST",
            "/api/upload",
            vec![header("Content-Type", "multipart/form-data; boundary=b")],
            body,
        );

        assert!(request.all_post_params().is_empty());
        assert_eq!(
            request.form_part("description").unwrap().content_str(),
            Some("hello")
        );
    }

    #[test]
    fn test_multipart_missing_boundary_yields_empty_mapping() {
        let request = request(
            "POST",
            "/api/upload",
            vec![header("Content-Type", "multipart/form-data")],
            b"anything",
        );

        assert!(request.all_form_parts().is_empty());
        assert!(request.all_post_params().is_empty());
        assert!(request
            .warnings()
            .contains(&DecodeWarning::MissingBoundary));
    }

    #[test]
    fn test_header_exact_case_last_wins() {
        let request = request(
            "GET",
            "/",
            vec![
                header("X-Token", "first"),
                header("x-token", "lowercase"),
                header("X-Token", "second"),
            ],
            b"",
        );

        assert_eq!(request.header("X-Token"), Some("second"));
        assert_eq!(request.header("x-token"), Some("lowercase"));
        assert_eq!(request.header("X-TOKEN"), None);
    }

    #[test]
    fn test_content_length_accessor() {
        let request = request("POST", "/", vec![header("Content-Length", "5")], b"hello");
        assert_eq!(request.content_length(), Some(5));

        let bad = request_with_bad_length();
        assert_eq!(bad.content_length(), None);
    }

    fn request_with_bad_length() -> Request {
        request(
            "POST",
            "/",
            vec![header("Content-Length", "many")],
            b"",
        )
    }
}
