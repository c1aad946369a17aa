//! ルーティングテーブル
//!
//! (メソッド, クエリを除いたパス) の完全一致でハンドラーを引く。
//! 末尾スラッシュや大文字小文字の正規化、パターンマッチは行わない。
//!
//! テーブルはサーブ開始前に登録し終え、サーブ中は読み取り専用として
//! 扱う。そのため探索にロックは不要。

use std::collections::HashMap;
use std::sync::Arc;

use shiguredo_tinyhttpd::urlencoded;

use crate::server::Handler;

/// ルーティングテーブル
///
/// メソッド → パス → ハンドラーの 2 段のマップ。同じ
/// (メソッド, パス) への再登録は前のハンドラーを上書きする。
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
}

impl Router {
    /// 空のテーブルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ハンドラーを登録
    ///
    /// サーブ開始前にのみ呼ぶこと。既存の (メソッド, パス) は上書き。
    pub fn register<H: Handler>(&mut self, method: &str, path: &str, handler: H) {
        self.routes
            .entry(method.to_string())
            .or_default()
            .insert(path.to_string(), Arc::new(handler));
    }

    /// ハンドラーを解決
    ///
    /// `path` にクエリサフィックスが付いていても、探索前に取り除く。
    pub fn resolve(&self, method: &str, path: &str) -> Option<Arc<dyn Handler>> {
        let (path, _query) = urlencoded::split_target(path);
        self.routes.get(method)?.get(path).cloned()
    }

    /// 登録済みルート数を取得
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
