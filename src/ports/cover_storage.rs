use async_trait::async_trait;

use super::Result;

/// 表紙画像ストレージポート
///
/// ファイルは生成した名前で保存され、呼び出し側には公開パス
/// （例: `/uploads/1700000000000-k3j2h1a9zq.png`）だけが返る。
#[async_trait]
pub trait CoverStorage: Send + Sync {
    /// アップロードされた画像を保存し、公開パスを返す
    ///
    /// `original_name`は拡張子の取得にのみ使う。
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String>;

    /// 保存済みの画像を公開パスで削除する
    async fn remove(&self, path: &str) -> Result<()>;
}
