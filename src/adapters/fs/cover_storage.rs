use crate::ports::cover_storage::CoverStorage as CoverStorageTrait;
use crate::ports::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::{Alphanumeric, DistString};
use std::io;
use std::path::{Path, PathBuf};

/// 公開パスの接頭辞
const PUBLIC_PREFIX: &str = "/uploads/";

/// CoverStorageのファイルシステム実装
///
/// `<dir>/<unix_millis>-<random><ext>`に書き込み、`/uploads/<file>`を返す。
/// ディレクトリは必要になった時点で作成する。
pub struct CoverStorage {
    dir: PathBuf,
}

impl CoverStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name_for(original_name: &str) -> String {
        let suffix = Alphanumeric
            .sample_string(&mut rand::thread_rng(), 10)
            .to_lowercase();
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, extension)
    }

    /// 公開パスから保存先を求める
    ///
    /// ディレクトリ成分は無視する（アップロードディレクトリの外は指さない）。
    fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = Path::new(public_path.trim_start_matches(PUBLIC_PREFIX)).file_name()?;
        Some(self.dir.join(name))
    }
}

#[async_trait]
impl CoverStorageTrait for CoverStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = Self::file_name_for(original_name);
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Cover image stored");

        Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let local = self.local_path(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid cover path: {}", path))
        })?;

        match tokio::fs::remove_file(&local).await {
            Ok(()) => Ok(()),
            // 既に存在しないなら削除済みとみなす
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
