use crate::ports::cover_storage::CoverStorage as CoverStorageTrait;
use crate::ports::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::poisoned;

/// CoverStorageのメモリ実装
///
/// 削除の失敗を再現できる（古い表紙の削除失敗が更新を止めないことの確認用）。
pub struct CoverStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
    fail_removals: AtomicBool,
}

impl CoverStorage {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            fail_removals: AtomicBool::new(false),
        }
    }

    /// 以降の`remove`をすべて失敗させる
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CoverStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoverStorageTrait for CoverStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let path = format!("/uploads/cover-{}{}", n, extension);

        let mut files = self.files.lock().map_err(poisoned)?;
        files.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(format!("cannot remove {}", path).into());
        }

        let mut files = self.files.lock().map_err(poisoned)?;
        files.remove(path);
        Ok(())
    }
}
