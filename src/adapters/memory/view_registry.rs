use crate::ports::view_invalidator::{View, ViewInvalidator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// ビューごとの世代カウンター
///
/// 無効化されるたびにパスの世代が1つ進む。描画側は前回描画時の世代と
/// 比べて再計算の要否を判断する。一度も無効化されていないパスは0。
pub struct ViewRegistry {
    generations: Mutex<HashMap<String, u64>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn generation(&self, path: &str) -> u64 {
        let generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations.get(path).copied().unwrap_or(0)
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewInvalidator for ViewRegistry {
    async fn invalidate(&self, view: View) {
        let path = view.path();
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(path.clone()).or_insert(0);
        *generation += 1;

        tracing::debug!(path = %path, generation = *generation, "View invalidated");
    }
}
