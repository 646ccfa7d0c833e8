// ==========================================
// 运单系统 - 发号历史仓储
// ==========================================
// 持久化: <data_dir>/tracking_history.json（JSON 字符串数组）
// 红线: 只增不减，Repository 不负责去重策略
// ==========================================

use crate::domain::tracking::IssuedNumberHistory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::{read_json, write_json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ==========================================
// IssuedHistoryRepository Trait
// ==========================================
pub trait IssuedHistoryRepository: Send + Sync {
    /// 读取历史；缺失或损坏时返回空历史
    fn load(&self) -> IssuedNumberHistory;

    /// 写回完整历史
    fn save(&self, history: &IssuedNumberHistory) -> RepositoryResult<()>;
}

impl<T: IssuedHistoryRepository + ?Sized> IssuedHistoryRepository for Arc<T> {
    fn load(&self) -> IssuedNumberHistory {
        (**self).load()
    }

    fn save(&self, history: &IssuedNumberHistory) -> RepositoryResult<()> {
        (**self).save(history)
    }
}

// ==========================================
// JsonIssuedHistoryRepository - JSON 文件实现
// ==========================================
pub struct JsonIssuedHistoryRepository {
    path: PathBuf,
}

impl JsonIssuedHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IssuedHistoryRepository for JsonIssuedHistoryRepository {
    fn load(&self) -> IssuedNumberHistory {
        read_json(&self.path).unwrap_or_default()
    }

    fn save(&self, history: &IssuedNumberHistory) -> RepositoryResult<()> {
        write_json(&self.path, history)
    }
}

// ==========================================
// InMemoryIssuedHistoryRepository - 内存实现
// ==========================================
#[derive(Default)]
pub struct InMemoryIssuedHistoryRepository {
    history: Mutex<IssuedNumberHistory>,
}

impl InMemoryIssuedHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: IssuedNumberHistory) -> Self {
        Self {
            history: Mutex::new(history),
        }
    }
}

impl IssuedHistoryRepository for InMemoryIssuedHistoryRepository {
    fn load(&self) -> IssuedNumberHistory {
        self.history
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn save(&self, history: &IssuedNumberHistory) -> RepositoryResult<()> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        *guard = history.clone();
        Ok(())
    }
}
