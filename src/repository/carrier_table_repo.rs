// ==========================================
// 运单系统 - 市场覆写表仓储
// ==========================================
// 红线: Repository 不含业务逻辑（默认配送公司策略在 CarrierDirectory）
// 持久化: <data_dir>/settings.json
// ==========================================

use crate::domain::carrier::CarrierOverrideTable;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::{read_json, write_json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ==========================================
// CarrierTableRepository Trait
// ==========================================
pub trait CarrierTableRepository: Send + Sync {
    /// 读取覆写表；缺失或损坏时返回空表
    fn load(&self) -> CarrierOverrideTable;

    /// 写回覆写表
    fn save(&self, table: &CarrierOverrideTable) -> RepositoryResult<()>;
}

impl<T: CarrierTableRepository + ?Sized> CarrierTableRepository for Arc<T> {
    fn load(&self) -> CarrierOverrideTable {
        (**self).load()
    }

    fn save(&self, table: &CarrierOverrideTable) -> RepositoryResult<()> {
        (**self).save(table)
    }
}

// ==========================================
// JsonCarrierTableRepository - JSON 文件实现
// ==========================================
pub struct JsonCarrierTableRepository {
    path: PathBuf,
}

impl JsonCarrierTableRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CarrierTableRepository for JsonCarrierTableRepository {
    fn load(&self) -> CarrierOverrideTable {
        read_json(&self.path).unwrap_or_default()
    }

    fn save(&self, table: &CarrierOverrideTable) -> RepositoryResult<()> {
        write_json(&self.path, table)
    }
}

// ==========================================
// InMemoryCarrierTableRepository - 内存实现（测试/无盘运行）
// ==========================================
#[derive(Default)]
pub struct InMemoryCarrierTableRepository {
    table: Mutex<CarrierOverrideTable>,
}

impl InMemoryCarrierTableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: CarrierOverrideTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }
}

impl CarrierTableRepository for InMemoryCarrierTableRepository {
    fn load(&self) -> CarrierOverrideTable {
        self.table
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn save(&self, table: &CarrierOverrideTable) -> RepositoryResult<()> {
        let mut guard = self
            .table
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        *guard = table.clone();
        Ok(())
    }
}
