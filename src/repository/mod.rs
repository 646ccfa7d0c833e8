// ==========================================
// 运单系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 市场覆写表 / 发号历史的读写，屏蔽存储细节
// 实现: JSON 文件（生产） + 内存（测试）
// ==========================================

pub mod carrier_table_repo;
pub mod error;
pub mod issued_history_repo;
mod json_file;

// 重导出核心仓储
pub use carrier_table_repo::{
    CarrierTableRepository, InMemoryCarrierTableRepository, JsonCarrierTableRepository,
};
pub use error::{RepositoryError, RepositoryResult};
pub use issued_history_repo::{
    InMemoryIssuedHistoryRepository, IssuedHistoryRepository, JsonIssuedHistoryRepository,
};
