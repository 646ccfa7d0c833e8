// ==========================================
// 运单系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 持久化错误 =====
    #[error("持久化失败 ({path}): {message}")]
    Persistence { path: String, message: String },

    #[error("序列化失败: {0}")]
    Serialization(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
