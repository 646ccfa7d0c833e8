// ==========================================
// 运单系统 - 配置层
// ==========================================
// 职责: 应用配置（默认值 + 环境变量覆写）
// 存储: 无（覆写表与发号历史由仓储层管理）
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{config_keys, default_data_dir, AppConfig, CollisionPolicy};
