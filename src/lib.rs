// ==========================================
// 运单系统 - 核心库
// ==========================================
// 职责: 订单导出文件 → 标准化订单 → 配送公司 → 运单号
// 持久化: 市场覆写表 + 发号历史（JSON 文件）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 导出层 - 输出文件
pub mod export;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Carrier, CarrierOverrideTable, CellValue, IssuedNumberHistory, Order, OutputRow};

// 引擎
pub use engine::{
    CarrierDirectory, OrderPipeline, PipelineError, PipelineResult, PipelineSummary,
    TrackingNumberIssuer, TrackingNumberSource,
};

// 导入
pub use importer::{ImportError, RawRow, RowNormalizer};

// 配置
pub use config::{AppConfig, CollisionPolicy};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "运单系统";
