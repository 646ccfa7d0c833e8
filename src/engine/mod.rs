// ==========================================
// 运单系统 - 引擎层
// ==========================================
// 职责: 配送公司解析 / 运单号生成 / 订单处理流水线
// 红线: Engine 不直接读写文件，持久化一律经 Repository
// ==========================================

pub mod carrier_directory;
pub mod order_pipeline;
pub mod tracking_issuer;

// 重导出核心引擎
pub use carrier_directory::{sort_markets_for_display, CarrierDirectory, DEFAULT_CARRIER};
pub use order_pipeline::{output_rows, OrderPipeline, PipelineError, PipelineResult, PipelineSummary};
pub use tracking_issuer::{
    Clock, FixedClock, IssueError, SystemClock, TrackingNumberIssuer, TrackingNumberSource,
};
