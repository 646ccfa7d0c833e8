// ==========================================
// 运单系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod carrier;
pub mod cell;
pub mod order;
pub mod tracking;

// 重导出核心类型
pub use carrier::{Carrier, CarrierOverrideTable};
pub use cell::{CellError, CellValue};
pub use order::{Order, OutputRow};
pub use tracking::{
    compose_tracking_number, is_well_formed, IssuedNumberHistory, SUFFIX_SPACE,
    TRACKING_NUMBER_LENGTH,
};
