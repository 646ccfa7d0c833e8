// ==========================================
// 运单系统 - 导出层
// ==========================================
// 职责: 输出行 → CSV（订单编码, 运单号, 配送公司）
// ==========================================

pub mod csv_writer;

pub use csv_writer::{
    default_output_file_name, write_output_file, write_output_rows, ExportError, ExportResult,
    OUTPUT_HEADER,
};
