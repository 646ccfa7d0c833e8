// ==========================================
// 运单系统 - 导入层
// ==========================================
// 职责: 外部表格 → 原始行 → 标准化订单
// 支持: Excel, CSV/TSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod file_validator;
pub mod row_normalizer;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{DelimitedTextParser, ExcelParser, FileParser, UniversalFileParser};
pub use file_validator::{validate_input_file, SourceFormat, DEFAULT_MAX_FILE_SIZE};
pub use row_normalizer::{ColumnShape, RawRow, RowNormalizer};
