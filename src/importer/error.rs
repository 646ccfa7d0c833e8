// ==========================================
// 运单系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级错误（缺列/单元格转换失败/必填为空）不在此列，
//       由标准化器直接丢弃该行
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsm/.ods/.csv/.tsv/.txt）")]
    UnsupportedFormat(String),

    #[error("文件为空: {0}")]
    FileEmpty(String),

    #[error("文件过大: {size} 字节（上限 {limit} 字节）")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    // ===== 数据错误 =====
    #[error("未找到有效数据行（至少需要 {min_columns} 列）")]
    NoValidRows { min_columns: usize },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
