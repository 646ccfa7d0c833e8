// ==========================================
// 运单系统 - 输入文件校验
// ==========================================
// 职责: 解析前的文件级检查（存在/类型/扩展名/大小）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::path::Path;

/// 默认文件大小上限: 100 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// 表格来源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet, // .xlsx / .xls / .xlsm / .ods
    Delimited,   // .csv / .tsv / .txt
}

impl SourceFormat {
    /// 按扩展名（不区分大小写）识别格式
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(SourceFormat::Spreadsheet),
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

/// 校验输入文件
pub fn validate_input_file(path: &Path, max_size: u64) -> ImportResult<SourceFormat> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    if !path.is_file() {
        return Err(ImportError::FileReadError(format!(
            "不是文件: {}",
            path.display()
        )));
    }

    let format = SourceFormat::from_path(path)?;

    let size = std::fs::metadata(path)?.len();
    if size == 0 {
        return Err(ImportError::FileEmpty(path.display().to_string()));
    }
    if size > max_size {
        return Err(ImportError::FileTooLarge {
            size,
            limit: max_size,
        });
    }

    Ok(format)
}
