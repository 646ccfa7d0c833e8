// ==========================================
// 运单系统 - CSV 输出
// ==========================================
// 格式: 表头 + 每订单一行，顺序与输入一致
// ==========================================

use crate::domain::order::OutputRow;
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// 输出表头
pub const OUTPUT_HEADER: [&str; 3] = ["order_code", "tracking_number", "carrier"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// 写出输出行到任意 Writer
pub fn write_output_rows<W: Write>(writer: W, rows: &[OutputRow]) -> ExportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OUTPUT_HEADER)?;
    for row in rows {
        wtr.write_record(row.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

/// 写出输出行到文件（父目录不存在时创建）
pub fn write_output_file(path: &Path, rows: &[OutputRow]) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    write_output_rows(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "输出文件已写入");
    Ok(())
}

/// 默认输出文件名: waybills_YYYYMMDD_HHMMSS.csv
pub fn default_output_file_name(now: NaiveDateTime) -> String {
    format!("waybills_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
