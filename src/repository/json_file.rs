// ==========================================
// 运单系统 - JSON 文件读写
// ==========================================
// 读: 文件缺失或内容损坏 → None（不向调用方报错）
// 写: 首次写入时创建目录；同目录临时文件写完后整体替换，
//     读方只会看到旧文件或新文件；失败 → Persistence 错误
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!(path = %path.display(), "持久化文件不存在，使用空值");
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "持久化文件读取失败，使用空值");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "持久化文件内容损坏，使用空值");
            None
        }
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> RepositoryResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    replace_file(path, |file| file.write_all(&json))
}

/// 原子替换文件内容
///
/// 写入失败时临时文件随 NamedTempFile 析构删除，原文件保持不变
fn replace_file<F>(path: &Path, write: F) -> RepositoryResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let persistence_error = |message: String| RepositoryError::Persistence {
        path: path.display().to_string(),
        message,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| persistence_error(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| persistence_error(e.to_string()))?;
    write(temp.as_file_mut()).map_err(|e| persistence_error(e.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| persistence_error(e.to_string()))?;
    temp.persist(path)
        .map_err(|e| persistence_error(e.error.to_string()))?;
    Ok(())
}
