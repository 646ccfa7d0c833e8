// ==========================================
// 运单系统 - 应用配置
// ==========================================
// 职责: 存储目录 / 列格式 / 冲突策略 / 文件上限
// 来源: 默认值 → 环境变量覆写 → 命令行参数覆写（由调用方完成）
// ==========================================

use crate::importer::file_validator::DEFAULT_MAX_FILE_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// 覆写表文件名
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// 发号历史文件名
pub const HISTORY_FILE_NAME: &str = "tracking_history.json";

/// 默认最少列数（标准三列格式）
pub const DEFAULT_MIN_COLUMNS: usize = 3;

/// 默认每个号码的随机抽取次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

// ==========================================
// CollisionPolicy - 随机抽取耗尽后的处理策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    Drop,  // 静默跳过该号位（调用方可能拿到少于请求数的号码）
    Fail,  // 整批失败，不登记任何号码
    Widen, // 顺序扫描后缀空间，必要时推进到后续秒
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::Drop
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Drop => write!(f, "drop"),
            CollisionPolicy::Fail => write!(f, "fail"),
            CollisionPolicy::Widen => write!(f, "widen"),
        }
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(CollisionPolicy::Drop),
            "fail" => Ok(CollisionPolicy::Fail),
            "widen" => Ok(CollisionPolicy::Widen),
            other => Err(format!("未知冲突策略: {}", other)),
        }
    }
}

// ==========================================
// 环境变量键
// ==========================================
pub mod config_keys {
    pub const DATA_DIR: &str = "WAYBILL_DESK_DATA_DIR";
    pub const MIN_COLUMNS: &str = "WAYBILL_DESK_MIN_COLUMNS";
    pub const COLLISION_POLICY: &str = "WAYBILL_DESK_COLLISION_POLICY";
    pub const MAX_ATTEMPTS: &str = "WAYBILL_DESK_MAX_ATTEMPTS";
    pub const MAX_FILE_SIZE: &str = "WAYBILL_DESK_MAX_FILE_SIZE";
}

// ==========================================
// AppConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub min_columns: usize,
    pub collision_policy: CollisionPolicy,
    pub max_attempts: u32,
    pub max_file_size: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            min_columns: DEFAULT_MIN_COLUMNS,
            collision_policy: CollisionPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl AppConfig {
    /// 默认值 + 环境变量覆写
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 默认值 + 任意键值来源覆写；非法值记录警告并保留默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(dir) = value(config_keys::DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = value(config_keys::MIN_COLUMNS) {
            match raw.parse::<usize>() {
                Ok(n) if n >= 2 => config.min_columns = n,
                _ => warn!(key = config_keys::MIN_COLUMNS, value = %raw, "配置值非法，使用默认值"),
            }
        }

        if let Some(raw) = value(config_keys::COLLISION_POLICY) {
            match raw.parse::<CollisionPolicy>() {
                Ok(policy) => config.collision_policy = policy,
                Err(e) => warn!(key = config_keys::COLLISION_POLICY, error = %e, "配置值非法，使用默认值"),
            }
        }

        if let Some(raw) = value(config_keys::MAX_ATTEMPTS) {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => config.max_attempts = n,
                _ => warn!(key = config_keys::MAX_ATTEMPTS, value = %raw, "配置值非法，使用默认值"),
            }
        }

        if let Some(raw) = value(config_keys::MAX_FILE_SIZE) {
            match raw.parse::<u64>() {
                Ok(n) if n > 0 => config.max_file_size = n,
                _ => warn!(key = config_keys::MAX_FILE_SIZE, value = %raw, "配置值非法，使用默认值"),
            }
        }

        config
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// 覆写表文件路径
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    /// 发号历史文件路径
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE_NAME)
    }
}

/// 默认存储目录（用户数据目录下的应用私有目录）
///
/// 目录在首次写入时创建
pub fn default_data_dir() -> PathBuf {
    // 开发环境使用独立目录，避免污染生产数据
    let dir_name = if cfg!(debug_assertions) {
        "waybill-desk-dev"
    } else {
        "waybill-desk"
    };

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join(dir_name),
        None => PathBuf::from("./.waybill-desk"),
    }
}
