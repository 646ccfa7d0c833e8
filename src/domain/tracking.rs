// ==========================================
// 运单系统 - 运单号格式与发号历史
// ==========================================
// 格式: YYYYDDDHHMMSSFFF（16 位十进制）
// - YYYY: 年
// - DDD:  年内第几天 (001-366)
// - HH/MM/SS: 生成时刻的时/分/秒
// - FFF:  随机后缀 (000-999)
// ==========================================

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 运单号长度
pub const TRACKING_NUMBER_LENGTH: usize = 16;

/// 随机后缀取值个数 (000-999)
pub const SUFFIX_SPACE: u32 = 1000;

/// 按时刻与后缀拼装运单号
pub fn compose_tracking_number(instant: NaiveDateTime, suffix: u32) -> String {
    format!(
        "{:04}{:03}{:02}{:02}{:02}{:03}",
        instant.year(),
        instant.ordinal(),
        instant.hour(),
        instant.minute(),
        instant.second(),
        suffix % SUFFIX_SPACE
    )
}

/// 格式校验：16 位数字，年内天数 001-366，时分秒在合法范围内
pub fn is_well_formed(number: &str) -> bool {
    if number.len() != TRACKING_NUMBER_LENGTH || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let field = |from: usize, to: usize| number[from..to].parse::<u32>().unwrap_or(u32::MAX);
    let day = field(4, 7);
    let hour = field(7, 9);
    let minute = field(9, 11);
    let second = field(11, 13);

    (1..=366).contains(&day) && hour < 24 && minute < 60 && second < 60
}

// ==========================================
// IssuedNumberHistory - 发号历史（只增不减）
// ==========================================
// 持久化格式: JSON 字符串数组
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuedNumberHistory {
    numbers: BTreeSet<String>,
}

impl IssuedNumberHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, number: &str) -> bool {
        self.numbers.contains(number)
    }

    /// 登记新号码；已存在时返回 false
    pub fn insert(&mut self, number: String) -> bool {
        self.numbers.insert(number)
    }

    /// 合并另一份历史（并集）
    pub fn merge(&mut self, other: IssuedNumberHistory) {
        self.numbers.extend(other.numbers);
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.numbers.iter()
    }
}

impl FromIterator<String> for IssuedNumberHistory {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            numbers: iter.into_iter().collect(),
        }
    }
}
