// ==========================================
// 运单系统 - 表格单元格值
// ==========================================
// 职责: 异构单元格（文本/数值/布尔/公式/空白）统一转为字符串
// 规则:
// - 文本: 原样
// - 数值: 无小数部分 → 整数形式；否则默认字符串形式
// - 布尔: "True" / "False"
// - 公式: 缓存文本结果，其次缓存数值结果
// - 空白: ""
// ==========================================

use thiserror::Error;

/// 单元格转换失败（行级错误，仅用于丢弃该行）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("公式单元格无缓存结果")]
    FormulaWithoutResult,

    #[error("数值非法: {0}")]
    NonFiniteNumber(f64),

    #[error("单元格错误值: {0}")]
    ErrorValue(String),
}

/// 原始单元格
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Formula {
        cached_text: Option<String>,
        cached_number: Option<f64>,
    },
    Error(String),
    Blank,
}

impl CellValue {
    /// 转为字符串（未 trim）
    pub fn to_text(&self) -> Result<String, CellError> {
        match self {
            CellValue::Text(s) => Ok(s.clone()),
            CellValue::Number(n) => render_number(*n),
            CellValue::Boolean(true) => Ok("True".to_string()),
            CellValue::Boolean(false) => Ok("False".to_string()),
            CellValue::Formula {
                cached_text: Some(s),
                ..
            } => Ok(s.clone()),
            CellValue::Formula {
                cached_text: None,
                cached_number: Some(n),
            } => render_number(*n),
            CellValue::Formula {
                cached_text: None,
                cached_number: None,
            } => Err(CellError::FormulaWithoutResult),
            CellValue::Error(e) => Err(CellError::ErrorValue(e.clone())),
            CellValue::Blank => Ok(String::new()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(value)
        }
    }
}

// 超出 i64 精确范围的整数值交给默认格式
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

fn render_number(n: f64) -> Result<String, CellError> {
    if !n.is_finite() {
        return Err(CellError::NonFiniteNumber(n));
    }
    if n.fract() == 0.0 && n.abs() < EXACT_INTEGER_LIMIT {
        Ok(format!("{}", n as i64))
    } else {
        Ok(n.to_string())
    }
}
