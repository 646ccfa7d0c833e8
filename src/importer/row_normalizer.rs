// ==========================================
// 运单系统 - 行标准化器
// ==========================================
// 职责: 原始行（异构单元格）→ 标准化订单
// 流程: 表头探测 → 逐行转换 → TRIM → 必填校验 → 收集
// 红线: 单行失败只丢弃该行，不中断后续行
// ==========================================

use crate::domain::cell::{CellError, CellValue};
use crate::domain::order::Order;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// 原始行：按列顺序排列的单元格
pub type RawRow = Vec<CellValue>;

// ==========================================
// ColumnShape - 输入列格式
// ==========================================
// Standard: orderId, orderCode, market（3 列）
// Legacy:   orderId, market（2 列，无订单编码列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnShape {
    Legacy,
    Standard,
}

impl ColumnShape {
    /// 按最少列数选择格式（≤2 → 旧版两列格式）
    pub fn from_min_columns(min_columns: usize) -> Self {
        if min_columns <= 2 {
            ColumnShape::Legacy
        } else {
            ColumnShape::Standard
        }
    }

    pub fn min_columns(&self) -> usize {
        match self {
            ColumnShape::Legacy => 2,
            ColumnShape::Standard => 3,
        }
    }

    fn order_code_index(&self) -> Option<usize> {
        match self {
            ColumnShape::Legacy => None,
            ColumnShape::Standard => Some(1),
        }
    }

    fn market_index(&self) -> usize {
        match self {
            ColumnShape::Legacy => 1,
            ColumnShape::Standard => 2,
        }
    }
}

impl fmt::Display for ColumnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnShape::Legacy => write!(f, "legacy(orderId, market)"),
            ColumnShape::Standard => write!(f, "standard(orderId, orderCode, market)"),
        }
    }
}

// 行被丢弃的原因（仅用于日志）
#[derive(Debug)]
enum RowRejection {
    MissingCell(usize),
    Cell(CellError),
    EmptyMarket,
    EmptyOrderCode,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingCell(idx) => write!(f, "缺少第 {} 列", idx + 1),
            RowRejection::Cell(e) => write!(f, "单元格转换失败: {}", e),
            RowRejection::EmptyMarket => write!(f, "市场为空"),
            RowRejection::EmptyOrderCode => write!(f, "订单编码为空"),
        }
    }
}

// ==========================================
// RowNormalizer - 行标准化器
// ==========================================
pub struct RowNormalizer {
    cleaner: DataCleaner,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 原始行 → 订单
    ///
    /// # 参数
    /// - rows: 原始行
    /// - min_columns: 最少列数（2 = 旧版格式，3 = 标准格式）
    ///
    /// # 返回
    /// - Ok(Vec<Order>): 至少一条订单
    /// - Err(NoValidRows): 没有任何有效行
    pub fn normalize(&self, rows: &[RawRow], min_columns: usize) -> ImportResult<Vec<Order>> {
        let shape = ColumnShape::from_min_columns(min_columns);
        let required = min_columns.max(shape.min_columns());

        let start = if self.is_header_row(rows, required) {
            debug!("首行识别为表头，跳过");
            1
        } else {
            0
        };

        let mut orders = Vec::with_capacity(rows.len().saturating_sub(start));
        let mut dropped = 0usize;

        for (idx, row) in rows.iter().enumerate().skip(start) {
            match self.normalize_row(row, shape) {
                Ok(order) => orders.push(order),
                Err(reason) => {
                    dropped += 1;
                    debug!(row_number = idx + 1, reason = %reason, "丢弃无效行");
                }
            }
        }

        info!(
            shape = %shape,
            total_rows = rows.len(),
            kept = orders.len(),
            dropped = dropped,
            "行标准化完成"
        );

        if orders.is_empty() {
            return Err(ImportError::NoValidRows {
                min_columns: required,
            });
        }

        Ok(orders)
    }

    /// 表头探测
    ///
    /// - 首列为列名关键字 → 表头（单独一行同样适用）
    /// - 单独一行且非列名 → 数据
    /// - 否则首行列数不足，或首列首字符不是数字 → 表头
    pub fn is_header_row(&self, rows: &[RawRow], min_columns: usize) -> bool {
        let first = match rows.first() {
            Some(first) => first,
            None => return false,
        };

        let leading = first.first().map(|cell| cell.to_text());
        if let Some(Ok(text)) = &leading {
            if self.cleaner.is_header_label(text) {
                return true;
            }
        }

        if rows.len() < 2 {
            return false;
        }

        if first.len() < min_columns {
            return true;
        }

        match leading {
            Some(Ok(text)) => !self.cleaner.starts_with_digit(&text),
            _ => true,
        }
    }

    fn normalize_row(&self, row: &RawRow, shape: ColumnShape) -> Result<Order, RowRejection> {
        let cell = |idx: usize| -> Result<String, RowRejection> {
            let value = row.get(idx).ok_or(RowRejection::MissingCell(idx))?;
            let text = value.to_text().map_err(RowRejection::Cell)?;
            Ok(self.cleaner.clean_text(&text))
        };

        let order_id = cell(0)?;
        let market = cell(shape.market_index())?;
        if market.is_empty() {
            return Err(RowRejection::EmptyMarket);
        }

        let order_code = match shape.order_code_index() {
            Some(idx) => {
                let code = cell(idx)?;
                if code.is_empty() {
                    return Err(RowRejection::EmptyOrderCode);
                }
                code
            }
            None => String::new(),
        };

        Ok(Order::new(order_id, order_code, market))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn test_header_row_skipped() {
        let rows = vec![
            text_row(&["Order Id", "Order Code", "Market"]),
            text_row(&["1", "A1", "06.ShopA"]),
        ];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_code, "A1");
    }

    #[test]
    fn test_digit_first_row_kept_as_data() {
        let rows = vec![
            text_row(&["1", "A1", "06.ShopA"]),
            text_row(&["2", "A2", "03.ShopB"]),
        ];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "1");
    }

    #[test]
    fn test_short_first_row_is_header() {
        let rows = vec![text_row(&["Orders"]), text_row(&["1", "A1", "06.ShopA"])];
        let normalizer = RowNormalizer::new();

        assert!(normalizer.is_header_row(&rows, 3));
        assert_eq!(normalizer.normalize(&rows, 3).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_market_row_dropped() {
        let rows = vec![text_row(&["1", "A1", "MarketX"]), text_row(&["", "", ""])];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].market, "MarketX");
    }

    #[test]
    fn test_cells_are_trimmed() {
        let rows = vec![text_row(&["  7 ", " A7\t", "  06.ShopA  "])];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders[0], Order::new("7", "A7", "06.ShopA"));
    }

    #[test]
    fn test_bad_cell_does_not_stop_later_rows() {
        let rows = vec![
            text_row(&["1", "A1", "06.ShopA"]),
            vec![
                CellValue::Number(2.0),
                CellValue::Formula {
                    cached_text: None,
                    cached_number: None,
                },
                CellValue::from("06.ShopA"),
            ],
            vec![
                CellValue::Number(3.0),
                CellValue::Text("A3".to_string()),
                CellValue::Text("03.ShopB".to_string()),
            ],
        ];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].order_id, "3");
    }

    #[test]
    fn test_typed_cells_coerced() {
        let rows = vec![vec![
            CellValue::Number(1001.0),
            CellValue::Boolean(true),
            CellValue::Formula {
                cached_text: Some("06.ShopA".to_string()),
                cached_number: None,
            },
        ]];
        let orders = RowNormalizer::new().normalize(&rows, 3).unwrap();

        assert_eq!(orders[0].order_id, "1001");
        assert_eq!(orders[0].order_code, "True");
        assert_eq!(orders[0].market, "06.ShopA");
    }

    #[test]
    fn test_standard_shape_requires_order_code() {
        let rows = vec![text_row(&["1", "", "06.ShopA"])];
        let err = RowNormalizer::new().normalize(&rows, 3).unwrap_err();

        assert!(matches!(err, ImportError::NoValidRows { min_columns: 3 }));
    }

    #[test]
    fn test_legacy_shape() {
        let rows = vec![text_row(&["ORD1", "MarketFoo"])];
        let orders = RowNormalizer::new().normalize(&rows, 2).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ORD1");
        assert_eq!(orders[0].order_code, "");
        assert_eq!(orders[0].market, "MarketFoo");
    }

    #[test]
    fn test_header_only_input_has_no_orders() {
        let normalizer = RowNormalizer::new();

        let standard = vec![text_row(&["orderId", "orderCode", "market"])];
        assert!(normalizer.is_header_row(&standard, 3));
        assert!(matches!(
            normalizer.normalize(&standard, 3),
            Err(ImportError::NoValidRows { min_columns: 3 })
        ));

        let korean = vec![text_row(&["주문번호", "주문코드", "마켓"])];
        assert!(matches!(
            normalizer.normalize(&korean, 3),
            Err(ImportError::NoValidRows { .. })
        ));

        // 非列名的单独一行仍是数据
        let lone = vec![text_row(&["ORD1", "MarketFoo"])];
        assert!(!normalizer.is_header_row(&lone, 2));
    }

    #[test]
    fn test_legacy_shape_skips_header() {
        let rows = vec![
            text_row(&["Order", "Market"]),
            text_row(&["ORD1", "MarketFoo"]),
        ];
        let orders = RowNormalizer::new().normalize(&rows, 2).unwrap();

        // 首列非数字 → 首行为表头
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].market, "MarketFoo");
    }

    #[test]
    fn test_no_valid_rows_reports_min_columns() {
        let rows = vec![text_row(&["1", "A1"]), text_row(&["2", "A2"])];
        let err = RowNormalizer::new().normalize(&rows, 3).unwrap_err();

        match err {
            ImportError::NoValidRows { min_columns } => assert_eq!(min_columns, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let err = RowNormalizer::new().normalize(&[], 3).unwrap_err();
        assert!(matches!(err, ImportError::NoValidRows { .. }));
    }
}
