// ==========================================
// 运单系统 - 订单领域模型
// ==========================================
// 职责: 标准化后的订单记录 + 输出行
// 生命周期: 由单次流水线运行独占，输出后丢弃
// ==========================================

use crate::domain::carrier::Carrier;
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 标准化订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,        // 外部订单号（可为空，不参与去重）
    pub order_code: String,      // 订单唯一编码（输出主键）
    pub market: String,          // 销售渠道（非空）
    pub carrier: Option<Carrier>, // 配送公司（每次运行解析一次）
    pub tracking_number: String, // 运单号（仅需运单号的配送公司非空）
}

impl Order {
    pub fn new(
        order_id: impl Into<String>,
        order_code: impl Into<String>,
        market: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            order_code: order_code.into(),
            market: market.into(),
            carrier: None,
            tracking_number: String::new(),
        }
    }

    /// 当前配送公司是否需要运单号
    pub fn requires_tracking_number(&self) -> bool {
        self.carrier
            .map(|c| c.requires_tracking_number())
            .unwrap_or(false)
    }

    /// 人工覆写单条订单的配送公司（表格编辑）
    ///
    /// 不需要运单号的配送公司立即清空运单号
    pub fn override_carrier(&mut self, carrier: Carrier) {
        self.carrier = Some(carrier);
        if !carrier.requires_tracking_number() {
            self.tracking_number.clear();
        }
    }

    /// 输出主键：订单编码；旧版两列格式无编码列时回退到订单号
    pub fn output_key(&self) -> &str {
        if self.order_code.is_empty() {
            &self.order_id
        } else {
            &self.order_code
        }
    }

    pub fn to_output_row(&self) -> OutputRow {
        OutputRow {
            order_code: self.output_key().to_string(),
            tracking_number: self.tracking_number.clone(),
            carrier: self
                .carrier
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

// ==========================================
// OutputRow - 输出行（固定 3 列）
// ==========================================
// 顺序: 订单编码, 运单号, 配送公司
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub order_code: String,
    pub tracking_number: String,
    pub carrier: String,
}

impl OutputRow {
    pub fn fields(&self) -> [&str; 3] {
        [&self.order_code, &self.tracking_number, &self.carrier]
    }
}
