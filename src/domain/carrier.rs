// ==========================================
// 运单系统 - 配送公司与市场覆写表
// ==========================================
// 职责: 固定配送公司集合 + 市场 → 配送公司覆写表
// 红线: 配送公司集合封闭，不接受集合外的值
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

// ==========================================
// Carrier - 配送公司（封闭集合）
// ==========================================
// 仅 TrackedCarrierA 需要运单号；其余配送公司运单号恒为空
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "direct-delivery")]
    DirectDelivery, // 直接交付
    #[serde(rename = "tracked-carrier-A")]
    TrackedCarrierA, // 默认配送公司（需要运单号）
    #[serde(rename = "tracked-carrier-B")]
    TrackedCarrierB,
    #[serde(rename = "tracked-carrier-C")]
    TrackedCarrierC,
    #[serde(rename = "tracked-carrier-D")]
    TrackedCarrierD,
}

impl Carrier {
    /// 全部配送公司（下拉选项顺序）
    pub const ALL: [Carrier; 5] = [
        Carrier::TrackedCarrierA,
        Carrier::DirectDelivery,
        Carrier::TrackedCarrierB,
        Carrier::TrackedCarrierC,
        Carrier::TrackedCarrierD,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::DirectDelivery => "direct-delivery",
            Carrier::TrackedCarrierA => "tracked-carrier-A",
            Carrier::TrackedCarrierB => "tracked-carrier-B",
            Carrier::TrackedCarrierC => "tracked-carrier-C",
            Carrier::TrackedCarrierD => "tracked-carrier-D",
        }
    }

    /// 是否需要由本系统生成运单号
    pub fn requires_tracking_number(&self) -> bool {
        matches!(self, Carrier::TrackedCarrierA)
    }
}

impl Default for Carrier {
    fn default() -> Self {
        Carrier::TrackedCarrierA
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Carrier::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == trimmed)
            .ok_or_else(|| format!("未知配送公司: {}", trimmed))
    }
}

// ==========================================
// CarrierOverrideTable - 市场覆写表
// ==========================================
// 键: 市场名（区分大小写，精确匹配）
// 持久化格式: { "marketSettings": { "<市场>": "<配送公司>" } }
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierOverrideTable {
    #[serde(
        rename = "marketSettings",
        default,
        deserialize_with = "deserialize_known_carriers"
    )]
    markets: BTreeMap<String, Carrier>,
}

// 逐项解析：集合外的配送公司只丢弃该项，其余市场保留
fn deserialize_known_carriers<'de, D>(deserializer: D) -> Result<BTreeMap<String, Carrier>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    let markets = raw
        .into_iter()
        .filter_map(|(market, value)| match value.parse::<Carrier>() {
            Ok(carrier) => Some((market, carrier)),
            Err(e) => {
                warn!(market = %market, error = %e, "覆写项配送公司未知，已忽略");
                None
            }
        })
        .collect();
    Ok(markets)
}

impl CarrierOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, market: &str) -> Option<Carrier> {
        self.markets.get(market).copied()
    }

    /// 写入覆写项；空白市场名被忽略
    pub fn set(&mut self, market: &str, carrier: Carrier) -> bool {
        if market.trim().is_empty() {
            return false;
        }
        self.markets.insert(market.to_string(), carrier);
        true
    }

    pub fn remove(&mut self, market: &str) -> Option<Carrier> {
        self.markets.remove(market)
    }

    pub fn markets(&self) -> BTreeSet<String> {
        self.markets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Carrier)> {
        self.markets.iter()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl FromIterator<(String, Carrier)> for CarrierOverrideTable {
    fn from_iter<I: IntoIterator<Item = (String, Carrier)>>(iter: I) -> Self {
        let mut table = CarrierOverrideTable::new();
        for (market, carrier) in iter {
            table.set(&market, carrier);
        }
        table
    }
}
