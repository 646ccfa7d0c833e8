// ==========================================
// 运单系统 - 数据清洗器
// ==========================================
// 职责: TRIM / 数字首字符探测 / 表头标签识别 / 市场编号前缀识别
// ==========================================

/// 韩文表头关键字（订单 / 编码 / 编号 / 市场 / 名称）
const HEADER_KEYWORDS_KO: [&str; 5] = ["주문", "코드", "번호", "마켓", "이름"];

/// 英文表头列名（已去分隔符并转小写）
const HEADER_LABELS_EN: [&str; 8] = [
    "order",
    "orderid",
    "orderno",
    "ordernumber",
    "ordercode",
    "code",
    "market",
    "marketname",
];

pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 首字符是否为数字（表头探测）
    pub fn starts_with_digit(&self, value: &str) -> bool {
        value
            .trim()
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    }

    /// 是否为表头标签（列名关键字）
    ///
    /// 韩文列名按包含匹配；英文列名忽略大小写与分隔符后整词匹配
    pub fn is_header_label(&self, value: &str) -> bool {
        if HEADER_KEYWORDS_KO.iter().any(|k| value.contains(k)) {
            return true;
        }

        let folded: String = value
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        HEADER_LABELS_EN.contains(&folded.as_str())
    }

    /// 市场名的两位数字编号前缀（"06.ShopA" → Some(6)）
    pub fn market_number_prefix(&self, market: &str) -> Option<u32> {
        let prefix: String = market.trim().chars().take(2).collect();
        if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_digit()) {
            prefix.parse().ok()
        } else {
            None
        }
    }
}
