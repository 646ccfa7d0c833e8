// ==========================================
// 运单系统 - 配送公司目录
// ==========================================
// 职责: 市场 → 配送公司解析 + 覆写表维护
// 规则:
// - 空白市场 → 默认配送公司
// - 覆写表命中 → 覆写值
// - 未命中 → 默认配送公司（不是错误，只是待配置的空缺）
// 红线: 解析过程不修改覆写表；覆写表只在显式编辑时写回
// ==========================================

use crate::domain::carrier::{Carrier, CarrierOverrideTable};
use crate::domain::order::Order;
use crate::importer::data_cleaner::DataCleaner;
use crate::repository::carrier_table_repo::CarrierTableRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::{debug, info};

/// 默认配送公司（需要运单号）
pub const DEFAULT_CARRIER: Carrier = Carrier::TrackedCarrierA;

// 覆写表读-改-写串行化（进程级）
static CARRIER_TABLE_LOCK: Mutex<()> = Mutex::new(());

// ==========================================
// CarrierDirectory
// ==========================================
pub struct CarrierDirectory<R: CarrierTableRepository> {
    repo: R,
    table: CarrierOverrideTable,
}

impl<R: CarrierTableRepository> CarrierDirectory<R> {
    /// 创建目录并加载覆写表
    pub fn new(repo: R) -> Self {
        let table = repo.load();
        debug!(markets = table.len(), "覆写表加载完成");
        Self { repo, table }
    }

    /// 重新加载覆写表（每次解析开始时调用）
    pub fn load(&mut self) -> &CarrierOverrideTable {
        self.table = self.repo.load();
        &self.table
    }

    pub fn table(&self) -> &CarrierOverrideTable {
        &self.table
    }

    /// 解析市场对应的配送公司
    pub fn resolve(&self, market: &str) -> Carrier {
        if market.trim().is_empty() {
            return DEFAULT_CARRIER;
        }
        self.table.get(market).unwrap_or(DEFAULT_CARRIER)
    }

    /// 整表写回（配置界面确认时调用）
    pub fn save(&mut self, table: CarrierOverrideTable) -> RepositoryResult<()> {
        let _guard = lock_table()?;
        self.repo.save(&table)?;
        info!(markets = table.len(), "覆写表已保存");
        self.table = table;
        Ok(())
    }

    /// 设置单个市场的配送公司
    ///
    /// 读-改-写：先读取最新持久化内容，避免覆盖其他窗口的修改。
    /// 空白市场名不写入，返回 Ok(false)。
    pub fn set_carrier(&mut self, market: &str, carrier: Carrier) -> RepositoryResult<bool> {
        let _guard = lock_table()?;
        let mut table = self.repo.load();
        if !table.set(market, carrier) {
            return Ok(false);
        }
        self.repo.save(&table)?;
        info!(market = %market, carrier = %carrier, "市场配送公司已更新");
        self.table = table;
        Ok(true)
    }

    /// 删除单个市场的覆写项（恢复默认配送公司）
    pub fn remove_market(&mut self, market: &str) -> RepositoryResult<bool> {
        let _guard = lock_table()?;
        let mut table = self.repo.load();
        if table.remove(market).is_none() {
            self.table = table;
            return Ok(false);
        }
        self.repo.save(&table)?;
        info!(market = %market, "市场覆写项已删除");
        self.table = table;
        Ok(true)
    }

    /// 已配置的市场
    pub fn list_known_markets(&self) -> BTreeSet<String> {
        self.table.markets()
    }

    /// 订单中出现但尚未配置的市场（回退到默认配送公司）
    pub fn unconfigured_markets(&self, orders: &[Order]) -> BTreeSet<String> {
        orders
            .iter()
            .map(|o| o.market.as_str())
            .filter(|m| !m.trim().is_empty() && self.table.get(m).is_none())
            .map(str::to_string)
            .collect()
    }
}

fn lock_table() -> RepositoryResult<std::sync::MutexGuard<'static, ()>> {
    CARRIER_TABLE_LOCK
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

/// 配置界面的市场排序：两位数字编号前缀的市场按编号在前，其余按名称在后
pub fn sort_markets_for_display<I>(markets: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let cleaner = DataCleaner;
    let mut sorted: Vec<String> = markets.into_iter().collect();
    sorted.sort_by(|a, b| {
        let key_a = cleaner.market_number_prefix(a).unwrap_or(u32::MAX);
        let key_b = cleaner.market_number_prefix(b).unwrap_or(u32::MAX);
        key_a.cmp(&key_b).then_with(|| a.cmp(b))
    });
    sorted
}
