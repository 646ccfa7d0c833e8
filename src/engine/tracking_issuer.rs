// ==========================================
// 运单系统 - 运单号发号器
// ==========================================
// 格式: YYYYDDDHHMMSSFFF（见 domain::tracking）
// 流程（每个号位）:
// 1. 当前时刻 + 随机后缀 → 候选号
// 2. 候选号已在历史中（含本批已发） → 重新抽取，最多 max_attempts 次
// 3. 抽取耗尽 → 按 CollisionPolicy 处理（drop / fail / widen）
// 副作用: 本批号码并入历史并整体写回；写回失败只记录日志
// ==========================================

use crate::config::app_config::{CollisionPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::domain::tracking::{compose_tracking_number, IssuedNumberHistory, SUFFIX_SPACE};
use crate::repository::error::RepositoryResult;
use crate::repository::issued_history_repo::{
    IssuedHistoryRepository, JsonIssuedHistoryRepository,
};
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

// 发号历史读-改-写串行化（进程级）
static HISTORY_LOCK: Mutex<()> = Mutex::new(());

// ==========================================
// Clock - 时间来源
// ==========================================
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

/// 本地时间
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// 固定时间（测试 / 回放）
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// ==========================================
// IssueError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("运单号冲突耗尽: 请求 {requested} 个，已生成 {issued} 个")]
    Exhausted { requested: usize, issued: usize },
}

// ==========================================
// TrackingNumberSource Trait
// ==========================================
// 用途: 流水线按批次索取运单号
// 实现者: TrackingNumberIssuer
pub trait TrackingNumberSource {
    /// 索取 count 个互不相同、且从未发出过的运单号
    ///
    /// Drop 策略下返回数量可能少于 count
    fn issue(&mut self, count: usize) -> Result<Vec<String>, IssueError>;
}

// ==========================================
// TrackingNumberIssuer
// ==========================================
pub struct TrackingNumberIssuer<H: IssuedHistoryRepository> {
    repo: H,
    history: IssuedNumberHistory,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    policy: CollisionPolicy,
    max_attempts: u32,
}

impl<H: IssuedHistoryRepository> TrackingNumberIssuer<H> {
    /// 创建发号器并加载历史
    pub fn new(repo: H) -> Self {
        let history = repo.load();
        info!(existing = history.len(), "发号历史加载完成");

        Self {
            repo,
            history,
            clock: Box::new(SystemClock),
            rng: Box::new(StdRng::from_os_rng()),
            policy: CollisionPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// 历史中已发出的号码数
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &IssuedNumberHistory {
        &self.history
    }

    /// 导出历史副本
    pub fn export_history(&self, path: &Path) -> RepositoryResult<()> {
        JsonIssuedHistoryRepository::new(path).save(&self.history)?;
        info!(path = %path.display(), count = self.history.len(), "发号历史已导出");
        Ok(())
    }

    fn is_taken(&self, candidate: &str, batch: &HashSet<String>) -> bool {
        self.history.contains(candidate) || batch.contains(candidate)
    }

    /// 随机抽取，最多 max_attempts 次
    fn draw_unique(&mut self, batch: &HashSet<String>) -> Option<String> {
        for _ in 0..self.max_attempts {
            let suffix = self.rng.random_range(0..SUFFIX_SPACE);
            let candidate = compose_tracking_number(self.clock.now(), suffix);
            if !self.is_taken(&candidate, batch) {
                return Some(candidate);
            }
        }
        None
    }

    /// 顺序扫描：当前秒的全部后缀，然后逐秒推进
    ///
    /// 已占用号码有限，必然在有限步内找到空位
    fn scan_unique(&self, batch: &HashSet<String>) -> String {
        let start = self.clock.now();
        let mut offset = 0i64;
        loop {
            let instant = start + chrono::Duration::seconds(offset);
            for suffix in 0..SUFFIX_SPACE {
                let candidate = compose_tracking_number(instant, suffix);
                if !self.is_taken(&candidate, batch) {
                    return candidate;
                }
            }
            offset += 1;
        }
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.history) {
            // 持久化尽力而为：内存中的发号结果仍然有效
            warn!(error = %e, "发号历史写回失败");
        }
    }
}

impl<H: IssuedHistoryRepository> TrackingNumberSource for TrackingNumberIssuer<H> {
    fn issue(&mut self, count: usize) -> Result<Vec<String>, IssueError> {
        let _guard = HISTORY_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        // 合并其他发号器已写回的号码
        let persisted = self.repo.load();
        self.history.merge(persisted);

        let mut issued = Vec::with_capacity(count);
        let mut batch = HashSet::with_capacity(count);

        for slot in 0..count {
            let number = match self.draw_unique(&batch) {
                Some(number) => number,
                None => match self.policy {
                    CollisionPolicy::Drop => {
                        warn!(slot = slot, attempts = self.max_attempts, "运单号冲突耗尽，跳过该号位");
                        continue;
                    }
                    CollisionPolicy::Fail => {
                        warn!(requested = count, issued = issued.len(), "运单号冲突耗尽，整批失败");
                        return Err(IssueError::Exhausted {
                            requested: count,
                            issued: issued.len(),
                        });
                    }
                    CollisionPolicy::Widen => {
                        debug!(slot = slot, "随机抽取耗尽，改为顺序扫描");
                        self.scan_unique(&batch)
                    }
                },
            };
            batch.insert(number.clone());
            issued.push(number);
        }

        for number in &issued {
            self.history.insert(number.clone());
        }
        self.persist();

        info!(
            requested = count,
            issued = issued.len(),
            history = self.history.len(),
            "运单号生成完成"
        );
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tracking::is_well_formed;
    use crate::repository::issued_history_repo::InMemoryIssuedHistoryRepository;
    use chrono::{Datelike, NaiveDate};
    use std::sync::Arc;

    fn fixed_instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    // 固定时刻下全部 1000 个后缀已被占用的历史
    fn saturated_history(instant: NaiveDateTime) -> IssuedNumberHistory {
        (0..SUFFIX_SPACE)
            .map(|suffix| compose_tracking_number(instant, suffix))
            .collect()
    }

    fn seeded_issuer(
        repo: Arc<InMemoryIssuedHistoryRepository>,
    ) -> TrackingNumberIssuer<Arc<InMemoryIssuedHistoryRepository>> {
        TrackingNumberIssuer::new(repo)
            .with_clock(FixedClock(fixed_instant()))
            .with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_issue_format_with_system_clock() {
        let mut issuer = TrackingNumberIssuer::new(InMemoryIssuedHistoryRepository::new());
        let numbers = issuer.issue(20).unwrap();
        let year = chrono::Local::now().year().to_string();

        assert_eq!(numbers.len(), 20);
        for number in &numbers {
            assert!(is_well_formed(number), "{number}");
            assert!(number.starts_with(&year));
        }
    }

    #[test]
    fn test_issue_zero() {
        let mut issuer = seeded_issuer(Arc::new(InMemoryIssuedHistoryRepository::new()));
        assert!(issuer.issue(0).unwrap().is_empty());
    }

    #[test]
    fn test_numbers_unique_within_batch() {
        let mut issuer = seeded_issuer(Arc::new(InMemoryIssuedHistoryRepository::new()));
        let numbers = issuer.issue(200).unwrap();

        let unique: HashSet<_> = numbers.iter().collect();
        assert_eq!(numbers.len(), 200);
        assert_eq!(unique.len(), 200);
        assert!(numbers.iter().all(|n| n.starts_with("2026289143005")));
    }

    #[test]
    fn test_numbers_unique_across_batches_and_restarts() {
        let repo = Arc::new(InMemoryIssuedHistoryRepository::new());

        let first = seeded_issuer(repo.clone()).issue(50).unwrap();
        // 新发号器（模拟进程重启），相同种子 → 相同抽取序列，必须绕开历史
        let second = seeded_issuer(repo.clone()).issue(50).unwrap();

        let all: HashSet<_> = first.iter().chain(second.iter()).collect();
        assert_eq!(all.len(), 100);
        assert_eq!(repo.load().len(), 100);
    }

    #[test]
    fn test_drop_policy_returns_fewer_numbers() {
        let instant = fixed_instant();
        let repo = Arc::new(InMemoryIssuedHistoryRepository::with_history(
            saturated_history(instant),
        ));
        let mut issuer = seeded_issuer(repo.clone()).with_policy(CollisionPolicy::Drop);

        let numbers = issuer.issue(3).unwrap();
        assert!(numbers.is_empty());
        assert_eq!(repo.load().len(), 1000);
    }

    #[test]
    fn test_fail_policy_issues_nothing() {
        let instant = fixed_instant();
        let repo = Arc::new(InMemoryIssuedHistoryRepository::with_history(
            saturated_history(instant),
        ));
        let mut issuer = seeded_issuer(repo.clone()).with_policy(CollisionPolicy::Fail);

        let err = issuer.issue(2).unwrap_err();
        assert_eq!(
            err,
            IssueError::Exhausted {
                requested: 2,
                issued: 0
            }
        );
        assert_eq!(issuer.history_len(), 1000);
    }

    #[test]
    fn test_widen_policy_moves_to_next_second() {
        let instant = fixed_instant();
        let repo = Arc::new(InMemoryIssuedHistoryRepository::with_history(
            saturated_history(instant),
        ));
        let mut issuer = seeded_issuer(repo).with_policy(CollisionPolicy::Widen);

        let numbers = issuer.issue(2).unwrap();
        assert_eq!(numbers, vec!["2026289143006000", "2026289143006001"]);
        assert!(numbers.iter().all(|n| is_well_formed(n)));
    }

    #[test]
    fn test_history_restored_from_repository() {
        let history: IssuedNumberHistory = vec!["2026289143005001".to_string()].into_iter().collect();
        let issuer = TrackingNumberIssuer::new(InMemoryIssuedHistoryRepository::with_history(history));
        assert_eq!(issuer.history_len(), 1);
        assert!(issuer.history().contains("2026289143005001"));
    }

    #[test]
    fn test_persistence_failure_is_swallowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let repo = JsonIssuedHistoryRepository::new(blocker.join("tracking_history.json"));
        let mut issuer = TrackingNumberIssuer::new(repo)
            .with_clock(FixedClock(fixed_instant()))
            .with_rng(StdRng::seed_from_u64(1));

        let numbers = issuer.issue(5).unwrap();
        assert_eq!(numbers.len(), 5);
        assert_eq!(issuer.history_len(), 5);
    }

    #[test]
    fn test_export_history() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut issuer = seeded_issuer(Arc::new(InMemoryIssuedHistoryRepository::new()));
        let numbers = issuer.issue(3).unwrap();

        let path = dir.path().join("export.json");
        issuer.export_history(&path).unwrap();

        let exported = JsonIssuedHistoryRepository::new(&path).load();
        assert_eq!(exported.len(), 3);
        assert!(numbers.iter().all(|n| exported.contains(n)));
    }
}
