// ==========================================
// TrackingNumberIssuer 持久化测试
// ==========================================
// 测试目标: 发号历史跨进程保留 / 损坏恢复 / 冲突策略
// ==========================================


use std::collections::HashSet;
use waybill_desk::config::CollisionPolicy;
use waybill_desk::domain::{compose_tracking_number, is_well_formed, IssuedNumberHistory, SUFFIX_SPACE};
use waybill_desk::engine::{IssueError, TrackingNumberSource};
use waybill_desk::repository::{IssuedHistoryRepository, JsonIssuedHistoryRepository};
use test_helpers::{create_test_config, fixed_instant, seeded_file_issuer};

#[test]
fn test_history_survives_restart() {
    let (_dir, config) = create_test_config();

    let first = seeded_file_issuer(&config, 42, CollisionPolicy::Drop)
        .issue(100)
        .unwrap();

    // 相同种子、相同时刻：抽取序列完全相同，只能靠历史避开
    let mut restarted = seeded_file_issuer(&config, 42, CollisionPolicy::Drop);
    assert_eq!(restarted.history_len(), 100);
    let second = restarted.issue(100).unwrap();

    let all: HashSet<_> = first.iter().chain(second.iter()).collect();
    assert_eq!(all.len(), 200);
    assert!(all.iter().all(|n| is_well_formed(n)));
}

#[test]
fn test_two_issuers_share_history_file() {
    let (_dir, config) = create_test_config();

    let mut window_a = seeded_file_issuer(&config, 1, CollisionPolicy::Drop);
    let mut window_b = seeded_file_issuer(&config, 1, CollisionPolicy::Drop);

    let a = window_a.issue(30).unwrap();
    let b = window_b.issue(30).unwrap();

    let all: HashSet<_> = a.iter().chain(b.iter()).collect();
    assert_eq!(all.len(), 60);
    assert_eq!(
        JsonIssuedHistoryRepository::new(config.history_path()).load().len(),
        60
    );
}

#[test]
fn test_corrupt_history_starts_empty() {
    let (_dir, config) = create_test_config();
    std::fs::write(config.history_path(), "{ not json").unwrap();

    let mut issuer = seeded_file_issuer(&config, 3, CollisionPolicy::Drop);
    assert_eq!(issuer.history_len(), 0);

    let numbers = issuer.issue(5).unwrap();
    assert_eq!(numbers.len(), 5);

    // 下次写回时覆盖损坏文件
    let reloaded = JsonIssuedHistoryRepository::new(config.history_path()).load();
    assert_eq!(reloaded.len(), 5);
}

fn saturate(config_history: &std::path::Path) {
    let history: IssuedNumberHistory = (0..SUFFIX_SPACE)
        .map(|suffix| compose_tracking_number(fixed_instant(), suffix))
        .collect();
    JsonIssuedHistoryRepository::new(config_history)
        .save(&history)
        .unwrap();
}

#[test]
fn test_collision_policies_under_saturation() {
    let (_dir, config) = create_test_config();
    saturate(&config.history_path());

    let dropped = seeded_file_issuer(&config, 9, CollisionPolicy::Drop)
        .with_max_attempts(10)
        .issue(4)
        .unwrap();
    assert!(dropped.is_empty());

    let failed = seeded_file_issuer(&config, 9, CollisionPolicy::Fail)
        .with_max_attempts(10)
        .issue(4);
    assert_eq!(
        failed,
        Err(IssueError::Exhausted {
            requested: 4,
            issued: 0
        })
    );
    assert_eq!(
        JsonIssuedHistoryRepository::new(config.history_path()).load().len(),
        1000
    );

    let widened = seeded_file_issuer(&config, 9, CollisionPolicy::Widen)
        .with_max_attempts(10)
        .issue(4)
        .unwrap();
    assert_eq!(widened.len(), 4);
    assert!(widened.iter().all(|n| n.starts_with("2026289143006")));
    assert_eq!(
        JsonIssuedHistoryRepository::new(config.history_path()).load().len(),
        1004
    );
}

#[test]
fn test_export_history_copy() {
    let (dir, config) = create_test_config();
    let mut issuer = seeded_file_issuer(&config, 5, CollisionPolicy::Drop);
    let numbers = issuer.issue(10).unwrap();

    let export_path = dir.path().join("backup").join("history.json");
    issuer.export_history(&export_path).unwrap();

    let exported = JsonIssuedHistoryRepository::new(&export_path).load();
    assert_eq!(exported.len(), 10);
    assert!(numbers.iter().all(|n| exported.contains(n)));
}
