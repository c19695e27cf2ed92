// ==========================================
// 暂停/恢复集成测试
// ==========================================

mod test_helpers;

use food_mes::{ApiError, PauseReason, WoStatus};
use test_helpers::Fixture;

#[test]
fn test_pause_then_resume_round_trip() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();

    let record = f
        .api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::MachineBreakdown, Some("搅拌机跳闸"))
        .unwrap();
    assert!(record.is_open());
    assert_eq!(record.reason, PauseReason::MachineBreakdown);

    let wo = f.work_order(&wo_id);
    assert_eq!(wo.status, WoStatus::Paused);
    assert_eq!(wo.pause_reason, Some(PauseReason::MachineBreakdown));
    assert!(wo.paused_at.is_some());

    let closed = f.api.resume_work_order(&f.ctx, &wo_id).unwrap();
    assert!(!closed.is_open());
    assert_eq!(closed.pause_id, record.pause_id);
    // 同进程内立刻恢复, 时长取整为 0 分钟
    assert_eq!(closed.duration_minutes, Some(0));

    let wo = f.work_order(&wo_id);
    assert_eq!(wo.status, WoStatus::InProgress);
    assert_eq!(wo.pause_reason, None);
    assert_eq!(wo.paused_at, None);
}

#[test]
fn test_pause_requires_in_progress() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);

    let err = f
        .api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::Break, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidStatus { status: WoStatus::Released, .. }
    ));
}

#[test]
fn test_double_pause_rejected() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();
    f.api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::Break, None)
        .unwrap();

    let err = f
        .api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::Other, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::AlreadyPaused { .. }));
}

#[test]
fn test_resume_without_pause_rejected() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();

    let err = f.api.resume_work_order(&f.ctx, &wo_id).unwrap_err();
    assert!(matches!(err, ApiError::NotPaused { .. }));
}

#[test]
fn test_pause_history_and_downtime_summary() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();

    for reason in [PauseReason::Break, PauseReason::MaterialShortage] {
        f.api
            .pause_work_order(&f.ctx, &wo_id, reason, None)
            .unwrap();
        f.api.resume_work_order(&f.ctx, &wo_id).unwrap();
    }

    let history = f.api.get_pause_history(&f.ctx, &wo_id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| !r.is_open()));

    let summary = f.api.get_downtime_summary(&f.ctx, &wo_id).unwrap();
    assert_eq!(summary.minutes_by_reason.len(), 2);
    assert_eq!(summary.total_minutes, 0); // 即时恢复, 均取整为 0
}

#[test]
fn test_open_interval_excluded_from_summary() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();
    f.api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::QualityIssue, None)
        .unwrap();

    // 未恢复的区间不计入汇总, 但出现在历史里
    let summary = f.api.get_downtime_summary(&f.ctx, &wo_id).unwrap();
    assert!(summary.minutes_by_reason.is_empty());

    let history = f.api.get_pause_history(&f.ctx, &wo_id).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_open());
}

#[test]
fn test_cross_org_pause_history_not_found() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);

    let err = f
        .api
        .get_pause_history(&f.other_org_ctx(), &wo_id)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn test_pause_resume_writes_status_history() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    f.api.start_work_order(&f.ctx, &wo_id).unwrap();
    f.api
        .pause_work_order(&f.ctx, &wo_id, PauseReason::Break, None)
        .unwrap();
    f.api.resume_work_order(&f.ctx, &wo_id).unwrap();

    let history = f.api.get_status_history(&f.ctx, &wo_id).unwrap();
    let transitions: Vec<_> = history
        .iter()
        .map(|h| (h.from_status, h.to_status))
        .collect();
    assert_eq!(
        transitions,
        vec![
            (Some(WoStatus::Released), WoStatus::InProgress),
            (Some(WoStatus::InProgress), WoStatus::Paused),
            (Some(WoStatus::Paused), WoStatus::InProgress),
        ]
    );
}
