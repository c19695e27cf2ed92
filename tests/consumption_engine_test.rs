// ==========================================
// 消耗引擎集成测试
// ==========================================
// 覆盖: 整托策略 / 差异核算 / 部分消耗 / 幂等守卫 / 失败不留半截
// ==========================================

mod test_helpers;

use food_mes::{ApiError, LpStatus, ReservationStatus, WoStatus};
use test_helpers::Fixture;

#[test]
fn test_whole_lp_policy_rejects_partial_and_leaves_no_trace() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(90.0, 100.0, 100.0, true);

    // 整托策略下请求 60 (容器 100) 被拒
    let err = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 60.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::WholeLpRequired {
            required_qty,
            requested_qty,
        } if required_qty == 100.0 && requested_qty == 60.0
    ));

    // 整体回滚: 容器数量/物料行/预留均不动
    let lp = f.lp(&s.lp_id);
    assert_eq!(lp.quantity, 100.0);
    assert_eq!(lp.status, LpStatus::Reserved);
    assert_eq!(f.material(&s.material_id).consumed_qty, 0.0);
    let consumptions = f.api.list_consumptions(&f.ctx, &s.wo_id).unwrap();
    assert!(consumptions.is_empty());
}

#[test]
fn test_whole_lp_consume_depletes_and_reports_variance() {
    let f = Fixture::new();
    // 需求 90, 整托 100
    let s = f.seed_running_scenario(90.0, 100.0, 100.0, true);

    let outcome = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 100.0)
        .unwrap();

    assert!(outcome.lp_depleted);
    assert_eq!(outcome.lp_qty_after, 0.0);
    // (100 - 90) / 90 * 100 ≈ +11.11%
    assert!((outcome.variance_pct - 11.111111).abs() < 1e-4);

    // 容器进终态并盖上耗尽工单
    let lp = f.lp(&s.lp_id);
    assert_eq!(lp.status, LpStatus::Consumed);
    assert_eq!(lp.quantity, 0.0);
    assert_eq!(lp.consumed_by_wo_id.as_deref(), Some(s.wo_id.as_str()));
    assert!(lp.consumed_at.is_some());

    // 物料行出账
    let material = f.material(&s.material_id);
    assert_eq!(material.consumed_qty, 100.0);
    assert_eq!(material.reserved_qty, 0.0);
}

#[test]
fn test_partial_consume_updates_lp_and_frees_it() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    let outcome = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap();

    assert!(!outcome.lp_depleted);
    assert_eq!(outcome.lp_qty_after, 50.0);

    // 余量 50, 无 pending 预留, 回到可用池
    let lp = f.lp(&s.lp_id);
    assert_eq!(lp.quantity, 50.0);
    assert_eq!(lp.status, LpStatus::Available);

    assert_eq!(outcome.consumption.status, ReservationStatus::Consumed);
    assert_eq!(f.material(&s.material_id).consumed_qty, 50.0);
}

#[test]
fn test_consume_twice_hits_idempotency_guard() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    f.api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap();

    let err = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::ReservationAlreadyConsumed { .. }));

    // 账目不重复出
    assert_eq!(f.material(&s.material_id).consumed_qty, 50.0);
    assert_eq!(f.lp(&s.lp_id).quantity, 50.0);
}

#[test]
fn test_consume_rejected_when_wo_paused() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    f.api
        .pause_work_order(&f.ctx, &s.wo_id, food_mes::PauseReason::Break, None)
        .unwrap();

    let err = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidStatus { status: WoStatus::Paused, .. }
    ));
}

#[test]
fn test_consume_rejected_before_start() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(100.0);
    let r = f
        .api
        .reserve_material(&f.ctx, &material_id, &lp_id, 50.0)
        .unwrap();

    let err = f
        .api
        .start_consumption(&f.ctx, &wo_id, &r.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidStatus { status: WoStatus::Released, .. }
    ));
}

#[test]
fn test_qty_exceeds_reserved_rejected() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    let err = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 60.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::QtyExceedsReserved {
            reserved_qty,
            requested_qty,
        } if reserved_qty == 50.0 && requested_qty == 60.0
    ));
}

#[test]
fn test_cross_org_consume_reports_not_found() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    let err = f
        .api
        .start_consumption(&f.other_org_ctx(), &s.wo_id, &s.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn test_released_reservation_cannot_be_consumed() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    f.api
        .release_reservation(&f.ctx, &s.reservation_id)
        .unwrap();

    // 已释放的预留等同不存在
    let err = f
        .api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn test_operator_can_consume_but_viewer_cannot() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);

    let viewer = f.ctx_with_role(food_mes::Role::Viewer);
    let err = f
        .api
        .start_consumption(&viewer, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }));

    let operator = f.ctx_with_role(food_mes::Role::Operator);
    f.api
        .start_consumption(&operator, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap();
}
