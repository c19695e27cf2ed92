// ==========================================
// 预留管理器集成测试
// ==========================================

mod test_helpers;

use food_mes::{ApiError, LpStatus, ReservationStatus, WoStatus};
use test_helpers::Fixture;

#[test]
fn test_reserve_flips_lp_and_books_material() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    let r = f
        .api
        .reserve_material(&f.ctx, &material_id, &lp_id, 60.0)
        .unwrap();
    assert_eq!(r.status, ReservationStatus::Pending);
    assert_eq!(r.reserved_qty, 60.0);
    assert_eq!(r.uom, "kg");

    assert_eq!(f.lp(&lp_id).status, LpStatus::Reserved);
    assert_eq!(f.material(&material_id).reserved_qty, 60.0);
}

#[test]
fn test_reserve_beyond_net_available_rejected() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_a = f.seed_material(&wo_id, 100.0, false);
    let material_b = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    f.api
        .reserve_material(&f.ctx, &material_a, &lp_id, 60.0)
        .unwrap();

    // 净可用只剩 20, 请求 30 被拒
    let err = f
        .api
        .reserve_material(&f.ctx, &material_b, &lp_id, 30.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InsufficientLpQuantity { lp_qty, requested_qty }
            if lp_qty == 20.0 && requested_qty == 30.0
    ));
}

#[test]
fn test_duplicate_pending_reservation_rejected() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    f.api
        .reserve_material(&f.ctx, &material_id, &lp_id, 20.0)
        .unwrap();
    let err = f
        .api
        .reserve_material(&f.ctx, &material_id, &lp_id, 20.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateReservation { .. }));
}

#[test]
fn test_product_and_uom_mismatch_rejected() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);

    let wrong_product = f.seed_lp_with("prod-sugar", "kg", 50.0);
    let err = f
        .api
        .reserve_material(&f.ctx, &material_id, &wrong_product, 10.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::ProductMismatch { .. }));

    let wrong_uom = f.seed_lp_with(test_helpers::PRODUCT, "L", 50.0);
    let err = f
        .api
        .reserve_material(&f.ctx, &material_id, &wrong_uom, 10.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::UomMismatch { .. }));
}

#[test]
fn test_release_returns_lp_to_available() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    let r = f
        .api
        .reserve_material(&f.ctx, &material_id, &lp_id, 60.0)
        .unwrap();
    let released = f
        .api
        .release_reservation(&f.ctx, &r.reservation_id)
        .unwrap();
    assert_eq!(released.status, ReservationStatus::Released);

    assert_eq!(f.lp(&lp_id).status, LpStatus::Available);
    assert_eq!(f.lp(&lp_id).quantity, 80.0); // 释放不动数量
    assert_eq!(f.material(&material_id).reserved_qty, 0.0);
}

#[test]
fn test_release_keeps_lp_reserved_while_other_pending_exists() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_a = f.seed_material(&wo_id, 100.0, false);
    let material_b = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    let r1 = f
        .api
        .reserve_material(&f.ctx, &material_a, &lp_id, 30.0)
        .unwrap();
    f.api
        .reserve_material(&f.ctx, &material_b, &lp_id, 30.0)
        .unwrap();

    f.api
        .release_reservation(&f.ctx, &r1.reservation_id)
        .unwrap();
    // 另一条 pending 还在, 容器保持 reserved
    assert_eq!(f.lp(&lp_id).status, LpStatus::Reserved);
}

#[test]
fn test_release_consumed_reservation_rejected() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 50.0, false);
    f.api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 50.0)
        .unwrap();

    let err = f
        .api
        .release_reservation(&f.ctx, &s.reservation_id)
        .unwrap_err();
    assert!(matches!(err, ApiError::ReservationAlreadyConsumed { .. }));
}

#[test]
fn test_cross_org_reserve_not_found() {
    let f = Fixture::new();
    let wo_id = f.seed_work_order(WoStatus::Released);
    let material_id = f.seed_material(&wo_id, 100.0, false);
    let lp_id = f.seed_lp(80.0);

    let err = f
        .api
        .reserve_material(&f.other_org_ctx(), &material_id, &lp_id, 10.0)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn test_reserve_on_consumed_lp_rejected() {
    let f = Fixture::new();
    let s = f.seed_running_scenario(100.0, 100.0, 100.0, false);
    f.api
        .start_consumption(&f.ctx, &s.wo_id, &s.reservation_id, 100.0)
        .unwrap();

    // 容器已耗尽进终态
    let material_id = f.seed_material(&s.wo_id, 50.0, false);
    let err = f
        .api
        .reserve_material(&f.ctx, &material_id, &s.lp_id, 10.0)
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::LpNotAvailable { status: LpStatus::Consumed, .. }
    ));
}
