// ==========================================
// 食品制造执行系统 - 预留管理器
// ==========================================
// 职责: 把容器 (或其部分数量) 锁定给工单物料行, 供后续消耗
// 红线: 预留数量不得超过容器净可用数量 (当前数量 - 已有 pending 预留)
// ==========================================

use crate::domain::reservation::Reservation;
use crate::domain::types::{LpStatus, ReservationStatus};
use crate::engine::error::{ExecutionError, ExecutionResult};
use crate::repository::error::RepositoryError;
use crate::repository::license_plate_repo::LicensePlateRepository;
use crate::repository::material_repo::WoMaterialRepository;
use crate::repository::reservation_repo::ReservationRepository;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct ReservationManager {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ExecutionResult<std::sync::MutexGuard<Connection>> {
        Ok(self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?)
    }

    /// 预留: 在同一事务内校验净可用数量并落三处变更
    /// (预留行 + 物料行 reserved_qty + 容器状态)
    pub fn reserve(
        &self,
        org_id: &str,
        material_id: &str,
        lp_id: &str,
        qty: f64,
        actor: &str,
    ) -> ExecutionResult<Reservation> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let material = WoMaterialRepository::find_by_id_tx(&tx, org_id, material_id)?
            .ok_or_else(|| ExecutionError::MaterialNotFound {
                material_id: material_id.to_string(),
            })?;

        let lp = LicensePlateRepository::find_by_id_tx(&tx, org_id, lp_id)?.ok_or_else(|| {
            ExecutionError::LpNotFound {
                lp_id: lp_id.to_string(),
            }
        })?;

        if !lp.is_usable() {
            return Err(ExecutionError::LpNotAvailable {
                lp_id: lp_id.to_string(),
                status: lp.status,
            });
        }
        if lp.product_id != material.product_id {
            return Err(ExecutionError::ProductMismatch {
                lp_product_id: lp.product_id,
                material_product_id: material.product_id,
            });
        }
        if lp.uom != material.uom {
            return Err(ExecutionError::UomMismatch {
                lp_uom: lp.uom,
                material_uom: material.uom,
            });
        }

        // 净可用 = 当前数量 - 该容器上全部 pending 预留
        let pending = ReservationRepository::sum_pending_on_lp_tx(&tx, org_id, lp_id)?;
        let available = lp.quantity - pending;
        if qty > available + crate::QTY_EPSILON {
            return Err(ExecutionError::InsufficientLpQuantity {
                lp_qty: available,
                requested_qty: qty,
            });
        }

        let reservation = Reservation {
            reservation_id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            material_id: material_id.to_string(),
            lp_id: lp_id.to_string(),
            reserved_qty: qty,
            uom: material.uom.clone(),
            status: ReservationStatus::Pending,
            reserved_by: actor.to_string(),
            reserved_at: now,
            consumed_at: None,
        };

        // 唯一索引兜底: 同一 (material, lp) 已有 pending 时报业务错误
        match ReservationRepository::insert_tx(&tx, &reservation) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ExecutionError::DuplicateReservation {
                    material_id: material_id.to_string(),
                    lp_id: lp_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        WoMaterialRepository::add_reserved_qty_tx(&tx, org_id, material_id, qty)?;

        // 首次预留时容器 available → reserved (已是 reserved 则 0 行, 无妨)
        LicensePlateRepository::set_status_tx(
            &tx,
            org_id,
            lp_id,
            LpStatus::Available,
            LpStatus::Reserved,
        )?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(
            reservation_id = %reservation.reservation_id,
            material_id,
            lp_id,
            qty,
            actor,
            "创建预留"
        );
        Ok(reservation)
    }

    /// 释放: 仅 pending 可释放; 无剩余 pending 时容器回到 available
    pub fn release(&self, org_id: &str, reservation_id: &str) -> ExecutionResult<Reservation> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;

        let reservation = ReservationRepository::find_by_id_tx(&tx, org_id, reservation_id)?
            .ok_or_else(|| ExecutionError::ReservationNotFound {
                reservation_id: reservation_id.to_string(),
            })?;

        match reservation.status {
            ReservationStatus::Pending => {}
            ReservationStatus::Consumed => {
                return Err(ExecutionError::ReservationAlreadyConsumed {
                    reservation_id: reservation_id.to_string(),
                });
            }
            // 已释放的预留等同不存在
            ReservationStatus::Released => {
                return Err(ExecutionError::ReservationNotFound {
                    reservation_id: reservation_id.to_string(),
                });
            }
        }

        // 条件翻转: 并发败者报已消耗 (pending 只会被消耗或释放抢走)
        if !ReservationRepository::mark_released_tx(&tx, org_id, reservation_id)? {
            return Err(ExecutionError::ReservationAlreadyConsumed {
                reservation_id: reservation_id.to_string(),
            });
        }

        WoMaterialRepository::add_reserved_qty_tx(
            &tx,
            org_id,
            &reservation.material_id,
            -reservation.reserved_qty,
        )?;

        // 无剩余 pending 预留时, 容器 reserved → available
        let remaining =
            ReservationRepository::count_pending_on_lp_tx(&tx, org_id, &reservation.lp_id)?;
        if remaining == 0 {
            LicensePlateRepository::set_status_tx(
                &tx,
                org_id,
                &reservation.lp_id,
                LpStatus::Reserved,
                LpStatus::Available,
            )?;
        }

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(reservation_id, lp_id = %reservation.lp_id, "释放预留");

        Ok(Reservation {
            status: ReservationStatus::Released,
            ..reservation
        })
    }
}
