// ==========================================
// 食品制造执行系统 - 消耗引擎
// ==========================================
// 职责: 把一条 pending 预留兑现为消耗, 四处变更同一事务落库:
//       消耗记录 + 预留翻转 + 物料行累加 + 容器扣减/台账
// 红线: 任一前置校验失败即整体回滚, 不留半截状态
// 红线: Engine 不拼 SQL, 只经由仓储事务函数编排
// ==========================================

use crate::domain::reservation::Consumption;
use crate::domain::types::{LpStatus, ReservationStatus, WoStatus};
use crate::engine::error::{ExecutionError, ExecutionResult};
use crate::repository::consumption_repo::ConsumptionRepository;
use crate::repository::error::RepositoryError;
use crate::repository::license_plate_repo::LicensePlateRepository;
use crate::repository::material_repo::WoMaterialRepository;
use crate::repository::reservation_repo::ReservationRepository;
use crate::repository::work_order_repo::WorkOrderRepository;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 一次消耗的结果快照
#[derive(Debug, Clone)]
pub struct ConsumeOutcome {
    pub consumption: Consumption,
    pub variance_pct: f64,     // 累计消耗相对需求的差异百分比 (信息性)
    pub lp_qty_after: f64,     // 消耗后容器余量
    pub lp_depleted: bool,     // 容器是否耗尽转终态
}

pub struct ConsumptionEngine {
    conn: Arc<Mutex<Connection>>,
}

impl ConsumptionEngine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ExecutionResult<std::sync::MutexGuard<Connection>> {
        Ok(self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?)
    }

    /// 消耗预留
    ///
    /// 前置校验顺序: 工单状态 → 预留归属/状态 → 物料行与容器
    /// → 整托策略 → 数量上限。全部通过后四处变更一次提交。
    pub fn consume(
        &self,
        org_id: &str,
        wo_id: &str,
        reservation_id: &str,
        qty: f64,
        actor: &str,
    ) -> ExecutionResult<ConsumeOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        // 1. 工单必须执行中
        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;
        if wo.status != WoStatus::InProgress {
            return Err(ExecutionError::InvalidStatus {
                wo_id: wo_id.to_string(),
                status: wo.status,
            });
        }

        // 2. 预留存在且归属本工单; released 视同不存在
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
            ReservationStatus::Released => {
                return Err(ExecutionError::ReservationNotFound {
                    reservation_id: reservation_id.to_string(),
                });
            }
        }

        let material =
            WoMaterialRepository::find_by_id_tx(&tx, org_id, &reservation.material_id)?
                .ok_or_else(|| ExecutionError::MaterialNotFound {
                    material_id: reservation.material_id.clone(),
                })?;
        if material.wo_id != wo_id {
            // 预留挂在别的工单物料行上, 对本工单视同不存在
            return Err(ExecutionError::ReservationNotFound {
                reservation_id: reservation_id.to_string(),
            });
        }

        // 3. 容器存在且未进终态
        let lp = LicensePlateRepository::find_by_id_tx(&tx, org_id, &reservation.lp_id)?
            .ok_or_else(|| ExecutionError::LpNotFound {
                lp_id: reservation.lp_id.clone(),
            })?;
        if lp.is_terminal() {
            return Err(ExecutionError::LpNotAvailable {
                lp_id: lp.lp_id.clone(),
                status: lp.status,
            });
        }

        // 4. 整托策略: 请求量必须等于容器当前全量 (容差内)
        if material.consume_whole_lp && (qty - lp.quantity).abs() > crate::QTY_EPSILON {
            return Err(ExecutionError::WholeLpRequired {
                required_qty: lp.quantity,
                requested_qty: qty,
            });
        }

        // 5. 数量上限: 不超预留, 不超容器余量
        if qty > reservation.reserved_qty + crate::QTY_EPSILON {
            return Err(ExecutionError::QtyExceedsReserved {
                reserved_qty: reservation.reserved_qty,
                requested_qty: qty,
            });
        }
        if qty > lp.quantity + crate::QTY_EPSILON {
            return Err(ExecutionError::InsufficientLpQuantity {
                lp_qty: lp.quantity,
                requested_qty: qty,
            });
        }

        // ===== 四处变更, 同一事务 =====
        let consumption = Consumption {
            consumption_id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            wo_id: wo_id.to_string(),
            material_id: reservation.material_id.clone(),
            reservation_id: reservation_id.to_string(),
            lp_id: reservation.lp_id.clone(),
            consumed_qty: qty,
            uom: reservation.uom.clone(),
            status: ReservationStatus::Consumed,
            consumed_by: actor.to_string(),
            consumed_at: now,
        };
        ConsumptionRepository::insert_tx(&tx, &consumption)?;

        // 条件翻转, 并发败者在此落网
        if !ReservationRepository::mark_consumed_tx(&tx, org_id, reservation_id, &now)? {
            return Err(ExecutionError::ReservationAlreadyConsumed {
                reservation_id: reservation_id.to_string(),
            });
        }

        WoMaterialRepository::add_consumed_qty_tx(&tx, org_id, &reservation.material_id, qty)?;
        // 预留兑现后整条出账, 即使只消耗了其中一部分
        WoMaterialRepository::add_reserved_qty_tx(
            &tx,
            org_id,
            &reservation.material_id,
            -reservation.reserved_qty,
        )?;

        let debit = LicensePlateRepository::debit_for_consumption_tx(
            &tx,
            org_id,
            &reservation.lp_id,
            lp.quantity,
            qty,
            wo_id,
            &consumption.consumption_id,
            reservation_id,
            actor,
            &now,
        )?;

        // 未耗尽且已无 pending 预留时, 容器回到可用池
        if !debit.depleted
            && ReservationRepository::count_pending_on_lp_tx(&tx, org_id, &reservation.lp_id)? == 0
        {
            LicensePlateRepository::set_status_tx(
                &tx,
                org_id,
                &reservation.lp_id,
                LpStatus::Reserved,
                LpStatus::Available,
            )?;
        }

        let variance_pct = material.variance_pct(material.consumed_qty + qty);

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(
            consumption_id = %consumption.consumption_id,
            wo_id,
            reservation_id,
            lp_id = %reservation.lp_id,
            qty,
            lp_qty_after = debit.qty_after,
            lp_depleted = debit.depleted,
            variance_pct,
            actor,
            "消耗预留入账"
        );

        Ok(ConsumeOutcome {
            consumption,
            variance_pct,
            lp_qty_after: debit.qty_after,
            lp_depleted: debit.depleted,
        })
    }
}
