// ==========================================
// 食品制造执行系统 - 生产执行 API
// ==========================================
// 职责: 面向调用方的统一门面, 串起各引擎
// 红线: 变更操作先过角色-动作矩阵; org_id 一律取自调用上下文
// ==========================================

use crate::api::context::{is_allowed, Action, AuthContext};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::operation::WoOperation;
use crate::domain::reservation::{Consumption, Reservation};
use crate::domain::types::{PauseReason, WoStatus};
use crate::domain::work_order::{DowntimeSummary, PauseRecord, WoStatusHistory, WorkOrder};
use crate::engine::consumption::{ConsumeOutcome, ConsumptionEngine};
use crate::engine::pause::PauseTracker;
use crate::engine::reservation::ReservationManager;
use crate::engine::sequencer;
use crate::engine::state_machine::WorkOrderStateMachine;
use crate::repository::consumption_repo::ConsumptionRepository;
use crate::repository::operation_repo::WoOperationRepository;
use crate::repository::work_order_repo::WorkOrderRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct ProductionApi {
    conn: Arc<Mutex<Connection>>,
    state_machine: WorkOrderStateMachine,
    reservations: ReservationManager,
    consumption: ConsumptionEngine,
    pause_tracker: PauseTracker,
}

impl ProductionApi {
    /// 基于已有连接构造 (测试用内存库走这里)
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            state_machine: WorkOrderStateMachine::new(conn.clone()),
            reservations: ReservationManager::new(conn.clone()),
            consumption: ConsumptionEngine::new(conn.clone()),
            pause_tracker: PauseTracker::new(conn.clone()),
            conn,
        }
    }

    /// 打开数据库文件并初始化 schema
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path).map_err(|e| ApiError::Internal {
            detail: e.to_string(),
        })?;
        crate::db::init_schema(&conn).map_err(|e| ApiError::Internal {
            detail: e.to_string(),
        })?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn check_permission(&self, ctx: &AuthContext, action: Action) -> ApiResult<()> {
        if !is_allowed(ctx.role, action) {
            tracing::warn!(user_id = %ctx.user_id, role = ?ctx.role, %action, "权限拒绝");
            return Err(ApiError::Forbidden {
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// 工单不存在 (或跨组织) 时统一报未找到
    fn require_wo(&self, ctx: &AuthContext, wo_id: &str) -> ApiResult<WorkOrder> {
        let repo = WorkOrderRepository::new(self.conn.clone());
        repo.find_by_id(&ctx.org_id, wo_id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "工单".to_string(),
                id: wo_id.to_string(),
            })
    }

    // ===== 工单生命周期 =====

    /// 开工: released → in_progress
    pub fn start_work_order(&self, ctx: &AuthContext, wo_id: &str) -> ApiResult<WorkOrder> {
        self.check_permission(ctx, Action::StartWorkOrder)?;
        Ok(self.state_machine.start(&ctx.org_id, wo_id, &ctx.user_id)?)
    }

    /// 完工: in_progress → completed
    pub fn complete_work_order(&self, ctx: &AuthContext, wo_id: &str) -> ApiResult<WorkOrder> {
        self.check_permission(ctx, Action::CompleteWorkOrder)?;
        Ok(self
            .state_machine
            .complete(&ctx.org_id, wo_id, &ctx.user_id)?)
    }

    /// 协作路径状态迁移 (计划/下达/挂起/取消/关闭)
    pub fn transition_work_order(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
        to: WoStatus,
        notes: Option<&str>,
    ) -> ApiResult<WorkOrder> {
        self.check_permission(ctx, Action::TransitionWorkOrder)?;
        Ok(self
            .state_machine
            .transition(&ctx.org_id, wo_id, to, &ctx.user_id, notes)?)
    }

    /// 状态迁移历史 (时间正序)
    pub fn get_status_history(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
    ) -> ApiResult<Vec<WoStatusHistory>> {
        self.require_wo(ctx, wo_id)?;
        let repo = WorkOrderRepository::new(self.conn.clone());
        Ok(repo.list_status_history(&ctx.org_id, wo_id)?)
    }

    // ===== 预留 =====

    /// 预留物料到容器
    pub fn reserve_material(
        &self,
        ctx: &AuthContext,
        material_id: &str,
        lp_id: &str,
        qty: f64,
    ) -> ApiResult<Reservation> {
        self.check_permission(ctx, Action::ReserveMaterial)?;
        Ok(self
            .reservations
            .reserve(&ctx.org_id, material_id, lp_id, qty, &ctx.user_id)?)
    }

    /// 释放待消耗预留
    pub fn release_reservation(
        &self,
        ctx: &AuthContext,
        reservation_id: &str,
    ) -> ApiResult<Reservation> {
        self.check_permission(ctx, Action::ReleaseReservation)?;
        Ok(self.reservations.release(&ctx.org_id, reservation_id)?)
    }

    // ===== 消耗 =====

    /// 消耗预留 (四处变更同一事务)
    pub fn start_consumption(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
        reservation_id: &str,
        qty: f64,
    ) -> ApiResult<ConsumeOutcome> {
        self.check_permission(ctx, Action::ConsumeMaterial)?;
        Ok(self
            .consumption
            .consume(&ctx.org_id, wo_id, reservation_id, qty, &ctx.user_id)?)
    }

    /// 工单消耗记录 (最近在前)
    pub fn list_consumptions(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
    ) -> ApiResult<Vec<Consumption>> {
        self.require_wo(ctx, wo_id)?;
        let repo = ConsumptionRepository::new(self.conn.clone());
        Ok(repo.list_by_wo(&ctx.org_id, wo_id)?)
    }

    // ===== 暂停/恢复 =====

    /// 暂停工单
    pub fn pause_work_order(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
        reason: PauseReason,
        notes: Option<&str>,
    ) -> ApiResult<PauseRecord> {
        self.check_permission(ctx, Action::PauseWorkOrder)?;
        Ok(self
            .pause_tracker
            .pause(&ctx.org_id, wo_id, reason, notes, &ctx.user_id)?)
    }

    /// 恢复工单
    pub fn resume_work_order(&self, ctx: &AuthContext, wo_id: &str) -> ApiResult<PauseRecord> {
        self.check_permission(ctx, Action::ResumeWorkOrder)?;
        Ok(self.pause_tracker.resume(&ctx.org_id, wo_id, &ctx.user_id)?)
    }

    /// 暂停历史 (最近在前)
    pub fn get_pause_history(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
    ) -> ApiResult<Vec<PauseRecord>> {
        self.require_wo(ctx, wo_id)?;
        Ok(self.pause_tracker.get_pause_history(&ctx.org_id, wo_id)?)
    }

    /// 停机汇总
    pub fn get_downtime_summary(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
    ) -> ApiResult<DowntimeSummary> {
        self.require_wo(ctx, wo_id)?;
        Ok(self
            .pause_tracker
            .get_downtime_summary(&ctx.org_id, wo_id)?)
    }

    // ===== 工序顺序控制 =====

    /// 判定某道工序当前能否开工
    pub fn can_start_operation(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
        operation_id: &str,
        enforce_sequence: bool,
    ) -> ApiResult<bool> {
        let wo = self.require_wo(ctx, wo_id)?;
        let repo = WoOperationRepository::new(self.conn.clone());
        let all_ops = repo.list_by_wo(&ctx.org_id, wo_id)?;
        let op = all_ops
            .iter()
            .find(|o| o.operation_id == operation_id)
            .ok_or_else(|| ApiError::NotFound {
                entity: "工序".to_string(),
                id: operation_id.to_string(),
            })?;
        Ok(sequencer::can_start(wo.status, op, &all_ops, enforce_sequence))
    }

    /// 工单全部工序 (顺序号升序)
    pub fn list_operations(
        &self,
        ctx: &AuthContext,
        wo_id: &str,
    ) -> ApiResult<Vec<WoOperation>> {
        self.require_wo(ctx, wo_id)?;
        let repo = WoOperationRepository::new(self.conn.clone());
        Ok(repo.list_by_wo(&ctx.org_id, wo_id)?)
    }
}
