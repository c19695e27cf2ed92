// ==========================================
// 食品制造执行系统 - 工单状态机
// ==========================================
// 职责: 工单生命周期合法迁移表 + 执行核心驱动的迁移
// (released→in_progress, in_progress→completed)
// 暂停/恢复由 PauseTracker 驱动, 其余状态由外部协作方设置
// 红线: 状态翻转一律条件更新, 翻转与审计行同事务
// ==========================================

use crate::domain::types::WoStatus;
use crate::domain::work_order::WorkOrder;
use crate::engine::error::{ExecutionError, ExecutionResult};
use crate::repository::error::RepositoryError;
use crate::repository::work_order_repo::WorkOrderRepository;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 合法迁移表 (完整生命周期)
///
/// draft → planned/cancelled
/// planned → released/draft/cancelled
/// released → in_progress/cancelled
/// in_progress → paused/on_hold/completed
/// paused → in_progress
/// on_hold → in_progress/cancelled
/// completed → closed
/// closed, cancelled → 终态
pub fn can_transition(from: WoStatus, to: WoStatus) -> bool {
    use WoStatus::*;
    matches!(
        (from, to),
        (Draft, Planned)
            | (Draft, Cancelled)
            | (Planned, Released)
            | (Planned, Draft)
            | (Planned, Cancelled)
            | (Released, InProgress)
            | (Released, Cancelled)
            | (InProgress, Paused)
            | (InProgress, OnHold)
            | (InProgress, Completed)
            | (Paused, InProgress)
            | (OnHold, InProgress)
            | (OnHold, Cancelled)
            | (Completed, Closed)
    )
}

// ==========================================
// WorkOrderStateMachine - 状态机服务
// ==========================================
pub struct WorkOrderStateMachine {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderStateMachine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ExecutionResult<std::sync::MutexGuard<Connection>> {
        Ok(self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?)
    }

    /// 开工: released → in_progress
    pub fn start(&self, org_id: &str, wo_id: &str, actor: &str) -> ExecutionResult<WorkOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        if !can_transition(wo.status, WoStatus::InProgress) || wo.status != WoStatus::Released {
            return Err(ExecutionError::InvalidTransition {
                from: wo.status,
                to: WoStatus::InProgress,
            });
        }

        // 条件翻转: 并发败者按当前状态非法处理
        if !WorkOrderRepository::mark_started_tx(&tx, org_id, wo_id, &now)? {
            return Err(ExecutionError::InvalidStatus {
                wo_id: wo_id.to_string(),
                status: wo.status,
            });
        }

        WorkOrderRepository::append_status_history_tx(
            &tx,
            org_id,
            wo_id,
            Some(wo.status),
            WoStatus::InProgress,
            actor,
            &now,
            None,
        )?;

        let updated = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(wo_id, actor, "工单开工: RELEASED -> IN_PROGRESS");
        Ok(updated)
    }

    /// 通用迁移: 计划/下达/挂起/取消/关闭等协作路径
    ///
    /// 开工/完工/暂停/恢复有专用入口 (带各自的时间戳与区间记账),
    /// 不经由这里
    pub fn transition(
        &self,
        org_id: &str,
        wo_id: &str,
        to: WoStatus,
        actor: &str,
        notes: Option<&str>,
    ) -> ExecutionResult<WorkOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        let reserved_path = matches!(
            to,
            WoStatus::InProgress | WoStatus::Completed | WoStatus::Paused
        );
        if reserved_path || !can_transition(wo.status, to) {
            return Err(ExecutionError::InvalidTransition {
                from: wo.status,
                to,
            });
        }

        if !WorkOrderRepository::transition_status_tx(&tx, org_id, wo_id, wo.status, to, &now)? {
            return Err(ExecutionError::InvalidStatus {
                wo_id: wo_id.to_string(),
                status: wo.status,
            });
        }

        WorkOrderRepository::append_status_history_tx(
            &tx,
            org_id,
            wo_id,
            Some(wo.status),
            to,
            actor,
            &now,
            notes,
        )?;

        let updated = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(wo_id, from = %wo.status, to = %to, actor, "工单状态迁移");
        Ok(updated)
    }

    /// 完工: in_progress → completed
    pub fn complete(&self, org_id: &str, wo_id: &str, actor: &str) -> ExecutionResult<WorkOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        if wo.status != WoStatus::InProgress {
            return Err(ExecutionError::InvalidTransition {
                from: wo.status,
                to: WoStatus::Completed,
            });
        }

        if !WorkOrderRepository::mark_completed_tx(&tx, org_id, wo_id, &now)? {
            return Err(ExecutionError::InvalidStatus {
                wo_id: wo_id.to_string(),
                status: wo.status,
            });
        }

        WorkOrderRepository::append_status_history_tx(
            &tx,
            org_id,
            wo_id,
            Some(wo.status),
            WoStatus::Completed,
            actor,
            &now,
            None,
        )?;

        let updated = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(wo_id, actor, "工单完工: IN_PROGRESS -> COMPLETED");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_core_path() {
        use WoStatus::*;
        // 执行核心关心的主路径
        assert!(can_transition(Released, InProgress));
        assert!(can_transition(InProgress, Paused));
        assert!(can_transition(Paused, InProgress));
        assert!(can_transition(InProgress, Completed));
        assert!(can_transition(Completed, Closed));
    }

    #[test]
    fn test_transition_table_rejects_illegal() {
        use WoStatus::*;
        assert!(!can_transition(Draft, InProgress));
        assert!(!can_transition(Paused, Completed));
        assert!(!can_transition(Completed, InProgress));
        assert!(!can_transition(Closed, Draft));
        assert!(!can_transition(Cancelled, Planned));
        // 自迁移不合法
        assert!(!can_transition(InProgress, InProgress));
    }
}
