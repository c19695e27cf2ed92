// ==========================================
// 食品制造执行系统 - 暂停/恢复追踪器
// ==========================================
// 职责: in_progress ↔ paused 往返迁移 + 暂停区间记账 + 停机汇总
// 红线: 工单状态翻转 / 区间行 / 审计行必须同一事务;
//       暂停中的工单拒绝消耗 (由消耗引擎的状态校验兜住)
// ==========================================

use crate::domain::types::{PauseReason, WoStatus};
use crate::domain::work_order::{DowntimeSummary, PauseRecord};
use crate::engine::error::{ExecutionError, ExecutionResult};
use crate::repository::error::RepositoryError;
use crate::repository::pause_repo::PauseRepository;
use crate::repository::work_order_repo::WorkOrderRepository;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct PauseTracker {
    conn: Arc<Mutex<Connection>>,
}

impl PauseTracker {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ExecutionResult<std::sync::MutexGuard<Connection>> {
        Ok(self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?)
    }

    /// 暂停: in_progress → paused, 开启暂停区间
    pub fn pause(
        &self,
        org_id: &str,
        wo_id: &str,
        reason: PauseReason,
        notes: Option<&str>,
        actor: &str,
    ) -> ExecutionResult<PauseRecord> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        match wo.status {
            WoStatus::InProgress => {}
            // 重复暂停给精确提示
            WoStatus::Paused => {
                return Err(ExecutionError::AlreadyPaused {
                    wo_id: wo_id.to_string(),
                });
            }
            other => {
                return Err(ExecutionError::InvalidStatus {
                    wo_id: wo_id.to_string(),
                    status: other,
                });
            }
        }

        if !WorkOrderRepository::mark_paused_tx(&tx, org_id, wo_id, reason, actor, &now)? {
            // 条件更新落空: 并发方已先行暂停
            return Err(ExecutionError::AlreadyPaused {
                wo_id: wo_id.to_string(),
            });
        }

        let record = PauseRecord {
            pause_id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            wo_id: wo_id.to_string(),
            paused_at: now,
            resumed_at: None,
            duration_minutes: None,
            reason,
            notes: notes.map(str::to_string),
            paused_by: actor.to_string(),
            resumed_by: None,
        };
        PauseRepository::open_tx(&tx, &record)?;

        WorkOrderRepository::append_status_history_tx(
            &tx,
            org_id,
            wo_id,
            Some(WoStatus::InProgress),
            WoStatus::Paused,
            actor,
            &now,
            notes,
        )?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(wo_id, reason = %reason, actor, "工单暂停");
        Ok(record)
    }

    /// 恢复: paused → in_progress, 关闭区间并结算停机时长
    pub fn resume(&self, org_id: &str, wo_id: &str, actor: &str) -> ExecutionResult<PauseRecord> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        let now = Utc::now().naive_utc();

        let wo = WorkOrderRepository::find_by_id_tx(&tx, org_id, wo_id)?.ok_or_else(|| {
            ExecutionError::WoNotFound {
                wo_id: wo_id.to_string(),
            }
        })?;

        if wo.status != WoStatus::Paused {
            return Err(ExecutionError::NotPaused {
                wo_id: wo_id.to_string(),
            });
        }

        if !WorkOrderRepository::mark_resumed_tx(&tx, org_id, wo_id, &now)? {
            return Err(ExecutionError::NotPaused {
                wo_id: wo_id.to_string(),
            });
        }

        // 时长以工单上的 paused_at 为准, 四舍五入到分钟
        let paused_at = wo.paused_at.unwrap_or(now);
        let duration_minutes =
            ((now - paused_at).num_seconds() as f64 / 60.0).round() as i64;

        let pause_id =
            PauseRepository::close_open_tx(&tx, org_id, wo_id, actor, &now, duration_minutes)?
                .ok_or_else(|| {
                    // 状态是 paused 却没有开着的区间, 数据不一致
                    RepositoryError::InternalError(format!(
                        "工单 {wo_id} 处于暂停状态但无未恢复的暂停区间"
                    ))
                })?;

        WorkOrderRepository::append_status_history_tx(
            &tx,
            org_id,
            wo_id,
            Some(WoStatus::Paused),
            WoStatus::InProgress,
            actor,
            &now,
            None,
        )?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(wo_id, pause_id = %pause_id, duration_minutes, actor, "工单恢复");

        Ok(PauseRecord {
            pause_id,
            org_id: org_id.to_string(),
            wo_id: wo_id.to_string(),
            paused_at,
            resumed_at: Some(now),
            duration_minutes: Some(duration_minutes),
            reason: wo.pause_reason.unwrap_or(PauseReason::Other),
            notes: None,
            paused_by: wo.paused_by.unwrap_or_default(),
            resumed_by: Some(actor.to_string()),
        })
    }

    /// 暂停历史 (最近在前)
    pub fn get_pause_history(
        &self,
        org_id: &str,
        wo_id: &str,
    ) -> ExecutionResult<Vec<PauseRecord>> {
        let repo = PauseRepository::new(self.conn.clone());
        Ok(repo.list_by_wo(org_id, wo_id)?)
    }

    /// 停机汇总 (只计已关闭区间)
    pub fn get_downtime_summary(
        &self,
        org_id: &str,
        wo_id: &str,
    ) -> ExecutionResult<DowntimeSummary> {
        let repo = PauseRepository::new(self.conn.clone());
        Ok(repo.downtime_summary(org_id, wo_id)?)
    }
}
