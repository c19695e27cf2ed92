// ==========================================
// 食品制造执行系统 - 工单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: 状态翻转一律条件更新 (WHERE 前态匹配), 并发败者 0 行
// ==========================================

use crate::domain::types::{PauseReason, WoStatus};
use crate::domain::work_order::{WoStatusHistory, WorkOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts, parse_ts_opt};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLS: &str = "wo_id, org_id, wo_number, product_id, status, pause_reason, \
                           paused_at, paused_by, started_at, completed_at, \
                           created_by, created_at, updated_at";

pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入工单
    pub fn insert(&self, wo: &WorkOrder) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO work_orders (
                wo_id, org_id, wo_number, product_id, status, pause_reason,
                paused_at, paused_by, started_at, completed_at,
                created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &wo.wo_id,
                &wo.org_id,
                &wo.wo_number,
                &wo.product_id,
                wo.status.to_db_str(),
                wo.pause_reason.map(|r| r.to_db_str()),
                wo.paused_at.as_ref().map(fmt_ts),
                &wo.paused_by,
                wo.started_at.as_ref().map(fmt_ts),
                wo.completed_at.as_ref().map(fmt_ts),
                &wo.created_by,
                fmt_ts(&wo.created_at),
                fmt_ts(&wo.updated_at),
            ],
        )?;

        Ok(wo.wo_id.clone())
    }

    /// 按 wo_id 查询工单 (组织隔离: 跨组织等同不存在)
    pub fn find_by_id(&self, org_id: &str, wo_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx_inner(&conn, org_id, wo_id)
    }

    /// 事务内查询工单
    pub fn find_by_id_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
    ) -> RepositoryResult<Option<WorkOrder>> {
        Self::find_by_id_tx_inner(tx, org_id, wo_id)
    }

    fn find_by_id_tx_inner(
        conn: &Connection,
        org_id: &str,
        wo_id: &str,
    ) -> RepositoryResult<Option<WorkOrder>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM work_orders WHERE wo_id = ? AND org_id = ?"
        );
        match conn.query_row(&sql, params![wo_id, org_id], Self::map_row) {
            Ok(wo) => Ok(Some(wo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 条件状态翻转: 仅当前态等于 expected 时成功
    ///
    /// # 返回
    /// - Ok(true): 翻转成功
    /// - Ok(false): 0 行受影响 (前态不匹配, 并发败者)
    pub fn transition_status_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        expected: WoStatus,
        to: WoStatus,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE work_orders
               SET status = ?, updated_at = ?
               WHERE wo_id = ? AND org_id = ? AND status = ?"#,
            params![
                to.to_db_str(),
                fmt_ts(now),
                wo_id,
                org_id,
                expected.to_db_str()
            ],
        )?;
        Ok(rows == 1)
    }

    /// 条件翻转为 paused, 并记录暂停上下文
    pub fn mark_paused_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        reason: PauseReason,
        actor: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE work_orders
               SET status = 'PAUSED', pause_reason = ?, paused_at = ?, paused_by = ?,
                   updated_at = ?
               WHERE wo_id = ? AND org_id = ? AND status = 'IN_PROGRESS'"#,
            params![reason.to_db_str(), fmt_ts(now), actor, fmt_ts(now), wo_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 条件翻转回 in_progress, 并清空暂停上下文
    pub fn mark_resumed_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE work_orders
               SET status = 'IN_PROGRESS', pause_reason = NULL, paused_at = NULL,
                   paused_by = NULL, updated_at = ?
               WHERE wo_id = ? AND org_id = ? AND status = 'PAUSED'"#,
            params![fmt_ts(now), wo_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 条件翻转为 in_progress 并记录开工时间
    pub fn mark_started_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE work_orders
               SET status = 'IN_PROGRESS', started_at = ?, updated_at = ?
               WHERE wo_id = ? AND org_id = ? AND status = 'RELEASED'"#,
            params![fmt_ts(now), fmt_ts(now), wo_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 条件翻转为 completed 并记录完工时间
    pub fn mark_completed_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE work_orders
               SET status = 'COMPLETED', completed_at = ?, updated_at = ?
               WHERE wo_id = ? AND org_id = ? AND status = 'IN_PROGRESS'"#,
            params![fmt_ts(now), fmt_ts(now), wo_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 追加状态迁移审计行 (与状态翻转同事务)
    pub fn append_status_history_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        from: Option<WoStatus>,
        to: WoStatus,
        actor: &str,
        now: &NaiveDateTime,
        notes: Option<&str>,
    ) -> RepositoryResult<String> {
        let history_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"INSERT INTO wo_status_history (
                history_id, org_id, wo_id, from_status, to_status,
                changed_by, changed_at, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &history_id,
                org_id,
                wo_id,
                from.map(|s| s.to_db_str()),
                to.to_db_str(),
                actor,
                fmt_ts(now),
                notes,
            ],
        )?;
        Ok(history_id)
    }

    /// 查询工单状态迁移历史 (时间正序)
    pub fn list_status_history(
        &self,
        org_id: &str,
        wo_id: &str,
    ) -> RepositoryResult<Vec<WoStatusHistory>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT history_id, org_id, wo_id, from_status, to_status,
                      changed_by, changed_at, notes
               FROM wo_status_history
               WHERE wo_id = ? AND org_id = ?
               ORDER BY changed_at ASC, rowid ASC"#,
        )?;

        let rows = stmt
            .query_map(params![wo_id, org_id], |row| {
                Ok(WoStatusHistory {
                    history_id: row.get(0)?,
                    org_id: row.get(1)?,
                    wo_id: row.get(2)?,
                    from_status: row
                        .get::<_, Option<String>>(3)?
                        .map(|s| WoStatus::from_str(&s)),
                    to_status: WoStatus::from_str(&row.get::<_, String>(4)?),
                    changed_by: row.get(5)?,
                    changed_at: parse_ts(6, row.get(6)?)?,
                    notes: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// 映射数据库行到 WorkOrder
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkOrder> {
        Ok(WorkOrder {
            wo_id: row.get(0)?,
            org_id: row.get(1)?,
            wo_number: row.get(2)?,
            product_id: row.get(3)?,
            status: WoStatus::from_str(&row.get::<_, String>(4)?),
            pause_reason: row
                .get::<_, Option<String>>(5)?
                .map(|s| PauseReason::from_str(&s)),
            paused_at: parse_ts_opt(6, row.get(6)?)?,
            paused_by: row.get(7)?,
            started_at: parse_ts_opt(8, row.get(8)?)?,
            completed_at: parse_ts_opt(9, row.get(9)?)?,
            created_by: row.get(10)?,
            created_at: parse_ts(11, row.get(11)?)?,
            updated_at: parse_ts(12, row.get(12)?)?,
        })
    }
}
