// ==========================================
// 食品制造执行系统 - 暂停区间仓储
// ==========================================
// 约束: 同一工单至多一条 resumed_at IS NULL 的记录,
//       关闭时以 "resumed_at IS NULL" 做条件更新守卫
// ==========================================

use crate::domain::types::PauseReason;
use crate::domain::work_order::{DowntimeSummary, PauseRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts, parse_ts_opt};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLS: &str = "pause_id, org_id, wo_id, paused_at, resumed_at, duration_minutes, \
                           reason, notes, paused_by, resumed_by";

pub struct PauseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PauseRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 开启暂停区间 (事务内, resumed_at 为 NULL)
    pub fn open_tx(tx: &Transaction, record: &PauseRecord) -> RepositoryResult<String> {
        tx.execute(
            r#"INSERT INTO wo_pauses (
                pause_id, org_id, wo_id, paused_at, resumed_at, duration_minutes,
                reason, notes, paused_by, resumed_by
            ) VALUES (?, ?, ?, ?, NULL, NULL, ?, ?, ?, NULL)"#,
            params![
                &record.pause_id,
                &record.org_id,
                &record.wo_id,
                fmt_ts(&record.paused_at),
                record.reason.to_db_str(),
                &record.notes,
                &record.paused_by,
            ],
        )?;
        Ok(record.pause_id.clone())
    }

    /// 关闭唯一的未恢复区间 (事务内)
    ///
    /// # 返回
    /// - Ok(Some(pause_id)): 关闭成功
    /// - Ok(None): 无未恢复区间 (数据异常或并发败者)
    pub fn close_open_tx(
        tx: &Transaction,
        org_id: &str,
        wo_id: &str,
        resumed_by: &str,
        resumed_at: &NaiveDateTime,
        duration_minutes: i64,
    ) -> RepositoryResult<Option<String>> {
        // 先取开着的区间 id, 便于返回给调用方
        let pause_id: Option<String> = match tx.query_row(
            "SELECT pause_id FROM wo_pauses \
             WHERE wo_id = ? AND org_id = ? AND resumed_at IS NULL",
            params![wo_id, org_id],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let Some(pause_id) = pause_id else {
            return Ok(None);
        };

        let rows = tx.execute(
            r#"UPDATE wo_pauses
               SET resumed_at = ?, duration_minutes = ?, resumed_by = ?
               WHERE pause_id = ? AND resumed_at IS NULL"#,
            params![fmt_ts(resumed_at), duration_minutes, resumed_by, &pause_id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        Ok(Some(pause_id))
    }

    /// 按 pause_id 查询
    pub fn find_by_id(&self, org_id: &str, pause_id: &str) -> RepositoryResult<Option<PauseRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_pauses WHERE pause_id = ? AND org_id = ?"
        );
        match conn.query_row(&sql, params![pause_id, org_id], Self::map_row) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询工单暂停历史 (最近在前)
    pub fn list_by_wo(&self, org_id: &str, wo_id: &str) -> RepositoryResult<Vec<PauseRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_pauses \
             WHERE wo_id = ? AND org_id = ? ORDER BY paused_at DESC, pause_id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![wo_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 停机汇总 (只计已关闭区间)
    pub fn downtime_summary(&self, org_id: &str, wo_id: &str) -> RepositoryResult<DowntimeSummary> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT reason, COALESCE(SUM(duration_minutes), 0)
               FROM wo_pauses
               WHERE wo_id = ? AND org_id = ? AND resumed_at IS NOT NULL
               GROUP BY reason
               ORDER BY reason"#,
        )?;

        let by_reason = stmt
            .query_map(params![wo_id, org_id], |row| {
                let reason: String = row.get(0)?;
                let minutes: i64 = row.get(1)?;
                Ok((PauseReason::from_str(&reason), minutes))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total_minutes = by_reason.iter().map(|(_, m)| m).sum();

        Ok(DowntimeSummary {
            total_minutes,
            minutes_by_reason: by_reason,
        })
    }

    /// 映射数据库行到 PauseRecord
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PauseRecord> {
        Ok(PauseRecord {
            pause_id: row.get(0)?,
            org_id: row.get(1)?,
            wo_id: row.get(2)?,
            paused_at: parse_ts(3, row.get(3)?)?,
            resumed_at: parse_ts_opt(4, row.get(4)?)?,
            duration_minutes: row.get(5)?,
            reason: PauseReason::from_str(&row.get::<_, String>(6)?),
            notes: row.get(7)?,
            paused_by: row.get(8)?,
            resumed_by: row.get(9)?,
        })
    }
}
