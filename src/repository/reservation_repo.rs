// ==========================================
// 食品制造执行系统 - 预留仓储
// ==========================================
// 红线: 状态翻转一律条件更新; consumed 翻转一次后不可逆
// ==========================================

use crate::domain::reservation::Reservation;
use crate::domain::types::ReservationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts, parse_ts_opt};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLS: &str = "reservation_id, org_id, material_id, lp_id, reserved_qty, uom, \
                           status, reserved_by, reserved_at, consumed_at";

pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入预留 (事务内)
    ///
    /// 唯一索引保证同一 (material_id, lp_id) 至多一条 pending,
    /// 违反时上层转业务错误
    pub fn insert_tx(tx: &Transaction, reservation: &Reservation) -> RepositoryResult<String> {
        tx.execute(
            r#"INSERT INTO wo_material_reservations (
                reservation_id, org_id, material_id, lp_id, reserved_qty, uom,
                status, reserved_by, reserved_at, consumed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &reservation.reservation_id,
                &reservation.org_id,
                &reservation.material_id,
                &reservation.lp_id,
                reservation.reserved_qty,
                &reservation.uom,
                reservation.status.to_db_str(),
                &reservation.reserved_by,
                fmt_ts(&reservation.reserved_at),
                reservation.consumed_at.as_ref().map(fmt_ts),
            ],
        )?;
        Ok(reservation.reservation_id.clone())
    }

    /// 按 reservation_id 查询 (组织隔离)
    pub fn find_by_id(
        &self,
        org_id: &str,
        reservation_id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        let conn = self.get_conn()?;
        Self::find_by_id_inner(&conn, org_id, reservation_id)
    }

    /// 事务内查询
    pub fn find_by_id_tx(
        tx: &Transaction,
        org_id: &str,
        reservation_id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        Self::find_by_id_inner(tx, org_id, reservation_id)
    }

    fn find_by_id_inner(
        conn: &Connection,
        org_id: &str,
        reservation_id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_material_reservations \
             WHERE reservation_id = ? AND org_id = ?"
        );
        match conn.query_row(&sql, params![reservation_id, org_id], Self::map_row) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 条件翻转为 consumed (仅 pending 可翻转)
    ///
    /// # 返回
    /// - Ok(true): 本次调用赢得翻转
    /// - Ok(false): 0 行受影响 (已被并发消耗或已释放)
    pub fn mark_consumed_tx(
        tx: &Transaction,
        org_id: &str,
        reservation_id: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE wo_material_reservations
               SET status = 'CONSUMED', consumed_at = ?
               WHERE reservation_id = ? AND org_id = ? AND status = 'PENDING'"#,
            params![fmt_ts(now), reservation_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 条件翻转为 released (仅 pending 可翻转)
    pub fn mark_released_tx(
        tx: &Transaction,
        org_id: &str,
        reservation_id: &str,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            r#"UPDATE wo_material_reservations
               SET status = 'RELEASED'
               WHERE reservation_id = ? AND org_id = ? AND status = 'PENDING'"#,
            params![reservation_id, org_id],
        )?;
        Ok(rows == 1)
    }

    /// 事务内统计某容器上 pending 预留数量之和
    pub fn sum_pending_on_lp_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
    ) -> RepositoryResult<f64> {
        let sum: f64 = tx.query_row(
            "SELECT COALESCE(SUM(reserved_qty), 0) FROM wo_material_reservations \
             WHERE lp_id = ? AND org_id = ? AND status = 'PENDING'",
            params![lp_id, org_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 事务内统计某容器上 pending 预留条数
    pub fn count_pending_on_lp_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
    ) -> RepositoryResult<i64> {
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM wo_material_reservations \
             WHERE lp_id = ? AND org_id = ? AND status = 'PENDING'",
            params![lp_id, org_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询物料行下全部预留 (最近在前)
    pub fn list_by_material(
        &self,
        org_id: &str,
        material_id: &str,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_material_reservations \
             WHERE material_id = ? AND org_id = ? ORDER BY reserved_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![material_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 映射数据库行到 Reservation
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
        Ok(Reservation {
            reservation_id: row.get(0)?,
            org_id: row.get(1)?,
            material_id: row.get(2)?,
            lp_id: row.get(3)?,
            reserved_qty: row.get(4)?,
            uom: row.get(5)?,
            status: ReservationStatus::from_str(&row.get::<_, String>(6)?),
            reserved_by: row.get(7)?,
            reserved_at: parse_ts(8, row.get(8)?)?,
            consumed_at: parse_ts_opt(9, row.get(9)?)?,
        })
    }
}
