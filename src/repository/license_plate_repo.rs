// ==========================================
// 食品制造执行系统 - 容器与移动台账仓储
// ==========================================
// 红线: 扣减数量与追加台账是同一原子单元, 不得拆开暴露;
//       lp_movements 永不 UPDATE/DELETE
// 红线: 数量扣减用条件更新 (WHERE quantity = 已知前值) 串行化并发
// ==========================================

use crate::domain::license_plate::{LicensePlate, MovementLogEntry};
use crate::domain::types::{LpStatus, MovementType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts, parse_ts_opt};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLS: &str = "lp_id, org_id, lp_number, product_id, quantity, uom, status, \
                           qa_status, parent_lp_id, consumed_by_wo_id, consumed_at, created_at";

const MOVEMENT_COLS: &str = "movement_id, org_id, lp_id, movement_type, qty_change, \
                             qty_before, qty_after, consumption_id, reservation_id, \
                             actor, created_at";

/// 消耗扣减结果
#[derive(Debug, Clone)]
pub struct DebitResult {
    pub qty_before: f64,
    pub qty_after: f64,
    pub depleted: bool, // 数量归零, 容器转终态
}

pub struct LicensePlateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LicensePlateRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 入库: 创建容器并追加一条 RECEIPT 台账
    ///
    /// 台账从 0 起步, 重放时 Σ qty_change 即当前数量
    pub fn insert_with_receipt(
        &self,
        lp: &LicensePlate,
        actor: &str,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO license_plates (
                lp_id, org_id, lp_number, product_id, quantity, uom, status,
                qa_status, parent_lp_id, consumed_by_wo_id, consumed_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &lp.lp_id,
                &lp.org_id,
                &lp.lp_number,
                &lp.product_id,
                lp.quantity,
                &lp.uom,
                lp.status.to_db_str(),
                &lp.qa_status,
                &lp.parent_lp_id,
                &lp.consumed_by_wo_id,
                lp.consumed_at.as_ref().map(fmt_ts),
                fmt_ts(&lp.created_at),
            ],
        )?;

        Self::append_movement_tx(
            &tx,
            &lp.org_id,
            &lp.lp_id,
            MovementType::Receipt,
            lp.quantity,
            0.0,
            lp.quantity,
            None,
            None,
            actor,
            &lp.created_at,
        )?;

        tx.commit()?;
        Ok(lp.lp_id.clone())
    }

    /// 按 lp_id 查询容器 (组织隔离)
    pub fn find_by_id(&self, org_id: &str, lp_id: &str) -> RepositoryResult<Option<LicensePlate>> {
        let conn = self.get_conn()?;
        Self::find_by_id_inner(&conn, org_id, lp_id)
    }

    /// 事务内查询容器
    pub fn find_by_id_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
    ) -> RepositoryResult<Option<LicensePlate>> {
        Self::find_by_id_inner(tx, org_id, lp_id)
    }

    fn find_by_id_inner(
        conn: &Connection,
        org_id: &str,
        lp_id: &str,
    ) -> RepositoryResult<Option<LicensePlate>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM license_plates WHERE lp_id = ? AND org_id = ?"
        );
        match conn.query_row(&sql, params![lp_id, org_id], Self::map_row) {
            Ok(lp) => Ok(Some(lp)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 消耗扣减 + 追加台账 (唯一的数量变更入口, 仅消耗引擎经由事务调用)
    ///
    /// 条件更新以已知前值 quantity 为守卫; 归零 (<= 容差) 时同场翻转为
    /// CONSUMED 终态并盖上耗尽工单与时间。
    ///
    /// # 返回
    /// - Err(StaleState): 前值不匹配, 并发败者应整体回滚后重试
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn debit_for_consumption_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
        qty_before: f64,
        consume_qty: f64,
        wo_id: &str,
        consumption_id: &str,
        reservation_id: &str,
        actor: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<DebitResult> {
        let remaining = qty_before - consume_qty;
        // <= 容差: 吸收浮点取整, 归零即终态
        let depleted = remaining <= crate::QTY_EPSILON;
        let qty_after = if depleted { 0.0 } else { remaining };

        let rows = if depleted {
            tx.execute(
                r#"UPDATE license_plates
                   SET quantity = 0, status = 'CONSUMED',
                       consumed_by_wo_id = ?, consumed_at = ?
                   WHERE lp_id = ? AND org_id = ? AND quantity = ? AND status != 'CONSUMED'"#,
                params![wo_id, fmt_ts(now), lp_id, org_id, qty_before],
            )?
        } else {
            tx.execute(
                r#"UPDATE license_plates
                   SET quantity = ?
                   WHERE lp_id = ? AND org_id = ? AND quantity = ? AND status != 'CONSUMED'"#,
                params![qty_after, lp_id, org_id, qty_before],
            )?
        };

        if rows == 0 {
            return Err(RepositoryError::StaleState {
                entity: "LicensePlate".to_string(),
                id: lp_id.to_string(),
                expected: format!("quantity={qty_before}"),
            });
        }

        Self::append_movement_tx(
            tx,
            org_id,
            lp_id,
            MovementType::Consumption,
            -consume_qty,
            qty_before,
            qty_after,
            Some(consumption_id),
            Some(reservation_id),
            actor,
            now,
        )?;

        Ok(DebitResult {
            qty_before,
            qty_after,
            depleted,
        })
    }

    /// 条件翻转容器状态 (预留/释放路径)
    pub fn set_status_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
        expected: LpStatus,
        to: LpStatus,
    ) -> RepositoryResult<bool> {
        let rows = tx.execute(
            "UPDATE license_plates SET status = ? \
             WHERE lp_id = ? AND org_id = ? AND status = ?",
            params![to.to_db_str(), lp_id, org_id, expected.to_db_str()],
        )?;
        Ok(rows == 1)
    }

    /// 追加台账行 (私有: 外部只能经由原子单元触达)
    #[allow(clippy::too_many_arguments)]
    fn append_movement_tx(
        tx: &Transaction,
        org_id: &str,
        lp_id: &str,
        movement_type: MovementType,
        qty_change: f64,
        qty_before: f64,
        qty_after: f64,
        consumption_id: Option<&str>,
        reservation_id: Option<&str>,
        actor: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<String> {
        let movement_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"INSERT INTO lp_movements (
                movement_id, org_id, lp_id, movement_type, qty_change,
                qty_before, qty_after, consumption_id, reservation_id,
                actor, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &movement_id,
                org_id,
                lp_id,
                movement_type.to_db_str(),
                qty_change,
                qty_before,
                qty_after,
                consumption_id,
                reservation_id,
                actor,
                fmt_ts(now),
            ],
        )?;
        Ok(movement_id)
    }

    /// 查询容器全部台账 (时间正序)
    pub fn list_movements(
        &self,
        org_id: &str,
        lp_id: &str,
    ) -> RepositoryResult<Vec<MovementLogEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {MOVEMENT_COLS} FROM lp_movements \
             WHERE lp_id = ? AND org_id = ? ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![lp_id, org_id], Self::map_movement_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 台账重放: Σ qty_change (入库行从 0 起步, 结果应等于当前数量)
    pub fn replay_quantity(&self, org_id: &str, lp_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sum: f64 = conn.query_row(
            "SELECT COALESCE(SUM(qty_change), 0) FROM lp_movements \
             WHERE lp_id = ? AND org_id = ?",
            params![lp_id, org_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 映射数据库行到 LicensePlate
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<LicensePlate> {
        Ok(LicensePlate {
            lp_id: row.get(0)?,
            org_id: row.get(1)?,
            lp_number: row.get(2)?,
            product_id: row.get(3)?,
            quantity: row.get(4)?,
            uom: row.get(5)?,
            status: LpStatus::from_str(&row.get::<_, String>(6)?),
            qa_status: row.get(7)?,
            parent_lp_id: row.get(8)?,
            consumed_by_wo_id: row.get(9)?,
            consumed_at: parse_ts_opt(10, row.get(10)?)?,
            created_at: parse_ts(11, row.get(11)?)?,
        })
    }

    /// 映射数据库行到 MovementLogEntry
    fn map_movement_row(row: &rusqlite::Row) -> rusqlite::Result<MovementLogEntry> {
        Ok(MovementLogEntry {
            movement_id: row.get(0)?,
            org_id: row.get(1)?,
            lp_id: row.get(2)?,
            movement_type: MovementType::from_str(&row.get::<_, String>(3)?),
            qty_change: row.get(4)?,
            qty_before: row.get(5)?,
            qty_after: row.get(6)?,
            consumption_id: row.get(7)?,
            reservation_id: row.get(8)?,
            actor: row.get(9)?,
            created_at: parse_ts(10, row.get(10)?)?,
        })
    }
}
