// ==========================================
// 食品制造执行系统 - 消耗记录仓储
// ==========================================
// 红线: 只插入, 不更新不删除
// ==========================================

use crate::domain::reservation::Consumption;
use crate::domain::types::ReservationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLS: &str = "consumption_id, org_id, wo_id, material_id, reservation_id, lp_id, \
                           consumed_qty, uom, status, consumed_by, consumed_at";

pub struct ConsumptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConsumptionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入消耗记录 (事务内)
    pub fn insert_tx(tx: &Transaction, consumption: &Consumption) -> RepositoryResult<String> {
        tx.execute(
            r#"INSERT INTO wo_consumptions (
                consumption_id, org_id, wo_id, material_id, reservation_id, lp_id,
                consumed_qty, uom, status, consumed_by, consumed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &consumption.consumption_id,
                &consumption.org_id,
                &consumption.wo_id,
                &consumption.material_id,
                &consumption.reservation_id,
                &consumption.lp_id,
                consumption.consumed_qty,
                &consumption.uom,
                consumption.status.to_db_str(),
                &consumption.consumed_by,
                fmt_ts(&consumption.consumed_at),
            ],
        )?;
        Ok(consumption.consumption_id.clone())
    }

    /// 查询工单下全部消耗记录 (最近在前)
    pub fn list_by_wo(&self, org_id: &str, wo_id: &str) -> RepositoryResult<Vec<Consumption>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_consumptions \
             WHERE wo_id = ? AND org_id = ? ORDER BY consumed_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![wo_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 映射数据库行到 Consumption
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Consumption> {
        Ok(Consumption {
            consumption_id: row.get(0)?,
            org_id: row.get(1)?,
            wo_id: row.get(2)?,
            material_id: row.get(3)?,
            reservation_id: row.get(4)?,
            lp_id: row.get(5)?,
            consumed_qty: row.get(6)?,
            uom: row.get(7)?,
            status: ReservationStatus::from_str(&row.get::<_, String>(8)?),
            consumed_by: row.get(9)?,
            consumed_at: parse_ts(10, row.get(10)?)?,
        })
    }
}
