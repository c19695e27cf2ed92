// ==========================================
// 食品制造执行系统 - 工单物料行仓储
// ==========================================
// 红线: consumed_qty 只累加, 不回写绝对值以外的字段
// ==========================================

use crate::domain::work_order::WorkOrderMaterial;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLS: &str = "material_id, org_id, wo_id, product_id, material_name, \
                           required_qty, consumed_qty, reserved_qty, uom, consume_whole_lp";

pub struct WoMaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WoMaterialRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入物料行
    pub fn insert(&self, material: &WorkOrderMaterial) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO wo_materials (
                material_id, org_id, wo_id, product_id, material_name,
                required_qty, consumed_qty, reserved_qty, uom, consume_whole_lp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &material.material_id,
                &material.org_id,
                &material.wo_id,
                &material.product_id,
                &material.material_name,
                material.required_qty,
                material.consumed_qty,
                material.reserved_qty,
                &material.uom,
                material.consume_whole_lp,
            ],
        )?;

        Ok(material.material_id.clone())
    }

    /// 按 material_id 查询 (组织隔离)
    pub fn find_by_id(
        &self,
        org_id: &str,
        material_id: &str,
    ) -> RepositoryResult<Option<WorkOrderMaterial>> {
        let conn = self.get_conn()?;
        Self::find_by_id_inner(&conn, org_id, material_id)
    }

    /// 事务内查询
    pub fn find_by_id_tx(
        tx: &Transaction,
        org_id: &str,
        material_id: &str,
    ) -> RepositoryResult<Option<WorkOrderMaterial>> {
        Self::find_by_id_inner(tx, org_id, material_id)
    }

    fn find_by_id_inner(
        conn: &Connection,
        org_id: &str,
        material_id: &str,
    ) -> RepositoryResult<Option<WorkOrderMaterial>> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_materials WHERE material_id = ? AND org_id = ?"
        );
        match conn.query_row(&sql, params![material_id, org_id], Self::map_row) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询工单下全部物料行
    pub fn list_by_wo(
        &self,
        org_id: &str,
        wo_id: &str,
    ) -> RepositoryResult<Vec<WorkOrderMaterial>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM wo_materials WHERE wo_id = ? AND org_id = ? ORDER BY material_name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![wo_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 累加已消耗数量 (事务内)
    pub fn add_consumed_qty_tx(
        tx: &Transaction,
        org_id: &str,
        material_id: &str,
        qty: f64,
    ) -> RepositoryResult<()> {
        let rows = tx.execute(
            "UPDATE wo_materials SET consumed_qty = consumed_qty + ? \
             WHERE material_id = ? AND org_id = ?",
            params![qty, material_id, org_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkOrderMaterial".to_string(),
                id: material_id.to_string(),
            });
        }
        Ok(())
    }

    /// 累加/扣减已预留数量 (事务内, delta 可为负)
    pub fn add_reserved_qty_tx(
        tx: &Transaction,
        org_id: &str,
        material_id: &str,
        delta: f64,
    ) -> RepositoryResult<()> {
        let rows = tx.execute(
            "UPDATE wo_materials SET reserved_qty = MAX(0, reserved_qty + ?) \
             WHERE material_id = ? AND org_id = ?",
            params![delta, material_id, org_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkOrderMaterial".to_string(),
                id: material_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到 WorkOrderMaterial
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkOrderMaterial> {
        Ok(WorkOrderMaterial {
            material_id: row.get(0)?,
            org_id: row.get(1)?,
            wo_id: row.get(2)?,
            product_id: row.get(3)?,
            material_name: row.get(4)?,
            required_qty: row.get(5)?,
            consumed_qty: row.get(6)?,
            reserved_qty: row.get(7)?,
            uom: row.get(8)?,
            consume_whole_lp: row.get(9)?,
        })
    }
}
