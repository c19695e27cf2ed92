// ==========================================
// 食品制造执行系统 - 工单工序仓储
// ==========================================

use crate::domain::operation::WoOperation;
use crate::domain::types::OperationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct WoOperationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WoOperationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入工序
    pub fn insert(&self, op: &WoOperation) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO wo_operations (
                operation_id, org_id, wo_id, seq_no, name, status
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &op.operation_id,
                &op.org_id,
                &op.wo_id,
                op.seq_no,
                &op.name,
                op.status.to_db_str(),
            ],
        )?;
        Ok(op.operation_id.clone())
    }

    /// 查询工单全部工序 (按顺序号升序 - 顺序控制判定的约定输入)
    pub fn list_by_wo(&self, org_id: &str, wo_id: &str) -> RepositoryResult<Vec<WoOperation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT operation_id, org_id, wo_id, seq_no, name, status
               FROM wo_operations
               WHERE wo_id = ? AND org_id = ?
               ORDER BY seq_no ASC"#,
        )?;
        let rows = stmt
            .query_map(params![wo_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 映射数据库行到 WoOperation
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WoOperation> {
        Ok(WoOperation {
            operation_id: row.get(0)?,
            org_id: row.get(1)?,
            wo_id: row.get(2)?,
            seq_no: row.get(3)?,
            name: row.get(4)?,
            status: OperationStatus::from_str(&row.get::<_, String>(5)?),
        })
    }
}
