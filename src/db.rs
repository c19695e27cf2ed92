// ==========================================
// 食品制造执行系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供内嵌建表脚本，库与测试共用同一 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径（用户数据目录下）
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    base.join("food-mes").join("food_mes.db").to_string_lossy().to_string()
}

/// 建表脚本
///
/// 红线:
/// - lp_movements 只追加: 任何代码路径不得 UPDATE/DELETE 该表
/// - wo_material_reservations 同一 (material_id, lp_id) 至多一条 pending
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS work_orders (
    wo_id           TEXT PRIMARY KEY,
    org_id          TEXT NOT NULL,
    wo_number       TEXT NOT NULL,
    product_id      TEXT NOT NULL,
    status          TEXT NOT NULL,
    pause_reason    TEXT,
    paused_at       TEXT,
    paused_by       TEXT,
    started_at      TEXT,
    completed_at    TEXT,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_wo_org_number ON work_orders(org_id, wo_number);

CREATE TABLE IF NOT EXISTS wo_materials (
    material_id      TEXT PRIMARY KEY,
    org_id           TEXT NOT NULL,
    wo_id            TEXT NOT NULL REFERENCES work_orders(wo_id),
    product_id       TEXT NOT NULL,
    material_name    TEXT NOT NULL,
    required_qty     REAL NOT NULL,
    consumed_qty     REAL NOT NULL DEFAULT 0,
    reserved_qty     REAL NOT NULL DEFAULT 0,
    uom              TEXT NOT NULL,
    consume_whole_lp INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_wo_materials_wo ON wo_materials(wo_id);

CREATE TABLE IF NOT EXISTS license_plates (
    lp_id            TEXT PRIMARY KEY,
    org_id           TEXT NOT NULL,
    lp_number        TEXT NOT NULL,
    product_id       TEXT NOT NULL,
    quantity         REAL NOT NULL CHECK (quantity >= 0),
    uom              TEXT NOT NULL,
    status           TEXT NOT NULL,
    qa_status        TEXT NOT NULL DEFAULT 'passed',
    parent_lp_id     TEXT,
    consumed_by_wo_id TEXT,
    consumed_at      TEXT,
    created_at       TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_lp_org_number ON license_plates(org_id, lp_number);

CREATE TABLE IF NOT EXISTS wo_material_reservations (
    reservation_id  TEXT PRIMARY KEY,
    org_id          TEXT NOT NULL,
    material_id     TEXT NOT NULL REFERENCES wo_materials(material_id),
    lp_id           TEXT NOT NULL REFERENCES license_plates(lp_id),
    reserved_qty    REAL NOT NULL,
    uom             TEXT NOT NULL,
    status          TEXT NOT NULL,
    reserved_by     TEXT NOT NULL,
    reserved_at     TEXT NOT NULL,
    consumed_at     TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_reservation_pending_unique
    ON wo_material_reservations(material_id, lp_id) WHERE status = 'PENDING';
CREATE INDEX IF NOT EXISTS idx_reservation_lp ON wo_material_reservations(lp_id);

CREATE TABLE IF NOT EXISTS wo_consumptions (
    consumption_id  TEXT PRIMARY KEY,
    org_id          TEXT NOT NULL,
    wo_id           TEXT NOT NULL REFERENCES work_orders(wo_id),
    material_id     TEXT NOT NULL REFERENCES wo_materials(material_id),
    reservation_id  TEXT NOT NULL REFERENCES wo_material_reservations(reservation_id),
    lp_id           TEXT NOT NULL REFERENCES license_plates(lp_id),
    consumed_qty    REAL NOT NULL,
    uom             TEXT NOT NULL,
    status          TEXT NOT NULL,
    consumed_by     TEXT NOT NULL,
    consumed_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_consumption_wo ON wo_consumptions(wo_id);

CREATE TABLE IF NOT EXISTS lp_movements (
    movement_id     TEXT PRIMARY KEY,
    org_id          TEXT NOT NULL,
    lp_id           TEXT NOT NULL REFERENCES license_plates(lp_id),
    movement_type   TEXT NOT NULL,
    qty_change      REAL NOT NULL,
    qty_before      REAL NOT NULL,
    qty_after       REAL NOT NULL,
    consumption_id  TEXT,
    reservation_id  TEXT,
    actor           TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_movement_lp ON lp_movements(lp_id, created_at);

CREATE TABLE IF NOT EXISTS wo_pauses (
    pause_id         TEXT PRIMARY KEY,
    org_id           TEXT NOT NULL,
    wo_id            TEXT NOT NULL REFERENCES work_orders(wo_id),
    paused_at        TEXT NOT NULL,
    resumed_at       TEXT,
    duration_minutes INTEGER,
    reason           TEXT NOT NULL,
    notes            TEXT,
    paused_by        TEXT NOT NULL,
    resumed_by       TEXT
);
CREATE INDEX IF NOT EXISTS idx_pause_wo ON wo_pauses(wo_id, paused_at);

CREATE TABLE IF NOT EXISTS wo_status_history (
    history_id   TEXT PRIMARY KEY,
    org_id       TEXT NOT NULL,
    wo_id        TEXT NOT NULL REFERENCES work_orders(wo_id),
    from_status  TEXT,
    to_status    TEXT NOT NULL,
    changed_by   TEXT NOT NULL,
    changed_at   TEXT NOT NULL,
    notes        TEXT
);
CREATE INDEX IF NOT EXISTS idx_history_wo ON wo_status_history(wo_id, changed_at);

CREATE TABLE IF NOT EXISTS wo_operations (
    operation_id TEXT PRIMARY KEY,
    org_id       TEXT NOT NULL,
    wo_id        TEXT NOT NULL REFERENCES work_orders(wo_id),
    seq_no       INTEGER NOT NULL,
    name         TEXT NOT NULL,
    status       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_operation_wo ON wo_operations(wo_id, seq_no);
"#;

/// 初始化 schema（幂等，测试与正式库共用）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 再次执行不报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='lp_movements'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
