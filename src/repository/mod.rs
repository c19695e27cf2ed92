// ==========================================
// 食品制造执行系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑, 只做数据映射
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 跨表原子单元在同一事务内完成, 热点行一律条件更新
// ==========================================

pub mod consumption_repo;
pub mod error;
pub mod license_plate_repo;
pub mod material_repo;
pub mod operation_repo;
pub mod pause_repo;
pub mod reservation_repo;
pub mod work_order_repo;

// 重导出核心仓储
pub use consumption_repo::ConsumptionRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use license_plate_repo::LicensePlateRepository;
pub use material_repo::WoMaterialRepository;
pub use operation_repo::WoOperationRepository;
pub use pause_repo::PauseRepository;
pub use reservation_repo::ReservationRepository;
pub use work_order_repo::WorkOrderRepository;

use chrono::NaiveDateTime;

/// 数据库时间戳格式 (全库统一)
pub(crate) const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间戳
pub(crate) fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FMT).to_string()
}

/// 解析时间戳列 (列号用于错误定位)
pub(crate) fn parse_ts(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, TS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 解析可空时间戳列
pub(crate) fn parse_ts_opt(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    match s {
        Some(s) => parse_ts(idx, s).map(Some),
        None => Ok(None),
    }
}
