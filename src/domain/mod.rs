// ==========================================
// 食品制造执行系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod license_plate;
pub mod operation;
pub mod reservation;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use license_plate::{LicensePlate, MovementLogEntry};
pub use operation::WoOperation;
pub use reservation::{Consumption, Reservation};
pub use types::{
    LpStatus, MovementType, OperationStatus, PauseReason, ReservationStatus, WoStatus,
};
pub use work_order::{DowntimeSummary, PauseRecord, WoStatusHistory, WorkOrder, WorkOrderMaterial};
