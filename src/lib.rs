// ==========================================
// 食品制造执行系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 工单执行与物料消耗核算 (执行核心)
// 红线: 库存数量只能通过消耗事务变更, 移动台账只追加不修改
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    LpStatus, MovementType, OperationStatus, PauseReason, ReservationStatus, WoStatus,
};

// 领域实体
pub use domain::{
    Consumption, DowntimeSummary, LicensePlate, MovementLogEntry, PauseRecord, Reservation,
    WoOperation, WoStatusHistory, WorkOrder, WorkOrderMaterial,
};

// 引擎
pub use engine::{
    can_start, ConsumeOutcome, ConsumptionEngine, PauseTracker, ReservationManager,
    WorkOrderStateMachine,
};

// API
pub use api::{Action, ApiError, ApiResult, AuthContext, ProductionApi, Role};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "食品制造执行系统";

/// 数量比较容差 (吸收浮点取整误差)
pub const QTY_EPSILON: f64 = 1e-4;
