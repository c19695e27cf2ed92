// ==========================================
// 食品制造执行系统 - 引擎层
// ==========================================
// 红线: Engine 不拼 SQL, 多表变更经由仓储事务函数在单事务内编排
// ==========================================

// 执行引擎错误类型
pub mod error;

// 工单状态机
pub mod state_machine;

// 预留管理器
pub mod reservation;

// 消耗引擎
pub mod consumption;

// 暂停/恢复追踪器
pub mod pause;

// 工序顺序控制
pub mod sequencer;

pub use consumption::{ConsumeOutcome, ConsumptionEngine};
pub use error::{ExecutionError, ExecutionResult};
pub use pause::PauseTracker;
pub use reservation::ReservationManager;
pub use sequencer::can_start;
pub use state_machine::{can_transition, WorkOrderStateMachine};
