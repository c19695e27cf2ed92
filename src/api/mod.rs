// ==========================================
// 食品制造执行系统 - API 层
// ==========================================

// 调用上下文与权限
pub mod context;

// API 错误类型
pub mod error;

// 生产执行门面
pub mod production_api;

pub use context::{is_allowed, Action, AuthContext, Role};
pub use error::{ApiError, ApiResult};
pub use production_api::ProductionApi;
