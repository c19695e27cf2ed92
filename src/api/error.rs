// ==========================================
// 食品制造执行系统 - API 错误类型
// ==========================================
// 职责: 把引擎/仓储错误折算为对外稳定错误码
// 红线: 跨组织访问一律 NOT_FOUND, 绝不返回 FORBIDDEN 泄露存在性
// ==========================================

use crate::domain::types::{LpStatus, WoStatus};
use crate::engine::error::ExecutionError;
use crate::repository::error::RepositoryError;
use serde::Serialize;
use thiserror::Error;

/// 对外错误类型 (携带结构化细节, 可序列化给前端/接口层)
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiError {
    #[error("{entity}未找到: {id}")]
    NotFound { entity: String, id: String },

    #[error("工单状态不允许该操作: wo_id={wo_id}, 当前状态={status}")]
    InvalidStatus { wo_id: String, status: WoStatus },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: WoStatus, to: WoStatus },

    #[error("工单已处于暂停状态: wo_id={wo_id}")]
    AlreadyPaused { wo_id: String },

    #[error("工单未处于暂停状态: wo_id={wo_id}")]
    NotPaused { wo_id: String },

    #[error("预留已被消耗, 不可重复消耗: reservation_id={reservation_id}")]
    ReservationAlreadyConsumed { reservation_id: String },

    #[error("同一物料行与容器已存在待消耗预留: material_id={material_id}, lp_id={lp_id}")]
    DuplicateReservation { material_id: String, lp_id: String },

    #[error("整托消耗策略: 必须整托消耗 {required_qty}, 实际请求 {requested_qty}")]
    WholeLpRequired {
        required_qty: f64,
        requested_qty: f64,
    },

    #[error("消耗数量超过预留数量: 预留 {reserved_qty}, 请求 {requested_qty}")]
    QtyExceedsReserved {
        reserved_qty: f64,
        requested_qty: f64,
    },

    #[error("容器可用数量不足: 可用 {lp_qty}, 请求 {requested_qty}")]
    InsufficientLpQuantity { lp_qty: f64, requested_qty: f64 },

    #[error("容器不可用: lp_id={lp_id}, 状态={status}")]
    LpNotAvailable { lp_id: String, status: LpStatus },

    #[error("容器产品与物料行不一致: 容器产品={lp_product_id}, 物料产品={material_product_id}")]
    ProductMismatch {
        lp_product_id: String,
        material_product_id: String,
    },

    #[error("计量单位不一致: 容器={lp_uom}, 物料行={material_uom}")]
    UomMismatch { lp_uom: String, material_uom: String },

    #[error("当前角色无权执行该操作: {action}")]
    Forbidden { action: String },

    #[error("并发冲突, 数据已被其他操作变更, 请重试: {detail}")]
    Conflict { detail: String },

    #[error("内部错误: {detail}")]
    Internal { detail: String },
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::WoNotFound { wo_id } => ApiError::NotFound {
                entity: "工单".to_string(),
                id: wo_id,
            },
            ExecutionError::MaterialNotFound { material_id } => ApiError::NotFound {
                entity: "工单物料行".to_string(),
                id: material_id,
            },
            ExecutionError::LpNotFound { lp_id } => ApiError::NotFound {
                entity: "容器".to_string(),
                id: lp_id,
            },
            ExecutionError::ReservationNotFound { reservation_id } => ApiError::NotFound {
                entity: "预留".to_string(),
                id: reservation_id,
            },
            ExecutionError::InvalidStatus { wo_id, status } => {
                ApiError::InvalidStatus { wo_id, status }
            }
            ExecutionError::InvalidTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            ExecutionError::AlreadyPaused { wo_id } => ApiError::AlreadyPaused { wo_id },
            ExecutionError::NotPaused { wo_id } => ApiError::NotPaused { wo_id },
            ExecutionError::ReservationAlreadyConsumed { reservation_id } => {
                ApiError::ReservationAlreadyConsumed { reservation_id }
            }
            ExecutionError::DuplicateReservation { material_id, lp_id } => {
                ApiError::DuplicateReservation { material_id, lp_id }
            }
            ExecutionError::WholeLpRequired {
                required_qty,
                requested_qty,
            } => ApiError::WholeLpRequired {
                required_qty,
                requested_qty,
            },
            ExecutionError::QtyExceedsReserved {
                reserved_qty,
                requested_qty,
            } => ApiError::QtyExceedsReserved {
                reserved_qty,
                requested_qty,
            },
            ExecutionError::InsufficientLpQuantity {
                lp_qty,
                requested_qty,
            } => ApiError::InsufficientLpQuantity {
                lp_qty,
                requested_qty,
            },
            ExecutionError::LpNotAvailable { lp_id, status } => {
                ApiError::LpNotAvailable { lp_id, status }
            }
            ExecutionError::ProductMismatch {
                lp_product_id,
                material_product_id,
            } => ApiError::ProductMismatch {
                lp_product_id,
                material_product_id,
            },
            ExecutionError::UomMismatch {
                lp_uom,
                material_uom,
            } => ApiError::UomMismatch {
                lp_uom,
                material_uom,
            },
            ExecutionError::Repository(e) => e.into(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            // 乐观并发败者 (幂等守卫之外的情形)
            RepositoryError::StaleState { entity, id, expected } => ApiError::Conflict {
                detail: format!("{entity} {id} 期望 {expected}"),
            },
            other => ApiError::Internal {
                detail: other.to_string(),
            },
        }
    }
}
