// ==========================================
// 食品制造执行系统 - 执行引擎错误类型
// ==========================================
// 职责: 工单执行与消耗核算的业务错误
// 红线: 错误必须携带结构化细节 (数量/状态), 调用方据此渲染可操作提示;
//       跨组织访问一律以"未找到"呈现, 不泄露存在性
// ==========================================

use crate::domain::types::{LpStatus, WoStatus};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 执行引擎错误类型
#[derive(Error, Debug)]
pub enum ExecutionError {
    // ===== 未找到 (含跨组织访问) =====
    #[error("工单未找到: wo_id={wo_id}")]
    WoNotFound { wo_id: String },

    #[error("工单物料行未找到: material_id={material_id}")]
    MaterialNotFound { material_id: String },

    #[error("容器未找到: lp_id={lp_id}")]
    LpNotFound { lp_id: String },

    #[error("预留未找到: reservation_id={reservation_id}")]
    ReservationNotFound { reservation_id: String },

    // ===== 状态机 =====
    #[error("工单状态不允许该操作: wo_id={wo_id}, 当前状态={status}")]
    InvalidStatus { wo_id: String, status: WoStatus },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition { from: WoStatus, to: WoStatus },

    // ===== 幂等守卫 (与通用状态错误区分, 便于精确提示) =====
    #[error("工单已处于暂停状态: wo_id={wo_id}")]
    AlreadyPaused { wo_id: String },

    #[error("工单未处于暂停状态: wo_id={wo_id}")]
    NotPaused { wo_id: String },

    #[error("预留已被消耗, 不可重复消耗: reservation_id={reservation_id}")]
    ReservationAlreadyConsumed { reservation_id: String },

    // ===== 预留/消耗业务规则 =====
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

    // ===== 底层透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ExecutionResult<T> = Result<T, ExecutionError>;
