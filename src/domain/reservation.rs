// ==========================================
// 食品制造执行系统 - 预留与消耗领域模型
// ==========================================
// 依据: 工单执行域设计 - wo_material_reservations / wo_consumptions
// 红线: 预留恰好消耗一次, consumed 后不可再变更
// ==========================================

use crate::domain::types::ReservationStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Reservation - 预留
// ==========================================
// 将一个容器 (或其部分数量) 锁定给一条工单物料行
// 约束: 同一 (material_id, lp_id) 至多一条 pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,             // 预留ID
    pub org_id: String,                     // 组织ID
    pub material_id: String,                // 工单物料行
    pub lp_id: String,                      // 容器
    pub reserved_qty: f64,                  // 预留数量
    pub uom: String,                        // 计量单位
    pub status: ReservationStatus,          // 状态
    pub reserved_by: String,                // 预留人
    pub reserved_at: NaiveDateTime,         // 预留时间
    pub consumed_at: Option<NaiveDateTime>, // 消耗时间
}

impl Reservation {
    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }

    pub fn is_consumed(&self) -> bool {
        self.status == ReservationStatus::Consumed
    }
}

// ==========================================
// Consumption - 消耗记录
// ==========================================
// 一次预留消耗产生一条, 只插入不更新
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumption {
    pub consumption_id: String,    // 消耗ID
    pub org_id: String,            // 组织ID
    pub wo_id: String,             // 工单
    pub material_id: String,       // 工单物料行
    pub reservation_id: String,    // 源预留
    pub lp_id: String,             // 容器
    pub consumed_qty: f64,         // 消耗数量
    pub uom: String,               // 计量单位
    pub status: ReservationStatus, // 固定为 consumed
    pub consumed_by: String,       // 操作人
    pub consumed_at: NaiveDateTime,// 消耗时间
}
