// ==========================================
// 食品制造执行系统 - 容器与移动台账领域模型
// ==========================================
// 依据: 工单执行域设计 - license_plates / lp_movements
// 红线: 台账只追加; 同一容器的连续台账必须能精确重放出当前数量
// ==========================================

use crate::domain::types::{LpStatus, MovementType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// LicensePlate - 容器 (LP)
// ==========================================
// 物理上唯一编号的一批单一产品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePlate {
    pub lp_id: String,                       // 容器ID
    pub org_id: String,                      // 组织ID
    pub lp_number: String,                   // 容器编号 (LP-YYYY-NNNNN)
    pub product_id: String,                  // 产品ID
    pub quantity: f64,                       // 当前数量 (>= 0)
    pub uom: String,                         // 计量单位
    pub status: LpStatus,                    // 状态
    pub qa_status: String,                   // 质检状态 (passed/on_hold/...)
    pub parent_lp_id: Option<String>,        // 父容器 (拆分来源)
    pub consumed_by_wo_id: Option<String>,   // 耗尽该容器的工单
    pub consumed_at: Option<NaiveDateTime>,  // 耗尽时间
    pub created_at: NaiveDateTime,           // 创建时间
}

impl LicensePlate {
    /// 判断是否终态 (数量归零后不可再变更)
    pub fn is_terminal(&self) -> bool {
        self.status == LpStatus::Consumed
    }

    /// 判断是否可参与预留/消耗
    pub fn is_usable(&self) -> bool {
        matches!(self.status, LpStatus::Available | LpStatus::Reserved)
    }
}

// ==========================================
// MovementLogEntry - 移动台账行
// ==========================================
// 不变量: qty_after = qty_before + qty_change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLogEntry {
    pub movement_id: String,             // 台账ID
    pub org_id: String,                  // 组织ID
    pub lp_id: String,                   // 容器ID
    pub movement_type: MovementType,     // 移动类型
    pub qty_change: f64,                 // 数量变化 (带符号)
    pub qty_before: f64,                 // 变化前数量
    pub qty_after: f64,                  // 变化后数量
    pub consumption_id: Option<String>,  // 触发的消耗记录
    pub reservation_id: Option<String>,  // 关联预留
    pub actor: String,                   // 操作人
    pub created_at: NaiveDateTime,       // 记录时间
}

impl MovementLogEntry {
    /// 校验单行自洽性
    pub fn is_consistent(&self) -> bool {
        (self.qty_after - (self.qty_before + self.qty_change)).abs() < crate::QTY_EPSILON
    }
}
