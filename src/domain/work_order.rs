// ==========================================
// 食品制造执行系统 - 工单领域模型
// ==========================================
// 依据: 工单执行域设计 - work_orders / wo_materials / wo_pauses
// 红线: 工单只软生命周期, 永不物理删除
// ==========================================

use crate::domain::types::{PauseReason, WoStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkOrder - 工单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub wo_id: String,                      // 工单ID
    pub org_id: String,                     // 组织ID
    pub wo_number: String,                  // 工单编号 (WO-YYYYMMDD-NNNN)
    pub product_id: String,                 // 产品ID
    pub status: WoStatus,                   // 状态
    pub pause_reason: Option<PauseReason>,  // 当前暂停原因
    pub paused_at: Option<NaiveDateTime>,   // 暂停时间
    pub paused_by: Option<String>,          // 暂停人
    pub started_at: Option<NaiveDateTime>,  // 开工时间
    pub completed_at: Option<NaiveDateTime>,// 完工时间
    pub created_by: String,                 // 创建人
    pub created_at: NaiveDateTime,          // 创建时间
    pub updated_at: NaiveDateTime,          // 更新时间
}

impl WorkOrder {
    /// 判断是否执行中
    pub fn is_in_progress(&self) -> bool {
        self.status == WoStatus::InProgress
    }

    /// 判断是否暂停中
    pub fn is_paused(&self) -> bool {
        self.status == WoStatus::Paused
    }
}

// ==========================================
// WorkOrderMaterial - 工单物料行
// ==========================================
// 约束: consumed_qty 单调不减; reserved_qty 不得超过该行所有
//       pending 预留所指容器数量之和
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderMaterial {
    pub material_id: String,    // 物料行ID
    pub org_id: String,         // 组织ID
    pub wo_id: String,          // 所属工单
    pub product_id: String,     // 产品ID
    pub material_name: String,  // 物料名称
    pub required_qty: f64,      // 需求数量
    pub consumed_qty: f64,      // 已消耗数量
    pub reserved_qty: f64,      // 已预留数量
    pub uom: String,            // 计量单位
    pub consume_whole_lp: bool, // 整托消耗策略
}

impl WorkOrderMaterial {
    /// 消耗差异百分比 (信息性, 不做拦截)
    ///
    /// 需求数量为 0 时无意义, 返回 0.0
    pub fn variance_pct(&self, consume_qty: f64) -> f64 {
        if self.required_qty > 0.0 {
            (consume_qty - self.required_qty) / self.required_qty * 100.0
        } else {
            0.0
        }
    }
}

// ==========================================
// PauseRecord - 暂停区间
// ==========================================
// 约束: 同一工单至多一条 resumed_at IS NULL 的记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseRecord {
    pub pause_id: String,                  // 记录ID
    pub org_id: String,                    // 组织ID
    pub wo_id: String,                     // 所属工单
    pub paused_at: NaiveDateTime,          // 暂停时间
    pub resumed_at: Option<NaiveDateTime>, // 恢复时间 (未恢复为 NULL)
    pub duration_minutes: Option<i64>,     // 停机时长 (恢复时计算)
    pub reason: PauseReason,               // 暂停原因
    pub notes: Option<String>,             // 备注
    pub paused_by: String,                 // 暂停人
    pub resumed_by: Option<String>,        // 恢复人
}

impl PauseRecord {
    /// 判断是否仍在暂停中
    pub fn is_open(&self) -> bool {
        self.resumed_at.is_none()
    }
}

// ==========================================
// DowntimeSummary - 停机汇总
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DowntimeSummary {
    pub total_minutes: i64,                          // 总停机分钟数
    pub minutes_by_reason: Vec<(PauseReason, i64)>,  // 按原因汇总
}

// ==========================================
// WoStatusHistory - 状态迁移审计
// ==========================================
// 红线: 只追加, 每次状态迁移一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoStatusHistory {
    pub history_id: String,             // 记录ID
    pub org_id: String,                 // 组织ID
    pub wo_id: String,                  // 所属工单
    pub from_status: Option<WoStatus>,  // 迁移前状态
    pub to_status: WoStatus,            // 迁移后状态
    pub changed_by: String,             // 操作人
    pub changed_at: NaiveDateTime,      // 操作时间
    pub notes: Option<String>,          // 备注
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_material(required_qty: f64) -> WorkOrderMaterial {
        WorkOrderMaterial {
            material_id: "mat1".to_string(),
            org_id: "org1".to_string(),
            wo_id: "wo1".to_string(),
            product_id: "prod1".to_string(),
            material_name: "面粉".to_string(),
            required_qty,
            consumed_qty: 0.0,
            reserved_qty: 0.0,
            uom: "kg".to_string(),
            consume_whole_lp: false,
        }
    }

    #[test]
    fn test_variance_pct_over_consumption() {
        let material = make_material(90.0);
        let variance = material.variance_pct(100.0);
        assert!((variance - 11.111111).abs() < 1e-4);
    }

    #[test]
    fn test_variance_pct_zero_required() {
        let material = make_material(0.0);
        assert_eq!(material.variance_pct(50.0), 0.0);
    }
}
