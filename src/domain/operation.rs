// ==========================================
// 食品制造执行系统 - 工序领域模型
// ==========================================
// 工序顺序控制 (Operation Sequencer) 的输入实体
// ==========================================

use crate::domain::types::OperationStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// WoOperation - 工单工序
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoOperation {
    pub operation_id: String,    // 工序ID
    pub org_id: String,          // 组织ID
    pub wo_id: String,           // 所属工单
    pub seq_no: i32,             // 顺序号
    pub name: String,            // 工序名称
    pub status: OperationStatus, // 状态
}

impl WoOperation {
    pub fn is_completed(&self) -> bool {
        self.status == OperationStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }
}
