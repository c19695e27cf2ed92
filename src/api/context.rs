// ==========================================
// 食品制造执行系统 - 调用上下文与权限
// ==========================================
// 职责: 携带调用人/组织/角色; 变更操作先过角色-动作矩阵
// 红线: org_id 一律取自上下文, 绝不信任入参里的组织
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 调用角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Viewer,     // 只读
    Operator,   // 车间操作: 预留/消耗/暂停/恢复
    Supervisor, // 产线主管: 操作 + 开工/完工
    Admin,      // 全量
}

/// 受控动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ReserveMaterial,
    ReleaseReservation,
    ConsumeMaterial,
    PauseWorkOrder,
    ResumeWorkOrder,
    StartWorkOrder,
    CompleteWorkOrder,
    TransitionWorkOrder,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::ReserveMaterial => "RESERVE_MATERIAL",
            Action::ReleaseReservation => "RELEASE_RESERVATION",
            Action::ConsumeMaterial => "CONSUME_MATERIAL",
            Action::PauseWorkOrder => "PAUSE_WORK_ORDER",
            Action::ResumeWorkOrder => "RESUME_WORK_ORDER",
            Action::StartWorkOrder => "START_WORK_ORDER",
            Action::CompleteWorkOrder => "COMPLETE_WORK_ORDER",
            Action::TransitionWorkOrder => "TRANSITION_WORK_ORDER",
        };
        write!(f, "{s}")
    }
}

/// 角色-动作矩阵 (查询动作不设防, 组织隔离由仓储兜底)
pub fn is_allowed(role: Role, action: Action) -> bool {
    use Action::*;
    match role {
        Role::Admin => true,
        Role::Supervisor => true,
        Role::Operator => matches!(
            action,
            ReserveMaterial | ReleaseReservation | ConsumeMaterial | PauseWorkOrder
                | ResumeWorkOrder
        ),
        Role::Viewer => false,
    }
}

/// 调用上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String, // 操作人
    pub org_id: String,  // 所属组织
    pub role: Role,      // 角色
}

impl AuthContext {
    pub fn new(user_id: &str, org_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            role,
        }
    }
}
