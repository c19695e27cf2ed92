// ==========================================
// 食品制造执行系统 - 领域类型定义
// ==========================================
// 依据: 工单执行域设计 - 状态体系
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 执行核心只驱动 released→in_progress↔paused→completed,
// 其余状态由外部协作方设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WoStatus {
    Draft,      // 草稿
    Planned,    // 已计划
    Released,   // 已下达
    InProgress, // 执行中
    Paused,     // 暂停
    OnHold,     // 挂起
    Completed,  // 完工
    Closed,     // 关闭
    Cancelled,  // 取消
}

impl fmt::Display for WoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl WoStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DRAFT" => WoStatus::Draft,
            "PLANNED" => WoStatus::Planned,
            "RELEASED" => WoStatus::Released,
            "IN_PROGRESS" => WoStatus::InProgress,
            "PAUSED" => WoStatus::Paused,
            "ON_HOLD" => WoStatus::OnHold,
            "COMPLETED" => WoStatus::Completed,
            "CLOSED" => WoStatus::Closed,
            "CANCELLED" => WoStatus::Cancelled,
            _ => WoStatus::Draft, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WoStatus::Draft => "DRAFT",
            WoStatus::Planned => "PLANNED",
            WoStatus::Released => "RELEASED",
            WoStatus::InProgress => "IN_PROGRESS",
            WoStatus::Paused => "PAUSED",
            WoStatus::OnHold => "ON_HOLD",
            WoStatus::Completed => "COMPLETED",
            WoStatus::Closed => "CLOSED",
            WoStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 预留状态 (Reservation Status)
// ==========================================
// 红线: consumed 为终态, 转入后不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,  // 待消耗
    Consumed, // 已消耗 (终态)
    Released, // 已释放
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReservationStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => ReservationStatus::Pending,
            "CONSUMED" => ReservationStatus::Consumed,
            "RELEASED" => ReservationStatus::Released,
            _ => ReservationStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Consumed => "CONSUMED",
            ReservationStatus::Released => "RELEASED",
        }
    }
}

// ==========================================
// 容器状态 (License Plate Status)
// ==========================================
// 红线: 数量经消耗归零后转 consumed, 之后不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LpStatus {
    Available, // 可用
    Reserved,  // 已预留
    Consumed,  // 已消耗 (终态)
    Blocked,   // 冻结
}

impl fmt::Display for LpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl LpStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => LpStatus::Available,
            "RESERVED" => LpStatus::Reserved,
            "CONSUMED" => LpStatus::Consumed,
            "BLOCKED" => LpStatus::Blocked,
            _ => LpStatus::Available,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LpStatus::Available => "AVAILABLE",
            LpStatus::Reserved => "RESERVED",
            LpStatus::Consumed => "CONSUMED",
            LpStatus::Blocked => "BLOCKED",
        }
    }
}

// ==========================================
// 移动类型 (Movement Type)
// ==========================================
// lp_movements 每行一个数量变更事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,     // 入库
    Consumption, // 工单消耗
    Adjustment,  // 人工调整
    Split,       // 拆分
    Merge,       // 合并
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MovementType {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RECEIPT" => MovementType::Receipt,
            "CONSUMPTION" => MovementType::Consumption,
            "ADJUSTMENT" => MovementType::Adjustment,
            "SPLIT" => MovementType::Split,
            "MERGE" => MovementType::Merge,
            _ => MovementType::Adjustment,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "RECEIPT",
            MovementType::Consumption => "CONSUMPTION",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Split => "SPLIT",
            MovementType::Merge => "MERGE",
        }
    }
}

// ==========================================
// 暂停原因 (Pause Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    MachineBreakdown, // 设备故障
    MaterialShortage, // 缺料
    Break,            // 休息/换班
    QualityIssue,     // 质量问题
    Other,            // 其他
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PauseReason {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "machine_breakdown" => PauseReason::MachineBreakdown,
            "material_shortage" => PauseReason::MaterialShortage,
            "break" => PauseReason::Break,
            "quality_issue" => PauseReason::QualityIssue,
            _ => PauseReason::Other,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PauseReason::MachineBreakdown => "machine_breakdown",
            PauseReason::MaterialShortage => "material_shortage",
            PauseReason::Break => "break",
            PauseReason::QualityIssue => "quality_issue",
            PauseReason::Other => "other",
        }
    }

    /// 全部可选原因 (界面下拉用)
    pub fn all() -> &'static [PauseReason] {
        &[
            PauseReason::MachineBreakdown,
            PauseReason::MaterialShortage,
            PauseReason::Break,
            PauseReason::QualityIssue,
            PauseReason::Other,
        ]
    }
}

// ==========================================
// 工序状态 (Operation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,    // 待开工
    InProgress, // 进行中
    Completed,  // 已完工
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OperationStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => OperationStatus::Pending,
            "IN_PROGRESS" => OperationStatus::InProgress,
            "COMPLETED" => OperationStatus::Completed,
            _ => OperationStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Completed => "COMPLETED",
        }
    }
}
