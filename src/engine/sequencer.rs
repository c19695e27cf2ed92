// ==========================================
// 食品制造执行系统 - 工序顺序控制
// ==========================================
// 职责: 判定某道工序当前能否开工 (纯函数, 不落库)
// 顺序策略开关由调用方传入: 开启时前序工序必须全部完工
// ==========================================

use crate::domain::operation::WoOperation;
use crate::domain::types::{OperationStatus, WoStatus};

/// 判定工序能否开工
///
/// 条件:
/// 1. 工单处于执行中
/// 2. 工序本身待开工
/// 3. 顺序策略开启时, 所有 seq_no 更小的工序均已完工
pub fn can_start(
    wo_status: WoStatus,
    op: &WoOperation,
    all_ops: &[WoOperation],
    enforce_sequence: bool,
) -> bool {
    if wo_status != WoStatus::InProgress {
        return false;
    }
    if op.status != OperationStatus::Pending {
        return false;
    }
    if !enforce_sequence {
        return true;
    }
    all_ops
        .iter()
        .filter(|other| other.seq_no < op.seq_no)
        .all(|other| other.status == OperationStatus::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_op(seq_no: i32, status: OperationStatus) -> WoOperation {
        WoOperation {
            operation_id: format!("op{seq_no}"),
            org_id: "org1".to_string(),
            wo_id: "wo1".to_string(),
            seq_no,
            name: format!("工序{seq_no}"),
            status,
        }
    }

    #[test]
    fn test_blocked_until_predecessors_complete() {
        let ops = vec![
            make_op(10, OperationStatus::InProgress),
            make_op(20, OperationStatus::Pending),
        ];
        assert!(!can_start(WoStatus::InProgress, &ops[1], &ops, true));
    }

    #[test]
    fn test_starts_after_predecessors_complete() {
        let ops = vec![
            make_op(10, OperationStatus::Completed),
            make_op(20, OperationStatus::Pending),
        ];
        assert!(can_start(WoStatus::InProgress, &ops[1], &ops, true));
    }

    #[test]
    fn test_policy_off_ignores_order() {
        let ops = vec![
            make_op(10, OperationStatus::Pending),
            make_op(20, OperationStatus::Pending),
        ];
        assert!(can_start(WoStatus::InProgress, &ops[1], &ops, false));
    }

    #[test]
    fn test_wo_must_be_in_progress() {
        let ops = vec![make_op(10, OperationStatus::Pending)];
        assert!(!can_start(WoStatus::Paused, &ops[0], &ops, false));
        assert!(!can_start(WoStatus::Released, &ops[0], &ops, false));
    }

    #[test]
    fn test_non_pending_op_cannot_start() {
        let ops = vec![make_op(10, OperationStatus::Completed)];
        assert!(!can_start(WoStatus::InProgress, &ops[0], &ops, true));
    }
}
