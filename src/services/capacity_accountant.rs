use sea_orm::ConnectionTrait;

use crate::error::{AppError, AppResult};
use crate::repositories::{DrawLedger, PrizeInventory};

/// 某一时刻的活动名额快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub contest_id: i64,
    /// Σ prize.quantity
    pub total_slots: i64,
    /// 已写入的中奖记录数
    pub issued_winners: i64,
}

impl CapacitySnapshot {
    pub fn remaining_slots(&self) -> AppResult<i64> {
        CapacityAccountant::remaining_slots(self.contest_id, self.total_slots, self.issued_winners)
    }
}

pub struct CapacityAccountant;

impl CapacityAccountant {
    /// 剩余名额 = 总名额 - 已发放。为负说明此前已超发，属于数据完整性错误，不做截断。
    pub fn remaining_slots(
        contest_id: i64,
        total_slots: i64,
        issued_winners: i64,
    ) -> AppResult<i64> {
        let remaining = total_slots - issued_winners;
        if remaining < 0 {
            return Err(AppError::DataIntegrity(format!(
                "Contest {contest_id} has {issued_winners} winners issued but only {total_slots} prize slots"
            )));
        }
        Ok(remaining)
    }

    /// 读取奖品名额与已发放数，并校验每次开奖的中奖记录都完整
    pub async fn snapshot<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> AppResult<CapacitySnapshot> {
        let total_slots = PrizeInventory::total_slots(conn, contest_id).await?;
        let issued_winners = DrawLedger::issued_winner_count(conn, contest_id).await?;
        let requested_total = DrawLedger::requested_winner_total(conn, contest_id).await?;

        if requested_total != issued_winners {
            return Err(AppError::DataIntegrity(format!(
                "Contest {contest_id} draws requested {requested_total} winners but {issued_winners} winner rows exist"
            )));
        }

        Ok(CapacitySnapshot {
            contest_id,
            total_slots,
            issued_winners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_slots() {
        assert_eq!(CapacityAccountant::remaining_slots(1, 3, 0).unwrap(), 3);
        assert_eq!(CapacityAccountant::remaining_slots(1, 3, 3).unwrap(), 0);
        assert_eq!(CapacityAccountant::remaining_slots(1, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_negative_remaining_is_integrity_error() {
        let err = CapacityAccountant::remaining_slots(9, 2, 3).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(_)));
        assert!(err.to_string().contains("Contest 9"));
    }

    #[test]
    fn test_snapshot_remaining() {
        let snapshot = CapacitySnapshot {
            contest_id: 1,
            total_slots: 5,
            issued_winners: 3,
        };
        assert_eq!(snapshot.remaining_slots().unwrap(), 2);
    }
}
