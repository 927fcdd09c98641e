use rand::Rng;
use rand::seq::SliceRandom;

use crate::entities::participant_entity as participants;
use crate::error::{AppError, AppResult};
use crate::models::WinnerDraft;

/// 中奖者分配（纯函数，随机源由调用方提供）
pub struct WinnerAllocator;

impl WinnerAllocator {
    /// 从有效参与者中无放回抽取 `count` 名中奖者:
    /// 1. Fisher-Yates 均匀打乱整个序列
    /// 2. 取前 `count` 个，保留打乱后的顺序作为中奖顺序
    /// 3. 第 i 位中奖者配对 `prize_assignments[i]`，缺省则不指定奖品
    ///
    /// 相同的输入序列与相同的随机源状态得到相同结果。
    pub fn allocate<R: Rng + ?Sized>(
        eligible: &[participants::Model],
        count: usize,
        prize_assignments: &[Option<i64>],
        rng: &mut R,
    ) -> AppResult<Vec<WinnerDraft>> {
        if count == 0 {
            return Err(AppError::InvalidRequest(
                "Number of winners must be positive".into(),
            ));
        }
        if count > eligible.len() {
            return Err(AppError::InsufficientParticipants {
                requested: count as i64,
                eligible: eligible.len() as i64,
            });
        }

        let mut pool: Vec<&participants::Model> = eligible.iter().collect();
        pool.shuffle(rng);

        Ok(pool
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(i, p)| WinnerDraft {
                participant_id: p.id,
                winner_name: p.name.clone(),
                prize_id: prize_assignments.get(i).copied().flatten(),
                position: i as i32,
            })
            .collect())
    }
}
