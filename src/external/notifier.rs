use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::DrawExecutionResponse;

/// 中奖通知发送方（下游协作者）
///
/// 开奖事务提交后调用；notified 标记的维护、消息格式与重试都由实现方负责。
/// 返回错误只会被记录日志，不影响已提交的开奖。
#[async_trait]
pub trait WinnerNotifier: Send + Sync {
    async fn winners_drawn(&self, outcome: &DrawExecutionResponse) -> AppResult<()>;
}

/// 默认实现：仅记录日志，供未接入消息渠道的部署使用
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl WinnerNotifier for LogNotifier {
    async fn winners_drawn(&self, outcome: &DrawExecutionResponse) -> AppResult<()> {
        for winner in &outcome.winners {
            log::info!(
                "Winner pending notification: draw={} position={} participant={} prize={:?}",
                outcome.draw.id,
                winner.position,
                winner.participant.id,
                winner.prize.as_ref().map(|p| p.id),
            );
        }
        Ok(())
    }
}
