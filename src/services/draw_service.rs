use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait};
use tokio::sync::Mutex;

use crate::config::DrawConfig;
use crate::entities::contest_entity as contests;
use crate::error::{AppError, AppResult};
use crate::external::WinnerNotifier;
use crate::models::{
    CapacityResponse, DrawCommand, DrawDetailResponse, DrawExecutionResponse, DrawListQuery,
    DrawResponse, WinnerDetailResponse,
};
use crate::repositories::{DrawLedger, ParticipantSource, PrizeInventory};
use crate::services::{CapacityAccountant, WinnerAllocator};
use crate::utils::{DrawPageResponse, PageWindow, PaginatedResponse};

#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
    config: DrawConfig,
    rng: Arc<Mutex<StdRng>>,
    notifier: Arc<dyn WinnerNotifier>,
}

impl DrawService {
    pub fn new(
        pool: DatabaseConnection,
        config: DrawConfig,
        notifier: Arc<dyn WinnerNotifier>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => {
                log::warn!("Draw RNG is seeded with a fixed value, results are reproducible");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self {
            pool,
            config,
            rng: Arc::new(Mutex::new(rng)),
            notifier,
        }
    }

    /// 执行一次开奖
    ///
    /// 并发冲突时整笔事务重新执行，最多 `max_conflict_retries` 次；
    /// 其它错误直接返回。提交成功后通知下游发送方。
    pub async fn execute_draw(&self, cmd: DrawCommand) -> AppResult<DrawExecutionResponse> {
        let total_winners = winner_total(&cmd)?;

        let service = self;
        let cmd_ref = &cmd;
        let outcome = retry_on_conflict(&self.config, cmd.contest_id, move || {
            service.run_draw_transaction(cmd_ref, total_winners)
        })
        .await?;

        log::info!(
            "Draw {} created for contest {} by {:?} with {} winners, {} slots remaining",
            outcome.draw.id,
            outcome.draw.contest_id,
            outcome.draw.executed_by,
            outcome.winners.len(),
            outcome.remaining_slots
        );

        if let Err(e) = self.notifier.winners_drawn(&outcome).await {
            log::error!("Failed to hand draw {} to notifier: {e:?}", outcome.draw.id);
        }

        Ok(outcome)
    }

    /// 单次开奖事务:
    /// 1. 读取有效参与者（按报名时间）并校验人数
    /// 2. 锁定名额计数器，之后计算剩余名额并校验
    /// 3. 原子占用名额计数器，写入开奖记录
    /// 4. 打乱抽取中奖者并写入
    /// 5. 重新读取中奖详情后提交
    ///
    /// 任一步失败事务回滚，不会留下不完整的开奖。
    async fn run_draw_transaction(
        &self,
        cmd: &DrawCommand,
        total_winners: i32,
    ) -> AppResult<DrawExecutionResponse> {
        let txn = self.pool.begin().await?;
        let contest_id = cmd.contest_id;

        ensure_contest_exists(&txn, contest_id).await?;
        self.validate_prize_assignments(&txn, cmd).await?;

        let eligible = ParticipantSource::eligible(&txn, contest_id).await?;
        if eligible.is_empty() {
            return Err(AppError::NoEligibleParticipants { contest_id });
        }

        let requested = i64::from(total_winners);
        if cmd.requested_count > eligible.len() {
            return Err(AppError::InsufficientParticipants {
                requested,
                eligible: eligible.len() as i64,
            });
        }

        // 先持有计数器行锁再读快照，否则并发提交会让两次读取看到不同的已发放数
        let allocation = DrawLedger::lock_allocation(&txn, contest_id).await?;
        let snapshot = CapacityAccountant::snapshot(&txn, contest_id).await?;
        if allocation.issued_winners != snapshot.issued_winners {
            return Err(AppError::DataIntegrity(format!(
                "Contest {contest_id} allocation counter is {} but {} winners exist",
                allocation.issued_winners, snapshot.issued_winners
            )));
        }

        let remaining = snapshot.remaining_slots()?;
        if requested > remaining {
            return Err(AppError::InsufficientCapacity {
                requested,
                remaining,
            });
        }

        let reserved = DrawLedger::reserve_slots(
            &txn,
            contest_id,
            allocation.issued_winners,
            requested,
            snapshot.total_slots,
        )
        .await?;
        if !reserved {
            return Err(AppError::ConcurrencyConflict(format!(
                "Allocation counter for contest {contest_id} changed during draw"
            )));
        }

        let draw =
            DrawLedger::create_draw(&txn, contest_id, cmd.operator_id.clone(), total_winners)
                .await?;

        let drafts = {
            let mut rng = self.rng.lock().await;
            WinnerAllocator::allocate(
                &eligible,
                cmd.requested_count,
                &cmd.prize_assignments,
                &mut *rng,
            )?
        };
        DrawLedger::insert_winners(&txn, draw.id, &drafts).await?;

        let winners = load_winner_details(&txn, draw.id).await?;
        if winners.len() != cmd.requested_count {
            return Err(AppError::DataIntegrity(format!(
                "Draw {} persisted {} winners, expected {}",
                draw.id,
                winners.len(),
                cmd.requested_count
            )));
        }

        txn.commit().await?;

        Ok(DrawExecutionResponse {
            draw: draw.into(),
            winners,
            remaining_slots: remaining - requested,
        })
    }

    /// 指定的奖品必须属于该活动
    async fn validate_prize_assignments<C: ConnectionTrait>(
        &self,
        conn: &C,
        cmd: &DrawCommand,
    ) -> AppResult<()> {
        let requested: HashSet<i64> = cmd.prize_assignments.iter().flatten().copied().collect();
        if requested.is_empty() {
            return Ok(());
        }

        let contest_prizes: HashSet<i64> = PrizeInventory::list_for_contest(conn, cmd.contest_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut unknown: Vec<i64> = requested.difference(&contest_prizes).copied().collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(AppError::InvalidRequest(format!(
                "Prize ids {unknown:?} do not belong to contest {}",
                cmd.contest_id
            )));
        }
        Ok(())
    }

    /// 获取开奖详情
    pub async fn get_draw(&self, draw_id: i64) -> AppResult<DrawDetailResponse> {
        let draw = DrawLedger::find_draw(&self.pool, draw_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Draw {draw_id}")))?;

        let winners = load_winner_details(&self.pool, draw.id).await?;
        if winners.len() != draw.total_winners as usize {
            return Err(AppError::DataIntegrity(format!(
                "Draw {} has {} winners, expected {}",
                draw.id,
                winners.len(),
                draw.total_winners
            )));
        }

        Ok(DrawDetailResponse {
            draw: draw.into(),
            winners,
        })
    }

    /// 活动开奖历史（分页，倒序）
    pub async fn list_draws(
        &self,
        contest_id: i64,
        query: &DrawListQuery,
    ) -> AppResult<DrawPageResponse> {
        ensure_contest_exists(&self.pool, contest_id).await?;

        let window = PageWindow::from(query);
        let (items, total) =
            DrawLedger::list_draws(&self.pool, contest_id, window.offset(), window.limit()).await?;

        let items: Vec<DrawResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, window, total))
    }

    /// 活动名额概况
    pub async fn get_capacity(&self, contest_id: i64) -> AppResult<CapacityResponse> {
        ensure_contest_exists(&self.pool, contest_id).await?;

        let snapshot = CapacityAccountant::snapshot(&self.pool, contest_id).await?;
        Ok(CapacityResponse {
            contest_id,
            total_slots: snapshot.total_slots,
            issued_winners: snapshot.issued_winners,
            remaining_slots: snapshot.remaining_slots()?,
        })
    }
}

/// 中奖人数写入 draws.total_winners（INT，必须为正）
fn winner_total(cmd: &DrawCommand) -> AppResult<i32> {
    i32::try_from(cmd.requested_count)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "Number of winners must be between 1 and {}, got {}",
                i32::MAX,
                cmd.requested_count
            ))
        })
}

/// 遇到并发冲突时重新执行 `op`，第 n 次重试前等待 n * `retry_backoff_ms`；
/// 超过 `max_conflict_retries` 后把冲突返回给调用方。
async fn retry_on_conflict<T, F, Fut>(
    config: &DrawConfig,
    contest_id: i64,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(AppError::ConcurrencyConflict(msg)) if attempt < config.max_conflict_retries => {
                attempt += 1;
                log::warn!(
                    "Draw for contest {contest_id} conflicted ({msg}), retry {attempt}/{}",
                    config.max_conflict_retries
                );
                let backoff = config.retry_backoff_ms * u64::from(attempt);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            other => return other,
        }
    }
}

async fn ensure_contest_exists<C: ConnectionTrait>(conn: &C, contest_id: i64) -> AppResult<()> {
    contests::Entity::find_by_id(contest_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contest {contest_id}")))?;
    Ok(())
}

/// 中奖记录关联参与者与奖品详情
async fn load_winner_details<C: ConnectionTrait>(
    conn: &C,
    draw_id: i64,
) -> AppResult<Vec<WinnerDetailResponse>> {
    let winners = DrawLedger::winners_of_draw(conn, draw_id).await?;

    let participant_ids: Vec<i64> = winners.iter().map(|w| w.participant_id).collect();
    let prize_ids: Vec<i64> = winners.iter().filter_map(|w| w.prize_id).collect();
    let participants = ParticipantSource::find_by_ids(conn, &participant_ids).await?;
    let prizes = PrizeInventory::find_by_ids(conn, &prize_ids).await?;

    winners
        .into_iter()
        .map(|w| {
            let participant = participants.get(&w.participant_id).cloned().ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "Winner {} references missing participant {}",
                    w.id, w.participant_id
                ))
            })?;
            let prize = match w.prize_id {
                Some(prize_id) => Some(prizes.get(&prize_id).cloned().ok_or_else(|| {
                    AppError::DataIntegrity(format!(
                        "Winner {} references missing prize {prize_id}",
                        w.id
                    ))
                })?),
                None => None,
            };
            Ok(WinnerDetailResponse::new(w, participant, prize))
        })
        .collect()
}
