use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{
    DrawMode, PrizeStatus, contest_allocation_entity as allocations, draw_entity as draws,
    winner_entity as winners,
};
use crate::models::WinnerDraft;

/// 开奖账本：开奖记录、中奖记录与活动名额计数器
pub struct DrawLedger;

impl DrawLedger {
    /// 某活动已发放的中奖记录数（跨所有开奖）
    pub async fn issued_winner_count<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> Result<i64, DbErr> {
        let count = winners::Entity::find()
            .inner_join(draws::Entity)
            .filter(draws::Column::ContestId.eq(contest_id))
            .count(conn)
            .await?;
        Ok(count as i64)
    }

    /// 某活动所有开奖请求人数之和（Σ total_winners）
    pub async fn requested_winner_total<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> Result<i64, DbErr> {
        let total: Option<i64> = draws::Entity::find()
            .select_only()
            .column_as(draws::Column::TotalWinners.sum(), "requested_total")
            .filter(draws::Column::ContestId.eq(contest_id))
            .into_tuple::<Option<i64>>()
            .one(conn)
            .await?
            .flatten();
        Ok(total.unwrap_or(0))
    }

    /// 锁定活动的名额计数器行（SELECT ... FOR UPDATE），同一活动的开奖在此排队，
    /// 持锁之后的读取都能看到此前已提交的开奖。
    ///
    /// 计数器不存在时以当前已发放数初始化；两个事务同时初始化时，
    /// 后插入的一方会因主键冲突（或 SQLite 快照过期）失败，由上层按并发冲突整体重试。
    /// SQLite 不支持行锁，FOR UPDATE 会被忽略，事务内读取本身就是同一快照。
    pub async fn lock_allocation<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> Result<allocations::Model, DbErr> {
        if let Some(m) = allocations::Entity::find_by_id(contest_id)
            .lock_exclusive()
            .one(conn)
            .await?
        {
            return Ok(m);
        }

        let issued_winners = Self::issued_winner_count(conn, contest_id).await?;
        allocations::ActiveModel {
            contest_id: Set(contest_id),
            issued_winners: Set(issued_winners),
            updated_at: Set(Utc::now()),
        }
        .insert(conn)
        .await
    }

    /// 原子占用名额:
    /// UPDATE contest_allocations SET issued_winners = issued_winners + count
    /// WHERE contest_id = ? AND issued_winners = observed AND issued_winners + count <= total_slots
    ///
    /// 返回 false 表示计数器已被其它开奖修改（或名额不足），本次不得继续。
    pub async fn reserve_slots<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
        observed_issued: i64,
        count: i64,
        total_slots: i64,
    ) -> Result<bool, DbErr> {
        let result = allocations::Entity::update_many()
            .col_expr(
                allocations::Column::IssuedWinners,
                Expr::col(allocations::Column::IssuedWinners).add(count),
            )
            .col_expr(allocations::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(allocations::Column::ContestId.eq(contest_id))
            .filter(allocations::Column::IssuedWinners.eq(observed_issued))
            .filter(
                Expr::expr(Expr::col(allocations::Column::IssuedWinners).add(count))
                    .lte(total_slots),
            )
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn create_draw<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
        executed_by: Option<String>,
        total_winners: i32,
    ) -> Result<draws::Model, DbErr> {
        draws::ActiveModel {
            contest_id: Set(contest_id),
            draw_mode: Set(DrawMode::Random),
            executed_by: Set(executed_by),
            total_winners: Set(total_winners),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    pub async fn insert_winners<C: ConnectionTrait>(
        conn: &C,
        draw_id: i64,
        drafts: &[WinnerDraft],
    ) -> Result<(), DbErr> {
        if drafts.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let rows = drafts.iter().map(|d| winners::ActiveModel {
            draw_id: Set(draw_id),
            participant_id: Set(d.participant_id),
            prize_id: Set(d.prize_id),
            position: Set(d.position),
            winner_name: Set(d.winner_name.clone()),
            prize_status: Set(PrizeStatus::Pending),
            notified: Set(false),
            created_at: Set(now),
            ..Default::default()
        });
        winners::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    pub async fn find_draw<C: ConnectionTrait>(
        conn: &C,
        draw_id: i64,
    ) -> Result<Option<draws::Model>, DbErr> {
        draws::Entity::find_by_id(draw_id).one(conn).await
    }

    /// 某次开奖的中奖记录，按打乱后的顺序
    pub async fn winners_of_draw<C: ConnectionTrait>(
        conn: &C,
        draw_id: i64,
    ) -> Result<Vec<winners::Model>, DbErr> {
        winners::Entity::find()
            .filter(winners::Column::DrawId.eq(draw_id))
            .order_by_asc(winners::Column::Position)
            .all(conn)
            .await
    }

    /// 开奖历史（倒序），返回 (当前页, 总数)
    pub async fn list_draws<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<draws::Model>, i64), DbErr> {
        let base_query = draws::Entity::find().filter(draws::Column::ContestId.eq(contest_id));

        let total = base_query.clone().count(conn).await? as i64;

        let items = base_query
            .order_by_desc(draws::Column::CreatedAt)
            .order_by_desc(draws::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(conn)
            .await?;

        Ok((items, total))
    }
}
