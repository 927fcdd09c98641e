use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::prize_entity as prizes;

/// 奖品名额只读视图
pub struct PrizeInventory;

impl PrizeInventory {
    /// 活动总名额 = Σ quantity（无奖品时为 0）
    pub async fn total_slots<C: ConnectionTrait>(conn: &C, contest_id: i64) -> Result<i64, DbErr> {
        let total: Option<i64> = prizes::Entity::find()
            .select_only()
            .column_as(prizes::Column::Quantity.sum(), "total_slots")
            .filter(prizes::Column::ContestId.eq(contest_id))
            .into_tuple::<Option<i64>>()
            .one(conn)
            .await?
            .flatten();
        Ok(total.unwrap_or(0))
    }

    pub async fn list_for_contest<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> Result<Vec<prizes::Model>, DbErr> {
        prizes::Entity::find()
            .filter(prizes::Column::ContestId.eq(contest_id))
            .order_by_asc(prizes::Column::Id)
            .all(conn)
            .await
    }

    pub async fn find_by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: &[i64],
    ) -> Result<HashMap<i64, prizes::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let list = prizes::Entity::find()
            .filter(prizes::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await?;
        Ok(list.into_iter().map(|p| (p.id, p)).collect())
    }
}
