use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::participant_entity as participants;

/// 参与者只读视图
pub struct ParticipantSource;

impl ParticipantSource {
    /// 某活动的有效参与者（validated = true），按报名时间升序，同一时间按 id 升序
    pub async fn eligible<C: ConnectionTrait>(
        conn: &C,
        contest_id: i64,
    ) -> Result<Vec<participants::Model>, DbErr> {
        participants::Entity::find()
            .filter(participants::Column::ContestId.eq(contest_id))
            .filter(participants::Column::Validated.eq(true))
            .order_by_asc(participants::Column::EntryTimestamp)
            .order_by_asc(participants::Column::Id)
            .all(conn)
            .await
    }

    pub async fn find_by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: &[i64],
    ) -> Result<HashMap<i64, participants::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let list = participants::Entity::find()
            .filter(participants::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await?;
        Ok(list.into_iter().map(|p| (p.id, p)).collect())
    }
}
