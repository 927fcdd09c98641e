use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 活动名额计数器
/// 说明:
/// - issued_winners: 该活动累计已发放的中奖名额，与 winners 行数一致
/// - 开奖时使用条件更新 (issued_winners = 观察值) 原子占用名额
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contest_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub contest_id: i64,
    pub issued_winners: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
