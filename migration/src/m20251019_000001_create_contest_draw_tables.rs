use sea_orm_migration::prelude::*;

/// Contests (活动)
#[derive(DeriveIden)]
enum Contests {
    Table,
    Id,
    Name,
    CreatedAt,
}

/// Participants (报名参与者，由对话渠道登记)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    ContestId,
    Name,
    PhoneNumber,
    Validated,
    EntryTimestamp,
    CreatedAt,
}

/// Prizes (奖品配置，quantity 即奖品名额)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    ContestId,
    Name,
    Description,
    Quantity,
    CreatedAt,
}

/// Draws (开奖记录)
#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
    ContestId,
    DrawMode,
    ExecutedBy,
    TotalWinners,
    CreatedAt,
}

/// Winners (中奖记录)
#[derive(DeriveIden)]
enum Winners {
    Table,
    Id,
    DrawId,
    ParticipantId,
    PrizeId,
    Position,
    WinnerName,
    PrizeStatus,
    Notified,
    CreatedAt,
}

/// Contest Allocations (每个活动已发放名额计数器)
#[derive(DeriveIden)]
enum ContestAllocations {
    Table,
    ContestId,
    IssuedWinners,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 外键均不做级联删除：开奖与中奖记录需要保留用于审计。
/// contest_allocations.issued_winners 与 winners 行数保持一致，
/// 开奖时通过条件更新 (WHERE issued_winners = 观察值) 实现原子扣减名额。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 活动表
        manager
            .create_table(
                Table::create()
                    .table(Contests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contests::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Contests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 参与者表
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::ContestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participants::Name).string_len(255).null())
                    .col(
                        ColumnDef::new(Participants::PhoneNumber)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Validated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::EntryTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_contest")
                            .from(Participants::Table, Participants::ContestId)
                            .to(Contests::Table, Contests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 有效参与者按报名时间读取
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_contest_validated_entry")
                    .table(Participants::Table)
                    .col(Participants::ContestId)
                    .col(Participants::Validated)
                    .col(Participants::EntryTimestamp)
                    .to_owned(),
            )
            .await?;

        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::ContestId).big_integer().not_null())
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::Description).text().null())
                    .col(
                        ColumnDef::new(Prizes::Quantity)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(Prizes::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prizes_contest")
                            .from(Prizes::Table, Prizes::ContestId)
                            .to(Contests::Table, Contests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_contest")
                    .table(Prizes::Table)
                    .col(Prizes::ContestId)
                    .to_owned(),
            )
            .await?;

        // 开奖表
        manager
            .create_table(
                Table::create()
                    .table(Draws::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Draws::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Draws::ContestId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Draws::DrawMode)
                            .string_len(16)
                            .not_null()
                            .default("random"),
                    )
                    .col(ColumnDef::new(Draws::ExecutedBy).string_len(255).null())
                    .col(
                        ColumnDef::new(Draws::TotalWinners)
                            .integer()
                            .not_null()
                            .check(Expr::col(Draws::TotalWinners).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Draws::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draws_contest")
                            .from(Draws::Table, Draws::ContestId)
                            .to(Contests::Table, Contests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draws_contest")
                    .table(Draws::Table)
                    .col(Draws::ContestId)
                    .to_owned(),
            )
            .await?;

        // 中奖表
        manager
            .create_table(
                Table::create()
                    .table(Winners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Winners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Winners::DrawId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Winners::ParticipantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Winners::PrizeId).big_integer().null())
                    .col(ColumnDef::new(Winners::Position).integer().not_null())
                    .col(ColumnDef::new(Winners::WinnerName).string_len(255).null())
                    .col(
                        ColumnDef::new(Winners::PrizeStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Winners::Notified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Winners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_draw")
                            .from(Winners::Table, Winners::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_participant")
                            .from(Winners::Table, Winners::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_prize")
                            .from(Winners::Table, Winners::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一次开奖中同一参与者只能出现一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_draw_participant_unique")
                    .table(Winners::Table)
                    .col(Winners::DrawId)
                    .col(Winners::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_participant")
                    .table(Winners::Table)
                    .col(Winners::ParticipantId)
                    .to_owned(),
            )
            .await?;

        // 名额计数器（首次开奖时惰性创建）
        manager
            .create_table(
                Table::create()
                    .table(ContestAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContestAllocations::ContestId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContestAllocations::IssuedWinners)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(ContestAllocations::IssuedWinners).gte(0)),
                    )
                    .col(
                        ColumnDef::new(ContestAllocations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contest_allocations_contest")
                            .from(ContestAllocations::Table, ContestAllocations::ContestId)
                            .to(Contests::Table, Contests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：计数器 -> 中奖 -> 开奖 -> 奖品 -> 参与者 -> 活动
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ContestAllocations::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Winners::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Draws::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Contests::Table).to_owned())
            .await?;

        Ok(())
    }
}
