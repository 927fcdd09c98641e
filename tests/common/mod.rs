#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use contest_draw_backend::AppResult;
use contest_draw_backend::config::DrawConfig;
use contest_draw_backend::database::run_migrations;
use contest_draw_backend::entities::{
    contest_allocation_entity as allocations, contest_entity as contests, draw_entity as draws,
    participant_entity as participants, prize_entity as prizes, winner_entity as winners,
};
use contest_draw_backend::external::WinnerNotifier;
use contest_draw_backend::models::DrawExecutionResponse;
use contest_draw_backend::services::DrawService;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use tempfile::TempDir;

/// 单连接内存 SQLite（多个连接会各自拥有独立的内存库）
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

/// 文件型 SQLite（WAL，多连接），事务可以真正并行执行
pub async fn setup_file_db(dir: &TempDir, connections: u32) -> DatabaseConnection {
    let path = dir.path().join("contest_draw.db");
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    db.execute_unprepared("PRAGMA journal_mode=WAL").await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

/// 由 TEST_DATABASE_URL 指定的 PostgreSQL；未设置时返回 None
pub async fn setup_postgres(connections: u32) -> Option<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let mut options = ConnectOptions::new(url);
    options.max_connections(connections).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    run_migrations(&db).await.unwrap();
    Some(db)
}

pub fn draw_config(seed: u64) -> DrawConfig {
    DrawConfig {
        max_conflict_retries: 3,
        retry_backoff_ms: 1,
        rng_seed: Some(seed),
    }
}

/// 记录收到通知的开奖ID
#[derive(Default)]
pub struct RecordingNotifier {
    pub draws: Mutex<Vec<i64>>,
}

#[async_trait]
impl WinnerNotifier for RecordingNotifier {
    async fn winners_drawn(&self, outcome: &DrawExecutionResponse) -> AppResult<()> {
        self.draws.lock().unwrap().push(outcome.draw.id);
        Ok(())
    }
}

pub fn service(db: &DatabaseConnection, seed: u64) -> (DrawService, Arc<RecordingNotifier>) {
    service_with(db, draw_config(seed))
}

pub fn service_with(
    db: &DatabaseConnection,
    config: DrawConfig,
) -> (DrawService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = DrawService::new(db.clone(), config, notifier.clone());
    (service, notifier)
}

pub async fn create_contest(db: &DatabaseConnection, name: &str) -> i64 {
    contests::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// 按报名时间递增添加参与者，返回 id 列表
pub async fn add_participants(
    db: &DatabaseConnection,
    contest_id: i64,
    count: usize,
    validated: bool,
) -> Vec<i64> {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let model = participants::ActiveModel {
            contest_id: Set(contest_id),
            name: Set(Some(format!("Entrant {contest_id}-{i}"))),
            phone_number: Set(Some(format!("+1555000{i:04}"))),
            validated: Set(validated),
            entry_timestamp: Set(base + Duration::minutes(i as i64)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        ids.push(model.id);
    }
    ids
}

pub async fn add_prize(db: &DatabaseConnection, contest_id: i64, name: &str, quantity: i32) -> i64 {
    prizes::ActiveModel {
        contest_id: Set(contest_id),
        name: Set(name.to_string()),
        description: Set(None),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn draw_count(db: &DatabaseConnection, contest_id: i64) -> u64 {
    draws::Entity::find()
        .filter(draws::Column::ContestId.eq(contest_id))
        .count(db)
        .await
        .unwrap()
}

pub async fn winner_count(db: &DatabaseConnection, contest_id: i64) -> u64 {
    winners::Entity::find()
        .inner_join(draws::Entity)
        .filter(draws::Column::ContestId.eq(contest_id))
        .count(db)
        .await
        .unwrap()
}

pub async fn allocation_count(db: &DatabaseConnection) -> u64 {
    allocations::Entity::find().count(db).await.unwrap()
}
