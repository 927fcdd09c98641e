use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde_json::json;
use thiserror::Error;

use crate::models::ApiError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No validated participants found for contest {contest_id}")]
    NoEligibleParticipants { contest_id: i64 },

    #[error(
        "Number of winners cannot exceed participants: requested {requested}, but only {eligible} validated participants"
    )]
    InsufficientParticipants { requested: i64, eligible: i64 },

    #[error(
        "Not enough prizes remaining: requested {requested}, but only {remaining} prize slots are available"
    )]
    InsufficientCapacity { requested: i64, remaining: i64 },

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(DbErr),
}

impl AppError {
    /// 机器可读的错误类型
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NoEligibleParticipants { .. } => "NO_ELIGIBLE_PARTICIPANTS",
            AppError::InsufficientParticipants { .. } => "INSUFFICIENT_PARTICIPANTS",
            AppError::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            AppError::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            AppError::DataIntegrity(_) => "DATA_INTEGRITY_ERROR",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }
}

/// 数据库错误分类:
/// - 唯一约束冲突 / 串行化失败 / SQLite BUSY -> ConcurrencyConflict
/// - 连接获取失败 / 连接断开 -> StoreUnavailable
/// - 其它 -> DatabaseError
impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
            return AppError::ConcurrencyConflict(msg);
        }

        match &err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                AppError::StoreUnavailable(err.to_string())
            }
            DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
            | DbErr::Query(RuntimeErr::SqlxError(sqlx_err)) => match sqlx_err {
                sea_orm::SqlxError::Database(db_err)
                    if db_err.code().is_some_and(|c| is_conflict_code(&c)) =>
                {
                    AppError::ConcurrencyConflict(db_err.message().to_string())
                }
                sea_orm::SqlxError::Io(_)
                | sea_orm::SqlxError::PoolTimedOut
                | sea_orm::SqlxError::PoolClosed => AppError::StoreUnavailable(err.to_string()),
                _ => AppError::DatabaseError(err),
            },
            _ => AppError::DatabaseError(err),
        }
    }
}

/// PostgreSQL: 40001 serialization_failure, 40P01 deadlock_detected, 23505 unique_violation
/// SQLite: 5 SQLITE_BUSY, 6 SQLITE_LOCKED, 517 SQLITE_BUSY_SNAPSHOT, 261 SQLITE_BUSY_RECOVERY,
/// 1555 / 2067 主键 / 唯一约束冲突
fn is_conflict_code(code: &str) -> bool {
    matches!(
        code,
        "40001" | "40P01" | "23505" | "5" | "6" | "261" | "517" | "1555" | "2067"
    )
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoEligibleParticipants { .. } | AppError::InsufficientParticipants { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InsufficientCapacity { .. } | AppError::ConcurrencyConflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::InvalidRequest(msg) => {
                log::warn!("Invalid request: {msg}");
                self.to_string()
            }
            AppError::NoEligibleParticipants { .. }
            | AppError::InsufficientParticipants { .. }
            | AppError::InsufficientCapacity { .. } => {
                log::warn!("Draw rejected: {self}");
                self.to_string()
            }
            AppError::NotFound(_) => self.to_string(),
            AppError::ConcurrencyConflict(msg) => {
                log::warn!("Concurrency conflict surfaced to caller: {msg}");
                "Draw conflicted with a concurrent draw, please retry".to_string()
            }
            AppError::DataIntegrity(msg) => {
                log::error!("Data integrity error: {msg}");
                self.to_string()
            }
            AppError::StoreUnavailable(msg) => {
                log::error!("Store unavailable: {msg}");
                "Data store unavailable, please retry later".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": ApiError::new(self.code(), message)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_reports_both_values() {
        let err = AppError::InsufficientCapacity {
            requested: 4,
            remaining: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("requested 4"));
        assert!(msg.contains("only 2"));
        assert_eq!(err.code(), "INSUFFICIENT_CAPACITY");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NoEligibleParticipants { contest_id: 1 }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::DataIntegrity("negative".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_errors_are_classified() {
        let err: AppError = DbErr::Custom("boom".into()).into();
        assert_eq!(err.code(), "DATABASE_ERROR");

        let err: AppError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert_eq!(err.code(), "STORE_UNAVAILABLE");

        let err: AppError =
            DbErr::Exec(RuntimeErr::SqlxError(sea_orm::SqlxError::PoolTimedOut)).into();
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_conflict_codes() {
        assert!(is_conflict_code("40001"));
        assert!(is_conflict_code("5"));
        assert!(!is_conflict_code("23503"));
    }
}
