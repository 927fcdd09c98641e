use actix_web::{HttpResponse, Result, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务与数据库正常"),
        (status = 503, description = "数据库不可用")
    )
)]
pub async fn health(pool: web::Data<DatabaseConnection>) -> Result<HttpResponse> {
    let database_up = match pool.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Health check database ping failed: {e}");
            false
        }
    };

    let body = json!({
        "status": if database_up { "healthy" } else { "degraded" },
        "database": if database_up { "up" } else { "down" },
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    });

    if database_up {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(body))
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
