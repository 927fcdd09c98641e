pub mod draw;
pub mod health;

pub use draw::draw_config;
pub use health::health_config;

use crate::error::AppError;
use actix_web::{ResponseError, error::InternalError, web};

/// JSON 请求体解析失败统一返回 INVALID_REQUEST
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let response = AppError::InvalidRequest(err.to_string()).error_response();
            InternalError::from_response(err, response).into()
        })
}

/// 应用路由（health 位于根路径，其余位于 /api/v1）
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .configure(health_config)
        .service(web::scope("/api/v1").configure(draw_config));
}
