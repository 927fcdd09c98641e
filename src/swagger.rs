use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DrawMode, PrizeStatus};
use crate::handlers;
use crate::models::*;
use crate::utils::{DrawPageResponse, PaginationInfo};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::draw::execute_draw,
        handlers::draw::get_draw,
        handlers::draw::list_contest_draws,
        handlers::draw::get_contest_capacity,
        handlers::health::health,
    ),
    components(
        schemas(
            ExecuteDrawRequest,
            DrawResponse,
            DrawMode,
            PrizeStatus,
            ParticipantSummary,
            PrizeSummary,
            WinnerDetailResponse,
            DrawDetailResponse,
            DrawExecutionResponse,
            CapacityResponse,
            DrawListQuery,
            DrawPageResponse,
            PaginationInfo,
            ApiError,
        )
    ),
    tags(
        (name = "draw", description = "Contest draw API"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Contest Draw Backend API",
        version = "1.0.0",
        description = "Contest prize draw REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
