use crate::models::*;
use crate::services::DrawService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/draws/execute",
    tag = "draw",
    request_body = ExecuteDrawRequest,
    responses(
        (status = 200, description = "开奖成功", body = DrawExecutionResponse),
        (status = 400, description = "请求参数错误", body = ApiError),
        (status = 404, description = "活动不存在", body = ApiError),
        (status = 409, description = "名额不足或并发冲突", body = ApiError),
        (status = 422, description = "有效参与者不足", body = ApiError),
        (status = 503, description = "数据存储不可用", body = ApiError)
    )
)]
/// 执行一次随机开奖:
/// 1. 校验请求
/// 2. 读取有效参与者并校验人数与剩余名额
/// 3. 原子占用名额并写入开奖及中奖记录
/// 4. 返回开奖结果（中奖者附带参与者与奖品详情）
pub async fn execute_draw(
    service: web::Data<DrawService>,
    body: web::Json<ExecuteDrawRequest>,
) -> Result<HttpResponse> {
    let cmd = match DrawCommand::try_from(body.into_inner()) {
        Ok(cmd) => cmd,
        Err(e) => return Ok(e.error_response()),
    };
    log::info!(
        "Draw requested: contest={} operator={:?} winners={}",
        cmd.contest_id,
        cmd.operator_id,
        cmd.requested_count
    );
    match service.execute_draw(cmd).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{draw_id}",
    tag = "draw",
    params(
        ("draw_id" = i64, Path, description = "开奖ID")
    ),
    responses(
        (status = 200, description = "获取开奖详情成功", body = DrawDetailResponse),
        (status = 404, description = "开奖不存在", body = ApiError)
    )
)]
/// 获取开奖详情及中奖者
pub async fn get_draw(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_draw(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/contests/{contest_id}/draws",
    tag = "draw",
    params(
        ("contest_id" = i64, Path, description = "活动ID"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "获取开奖历史成功", body = crate::utils::DrawPageResponse),
        (status = 404, description = "活动不存在", body = ApiError)
    )
)]
/// 分页获取活动开奖历史（倒序）
pub async fn list_contest_draws(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
    query: web::Query<DrawListQuery>,
) -> Result<HttpResponse> {
    match service.list_draws(path.into_inner(), &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/contests/{contest_id}/capacity",
    tag = "draw",
    params(
        ("contest_id" = i64, Path, description = "活动ID")
    ),
    responses(
        (status = 200, description = "获取名额概况成功", body = CapacityResponse),
        (status = 404, description = "活动不存在", body = ApiError),
        (status = 500, description = "名额数据不一致", body = ApiError)
    )
)]
/// 活动总名额 / 已发放 / 剩余
pub async fn get_contest_capacity(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_capacity(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .route("/execute", web::post().to(execute_draw))
            .route("/{draw_id}", web::get().to(get_draw)),
    )
    .service(
        web::scope("/contests")
            .route("/{contest_id}/draws", web::get().to(list_contest_draws))
            .route("/{contest_id}/capacity", web::get().to(get_contest_capacity)),
    );
}
