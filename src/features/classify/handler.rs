use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::post,
};

use crate::error::AppError;
use crate::features::classify::models::{ClassifyRequest, ClassifyResponse};
use crate::features::classify::service::classify_urls;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/classify",
    summary = "批量判断图片是否为 AI 生成",
    description = "按 URL 抓取图片并进行一次批量推理。单张图片失败不影响其余图片，结果顺序与请求一致。",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "逐项结果", body = ClassifyResponse),
        (
            status = 400,
            description = "请求体不是合法 JSON",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        ),
        (
            status = 422,
            description = "图片数量超过上限",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        ),
        (
            status = 500,
            description = "服务器内部错误",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Classify"
)]
pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let Json(req) = payload?;
    if req.images.len() > state.max_images {
        return Err(AppError::Validation(format!(
            "images 数量 {} 超过上限 {}",
            req.images.len(),
            state.max_images
        )));
    }

    let results = classify_urls(&state, &req.images).await?;
    let failed = results.iter().filter(|r| !r.ok).count();
    tracing::info!(total = results.len(), failed, "classify 完成");

    Ok(Json(ClassifyResponse { results }))
}

pub fn create_classify_router() -> Router<AppState> {
    Router::<AppState>::new().route("/classify", post(classify))
}
