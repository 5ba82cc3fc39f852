use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::post,
};

use crate::features::analyze::models::{AnalyzeRequest, AnalyzeResponse};
use crate::features::analyze::service::analyze_payload;
use crate::state::AnalyzeState;

/// 单图分析。任何失败（请求体非法、base64 非法、图片无法解码、推理失败）
/// 都返回中性结果而不是 HTTP 错误。
pub async fn analyze(
    State(state): State<AnalyzeState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Json<AnalyzeResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rej) => {
            tracing::warn!("analyze 请求体无效: {}", rej.body_text());
            return Json(AnalyzeResponse::neutral());
        }
    };

    let outcome = tokio::task::spawn_blocking(move || analyze_payload(&state, &req.image)).await;
    match outcome {
        Ok(Ok(resp)) => Json(resp),
        Ok(Err(e)) => {
            tracing::warn!(kind = e.kind(), "analyze 失败: {}", e);
            Json(AnalyzeResponse::neutral())
        }
        Err(e) => {
            tracing::error!("analyze 后台任务异常: {}", e);
            Json(AnalyzeResponse::neutral())
        }
    }
}

pub fn create_analyze_router() -> Router<AnalyzeState> {
    Router::<AnalyzeState>::new().route("/analyze", post(analyze))
}
