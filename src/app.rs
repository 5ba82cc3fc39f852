use axum::{Router, extract::DefaultBodyLimit, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::cors::build_cors_layer;
use crate::features::analyze::create_analyze_router;
use crate::features::classify::create_classify_router;
use crate::features::health::health_check;
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::{AnalyzeState, AppState};

/// /analyze 请求体上限（base64 图片）
pub const ANALYZE_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// 批量分类服务路由：/classify、/health、/docs
pub fn build_classify_app(state: AppState, cors: &CorsConfig) -> Router {
    Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(create_classify_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(build_cors_layer(cors))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// 单图分析服务路由：仅 /analyze，CORS 完全放开
pub fn build_analyze_app(state: AnalyzeState) -> Router {
    create_analyze_router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(ANALYZE_BODY_LIMIT))
        .layer(build_cors_layer(&CorsConfig::wide_open()))
        .layer(axum::middleware::from_fn(request_id_middleware))
}
