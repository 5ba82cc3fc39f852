use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::classify::handler::classify,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
        crate::features::classify::models::ClassifyRequest,
        crate::features::classify::models::ClassifyResult,
        crate::features::classify::models::ClassifyResponse,
    )),
    tags(
        (
            name = "Classify",
            description = "批量分类：按 URL 抓取图片，返回每张图片为 AI 生成的概率。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "MarkAI API",
        version = env!("CARGO_PKG_VERSION"),
        description = "AI 生成图片检测服务（Axum + ONNX Runtime）。"
    )
)]
pub struct ApiDoc;
