use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件
///
/// `"*"` 表示任意 Origin。启用凭证时浏览器不接受通配符，此时回显请求的
/// Origin/Method/Header，行为与旧服务一致。
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let (any_origin, origins) = parse_allowed_origins(&cors.allowed_origins);
    if !any_origin && origins.is_empty() {
        tracing::warn!("CORS allowed_origins 为空，跨域请求将全部被拒绝");
    }

    let layer = CorsLayer::new();
    if cors.allow_credentials {
        let origin = if any_origin {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(origins)
        };
        layer
            .allow_origin(origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        let layer = if any_origin {
            layer.allow_origin(Any)
        } else {
            layer.allow_origin(origins)
        };
        layer.allow_methods(Any).allow_headers(Any)
    }
}

fn parse_allowed_origins(values: &[String]) -> (bool, Vec<HeaderValue>) {
    let mut any = false;
    let mut origins = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            any = true;
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => origins.push(v),
            Err(_) => tracing::warn!("CORS allowed_origins 含无效值: {}", value),
        }
    }
    (any, origins)
}
