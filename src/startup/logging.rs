use tracing_subscriber::EnvFilter;

/// 默认日志过滤器
pub const DEFAULT_FILTER: &str = "markai_backend=info,tower_http=info";

/// 初始化全局 tracing 订阅者。`RUST_LOG` 优先，其次为配置中的级别。
///
/// 重复调用是安全的（仅第一次生效）。
pub fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => EnvFilter::new(format!("markai_backend={level},tower_http={level}")),
        None => EnvFilter::new(DEFAULT_FILTER),
    });
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
