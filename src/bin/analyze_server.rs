//! 单图分析服务（POST /analyze）
//!
//! 输入尺寸固定为 224，CORS 完全放开，无健康检查。模型缺失时仍可启动，仅使用频域评分。

use markai_backend::app::build_analyze_app;
use markai_backend::features::pipeline::Preprocessor;
use markai_backend::shutdown::wait_for_signal;
use markai_backend::startup::{init_tracing, load_optional_classifier};
use markai_backend::{AnalyzeState, AppConfig};

/// 固定输入尺寸（不受 INPUT_SIZE 影响）
const ANALYZE_INPUT_SIZE: u32 = 224;

#[tokio::main]
async fn main() {
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            init_tracing(None);
            tracing::error!("Config init failed: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(Some(&config.logging.level));

    let state = AnalyzeState {
        classifier: load_optional_classifier(&config.model),
        preprocessor: Preprocessor::new(ANALYZE_INPUT_SIZE),
        ai_class_index: config.analyze.ai_class_index,
    };
    let app = build_analyze_app(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Analyze: http://{}/analyze", addr);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        wait_for_signal().await;
    });
    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }
}
