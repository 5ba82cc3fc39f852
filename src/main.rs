use markai_backend::app::build_classify_app;
use markai_backend::features::pipeline::{ImageAcquirer, Preprocessor};
use markai_backend::http::build_fetch_client;
use markai_backend::shutdown::wait_for_signal;
use markai_backend::startup::{init_tracing, load_classifier};
use markai_backend::{AppConfig, AppState};

#[tokio::main]
async fn main() {
    // 配置先于日志加载，日志级别来自配置
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            init_tracing(None);
            tracing::error!("Config init failed: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(Some(&config.logging.level));
    tracing::info!("配置已加载: {:?}", AppConfig::config_path());

    // 无模型不对外服务
    let classifier = match load_classifier(&config.model) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let client = match build_fetch_client(&config.fetch) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        classifier,
        acquirer: ImageAcquirer::new(client, config.fetch.max_bytes),
        preprocessor: Preprocessor::new(config.model.input_size),
        ai_class_index: config.classify.ai_class_index,
        max_images: config.classify.max_images,
        fetch_concurrency: config.classify.fetch_concurrency,
    };
    let app = build_classify_app(state, &config.cors);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Classify: http://{}/classify", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!(
        "Input size: {}, CORS origins: {:?}",
        config.model.input_size,
        config.cors.allowed_origins
    );

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        wait_for_signal().await;
        tracing::info!("开始优雅关闭HTTP服务器...");
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
