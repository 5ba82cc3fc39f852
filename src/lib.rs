/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 启动模块（日志、模型加载）
pub mod startup;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 优雅退出模块
pub mod shutdown;

/// HTTP Client 构建
pub mod http;

/// CORS 中间件构建
pub mod cors;

/// request_id 中间件
pub mod request_id;

/// OpenAPI 文档
pub mod openapi;

/// 路由组装
pub mod app;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::{AppError, PipelineError, StartupError};
pub use state::{AnalyzeState, AppState};
