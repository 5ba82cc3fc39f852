use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型（请求级错误）
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 请求体解析错误
    #[error("请求体解析错误: {0}")]
    Json(String),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 单张图片在流水线中的失败原因。
///
/// Display 文本直接写入逐项结果的 `error` 字段，需保持人类可读。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// 远程图片抓取失败（网络错误 / 非 2xx / 超限）
    #[error("{0}")]
    Acquisition(String),

    /// 内联数据非法或图片字节无法解码
    #[error("{0}")]
    Decode(String),

    /// 无法转换为模型所需张量
    #[error("{0}")]
    Preprocess(String),

    /// 推理引擎调用失败（作用于整个批次）
    #[error("{0}")]
    Inference(String),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Acquisition(_) => "acquisition",
            PipelineError::Decode(_) => "decode",
            PipelineError::Preprocess(_) => "preprocess",
            PipelineError::Inference(_) => "inference",
        }
    }
}

/// 启动阶段错误（模型加载 / 配置）
#[derive(Error, Debug)]
pub enum StartupError {
    /// 模型文件不存在
    #[error("模型文件不存在: {0}")]
    ModelMissing(String),

    /// 推理会话创建失败
    #[error("模型加载失败: {0}")]
    ModelLoad(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    /// HTTP Client 构建失败
    #[error("HTTP Client 构建失败: {0}")]
    HttpClient(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Validation Failed")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 422)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Json(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        AppError::Json(rej.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("后台任务异常: {err}"))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Acquisition(format!("request timed out: {err}"))
        } else if let Some(status) = err.status() {
            PipelineError::Acquisition(format!("HTTP status {status}"))
        } else {
            PipelineError::Acquisition(err.to_string())
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::Decode(format!("cannot identify image: {err}"))
    }
}
