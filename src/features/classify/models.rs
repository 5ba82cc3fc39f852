use serde::{Deserialize, Serialize};

/// 批量分类请求
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[schema(example = json!({"images": ["https://example.com/a.jpg", "https://example.com/b.png"]}))]
pub struct ClassifyRequest {
    /// 待分类图片 URL 列表
    pub images: Vec<String>,
}

/// 单张图片的分类结果。失败时 `ok=false`、`prob_ai=null`。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClassifyResult {
    /// 原始请求中的 URL
    pub url: String,
    pub ok: bool,
    /// 失败原因（成功时为 null）
    pub error: Option<String>,
    /// AI 生成概率 [0,1]（失败时为 null）
    #[schema(example = 0.93)]
    pub prob_ai: Option<f32>,
}

impl ClassifyResult {
    pub fn scored(url: String, prob_ai: f32) -> Self {
        Self {
            url,
            ok: true,
            error: None,
            prob_ai: Some(prob_ai),
        }
    }

    pub fn failed(url: String, error: String) -> Self {
        Self {
            url,
            ok: false,
            error: Some(error),
            prob_ai: None,
        }
    }
}

/// 批量分类响应，与请求顺序逐一对应
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClassifyResponse {
    pub results: Vec<ClassifyResult>,
}
