use serde::{Deserialize, Serialize};

use crate::features::pipeline::BlendedScore;

/// 单图分析请求
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    /// base64 图片（可带 `data:<mime>;base64,` 前缀）
    pub image: String,
}

/// 评分细节
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyzeDetails {
    /// 频域伪影方差
    pub fft_var: f64,
    /// 融合前的模型概率（无模型时为 0）
    pub model_prob: f64,
}

/// 单图分析响应。任何失败都返回 `{"is_ai": false, "confidence": 0}`。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    pub is_ai: bool,
    /// 融合后的得分，未裁剪到 [0,1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AnalyzeDetails>,
}

impl AnalyzeResponse {
    pub fn neutral() -> Self {
        Self {
            is_ai: false,
            confidence: 0.0,
            details: None,
        }
    }
}

impl From<BlendedScore> for AnalyzeResponse {
    fn from(s: BlendedScore) -> Self {
        Self {
            is_ai: s.is_ai,
            confidence: s.score,
            details: Some(AnalyzeDetails {
                fft_var: s.fft_var,
                model_prob: s.model_prob,
            }),
        }
    }
}
