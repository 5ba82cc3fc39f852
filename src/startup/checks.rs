use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::StartupError;
use crate::features::pipeline::{Classifier, OnnxClassifier};

/// 加载模型会话。失败时由调用方决定是否退出进程（/classify 服务不允许无模型运行）。
pub fn load_classifier(cfg: &ModelConfig) -> Result<Arc<dyn Classifier>, StartupError> {
    tracing::info!("🔍 正在加载 ONNX 模型: {}", cfg.path);
    let classifier = OnnxClassifier::load(cfg)?;
    Ok(Arc::new(classifier))
}

/// 加载模型会话；失败时降级为 `None`（/analyze 服务仅使用频域评分）。
pub fn load_optional_classifier(cfg: &ModelConfig) -> Option<Arc<dyn Classifier>> {
    match load_classifier(cfg) {
        Ok(c) => Some(c),
        Err(StartupError::ModelMissing(path)) => {
            tracing::warn!("⚠️ 未找到模型文件 {}，将仅使用频域评分（模型概率固定为 0）", path);
            None
        }
        Err(e) => {
            tracing::warn!("⚠️ {}，将仅使用频域评分（模型概率固定为 0）", e);
            None
        }
    }
}
