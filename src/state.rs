use std::sync::Arc;

use crate::features::pipeline::{Classifier, ImageAcquirer, Preprocessor};

/// /classify 服务共享状态
#[derive(Clone)]
pub struct AppState {
    /// 启动时加载的只读推理会话
    pub classifier: Arc<dyn Classifier>,
    pub acquirer: ImageAcquirer,
    pub preprocessor: Preprocessor,
    /// 输出中代表 “AI 生成” 的类别下标
    pub ai_class_index: usize,
    /// 单次请求最多图片数
    pub max_images: usize,
    /// 单次请求内并发抓取数
    pub fetch_concurrency: usize,
}

/// /analyze 服务共享状态（模型缺失时降级为仅频域评分）
#[derive(Clone)]
pub struct AnalyzeState {
    pub classifier: Option<Arc<dyn Classifier>>,
    pub preprocessor: Preprocessor,
    pub ai_class_index: usize,
}
