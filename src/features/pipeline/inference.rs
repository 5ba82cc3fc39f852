use ndarray::{Array2, Array4, Ix2};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::sync::Mutex;

use crate::config::ModelConfig;
use crate::error::{PipelineError, StartupError};

/// 推理调用接口：`N × 3 × S × S` 输入 → `N × C` 原始 logits。
///
/// 进程内只加载一次，作为只读依赖注入到各 handler。
pub trait Classifier: Send + Sync {
    fn infer(&self, batch: Array4<f32>) -> Result<Array2<f32>, PipelineError>;
}

/// 基于 ONNX Runtime 的二分类模型会话。
pub struct OnnxClassifier {
    // ort 的 `Session::run` 需要 `&mut self`
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// 从模型文件创建会话（CPU）。文件不存在时返回 [`StartupError::ModelMissing`]。
    pub fn load(cfg: &ModelConfig) -> Result<Self, StartupError> {
        let path = cfg.model_path();
        if !path.is_file() {
            return Err(StartupError::ModelMissing(path.display().to_string()));
        }

        let load_err = |e: &dyn std::fmt::Display| StartupError::ModelLoad(e.to_string());

        let mut builder = Session::builder()
            .map_err(|e| load_err(&e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(&e))?;
        if cfg.intra_threads > 0 {
            builder = builder
                .with_intra_threads(cfg.intra_threads)
                .map_err(|e| load_err(&e))?;
        }
        let session = builder.commit_from_file(&path).map_err(|e| load_err(&e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| StartupError::ModelLoad("模型没有输入".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| StartupError::ModelLoad("模型没有输出".to_string()))?;

        tracing::info!(
            model = %path.display(),
            input = %input_name,
            output = %output_name,
            "模型加载成功"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn infer(&self, batch: Array4<f32>) -> Result<Array2<f32>, PipelineError> {
        let input = Tensor::from_array(batch)
            .map_err(|e| PipelineError::Inference(format!("cannot build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        let logits = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| PipelineError::Inference(e.to_string()))?;
        let logits = logits
            .into_dimensionality::<Ix2>()
            .map_err(|e| PipelineError::Inference(format!("unexpected output rank: {e}")))?;
        Ok(logits.to_owned())
    }
}

/// 执行一次批量推理，并校验输出形状为 `[N, C]`（C ≥ 2）。
pub fn run_batch(
    classifier: &dyn Classifier,
    batch: Array4<f32>,
) -> Result<Array2<f32>, PipelineError> {
    let expected = batch.shape()[0];
    let logits = classifier.infer(batch)?;
    let (rows, classes) = logits.dim();
    if rows != expected {
        return Err(PipelineError::Inference(format!(
            "model returned {rows} rows for a batch of {expected}"
        )));
    }
    if classes < 2 {
        return Err(PipelineError::Inference(format!(
            "model returned {classes} classes, expected at least 2"
        )));
    }
    Ok(logits)
}
