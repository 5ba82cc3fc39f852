use ndarray::Axis;

use crate::error::PipelineError;
use crate::features::analyze::models::AnalyzeResponse;
use crate::features::pipeline::frequency::artifact_variance;
use crate::features::pipeline::{
    Preprocessor, ai_probabilities, blend, decode_base64_payload, run_batch,
};
use crate::state::AnalyzeState;

/// 解码内联图片并给出融合评分（同步执行，调用方负责放到阻塞线程池）。
pub fn analyze_payload(
    state: &AnalyzeState,
    payload: &str,
) -> Result<AnalyzeResponse, PipelineError> {
    let bytes = decode_base64_payload(payload)?;
    let img = Preprocessor::decode(&bytes)?;
    let fft_var = artifact_variance(&img);

    let model_prob = match &state.classifier {
        Some(classifier) => {
            let tensor = state.preprocessor.to_tensor(&img)?;
            let logits = run_batch(classifier.as_ref(), tensor.insert_axis(Axis(0)))?;
            ai_probabilities(&logits, state.ai_class_index)?
                .first()
                .copied()
                .map(f64::from)
                .ok_or_else(|| PipelineError::Inference("empty model output".to_string()))?
        }
        // 无模型：仅频域评分
        None => 0.0,
    };

    let score = blend(model_prob, fft_var);
    tracing::debug!(
        model_prob = score.model_prob,
        fft_var = score.fft_var,
        score = score.score,
        is_ai = score.is_ai,
        "analyze 评分"
    );
    Ok(score.into())
}
