use std::panic::{AssertUnwindSafe, catch_unwind};

use futures_util::StreamExt;
use futures_util::stream;
use ndarray::Array3;

use crate::error::{AppError, PipelineError};
use crate::features::classify::models::ClassifyResult;
use crate::features::pipeline::{ai_probabilities, run_batch, stack_batch, truncate_source};
use crate::state::AppState;

/// 错误信息中 URL 的最大字符数
pub const MAX_SOURCE_CHARS: usize = 100;

/// 执行单项处理；解码器内部 panic 转为该项的 `Preprocess` 错误，不波及同批其他图片。
fn isolate_item<T>(f: impl FnOnce() -> Result<T, PipelineError>) -> Result<T, PipelineError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(PipelineError::Preprocess(format!("image processing panicked: {reason}")))
    })
}

/// 批量分类：逐项获取与预处理（失败互不影响），成功项合并为一次推理，再按原顺序回填。
pub async fn classify_urls(
    state: &AppState,
    urls: &[String],
) -> Result<Vec<ClassifyResult>, AppError> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    // 并发抓取，buffered 保证输出顺序与输入一致
    let fetches: Vec<_> = urls.iter().map(|url| state.acquirer.fetch(url)).collect();
    let fetched: Vec<Result<Vec<u8>, PipelineError>> = stream::iter(fetches)
        .buffered(state.fetch_concurrency.max(1))
        .collect()
        .await;

    let preprocessor = state.preprocessor;
    let prepared: Vec<Result<Array3<f32>, PipelineError>> = tokio::task::spawn_blocking(move || {
        fetched
            .into_iter()
            .map(|bytes| {
                bytes.and_then(|b| isolate_item(|| preprocessor.bytes_to_tensor(&b)))
            })
            .collect()
    })
    .await?;

    let mut results: Vec<Option<ClassifyResult>> = vec![None; urls.len()];
    let mut batch = Vec::new();
    // batch 下标 → 原始下标
    let mut origin = Vec::new();

    for (i, item) in prepared.into_iter().enumerate() {
        match item {
            Ok(tensor) => {
                origin.push(i);
                batch.push(tensor);
            }
            Err(e) => {
                let msg = format!(
                    "Failed to process {}: {}",
                    truncate_source(&urls[i], MAX_SOURCE_CHARS),
                    e
                );
                tracing::warn!(kind = e.kind(), "{}", msg);
                results[i] = Some(ClassifyResult::failed(urls[i].clone(), msg));
            }
        }
    }

    if !batch.is_empty() {
        let classifier = state.classifier.clone();
        let ai_class_index = state.ai_class_index;
        let batch_size = batch.len();
        let outcome = tokio::task::spawn_blocking(move || {
            let input = stack_batch(&batch)?;
            let logits = run_batch(classifier.as_ref(), input)?;
            ai_probabilities(&logits, ai_class_index)
        })
        .await
        .unwrap_or_else(|e| Err(PipelineError::Inference(format!("inference task failed: {e}"))));

        match outcome {
            Ok(probs) => {
                tracing::debug!(batch_size, "批量推理完成");
                for (b, prob) in probs.into_iter().enumerate() {
                    let i = origin[b];
                    results[i] = Some(ClassifyResult::scored(urls[i].clone(), prob));
                }
            }
            Err(e) => {
                let msg = format!("Inference failed: {e}");
                tracing::error!(batch_size, "{}", msg);
                for &i in &origin {
                    results[i] = Some(ClassifyResult::failed(urls[i].clone(), msg.clone()));
                }
            }
        }
    }

    Ok(results
        .into_iter()
        .zip(urls)
        .map(|(slot, url)| {
            slot.unwrap_or_else(|| {
                ClassifyResult::failed(url.clone(), "Inference failed: no result".to_string())
            })
        })
        .collect())
}
