use ndarray::{Array2, ArrayView1};

use crate::error::PipelineError;

/// 模型“不确定”区间下界（不含）
pub const UNCERTAIN_LOW: f64 = 0.45;
/// 模型“不确定”区间上界（不含）
pub const UNCERTAIN_HIGH: f64 = 0.55;
/// 判定为 AI 生成的阈值（严格大于）
pub const AI_THRESHOLD: f64 = 0.55;
/// 频域方差低于此值视为存在合成伪影
pub const LOW_VARIANCE: f64 = 300.0;
/// 频域方差高于此值视为真实图片
pub const HIGH_VARIANCE: f64 = 2000.0;
/// 低方差时的加分
pub const LOW_VARIANCE_BOOST: f64 = 0.2;
/// 高方差时的减分
pub const HIGH_VARIANCE_PENALTY: f64 = 0.1;

/// 数值稳定的 softmax（先减去最大值）。
pub fn softmax(logits: ArrayView1<'_, f32>) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// 对每一行 logits 做 softmax，取 `ai_class_index` 对应的概率。
pub fn ai_probabilities(
    logits: &Array2<f32>,
    ai_class_index: usize,
) -> Result<Vec<f32>, PipelineError> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            softmax(row).get(ai_class_index).copied().ok_or_else(|| {
                PipelineError::Inference(format!(
                    "class index {ai_class_index} out of range for {} outputs",
                    row.len()
                ))
            })
        })
        .collect()
}

/// 单图分析的最终得分。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedScore {
    /// 模型给出的 AI 概率（融合前）
    pub model_prob: f64,
    /// 频域伪影方差
    pub fft_var: f64,
    /// 融合后的得分（不重新裁剪到 [0,1]）
    pub score: f64,
    pub is_ai: bool,
}

/// 固定阈值规则融合：仅当模型概率落在 (0.45, 0.55) 内时参考频域方差。
pub fn blend(model_prob: f64, fft_var: f64) -> BlendedScore {
    let mut score = model_prob;
    if model_prob > UNCERTAIN_LOW && model_prob < UNCERTAIN_HIGH {
        if fft_var < LOW_VARIANCE {
            score += LOW_VARIANCE_BOOST;
        } else if fft_var > HIGH_VARIANCE {
            score -= HIGH_VARIANCE_PENALTY;
        }
    }
    BlendedScore {
        model_prob,
        fft_var,
        score,
        is_ai: score > AI_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn softmax_sums_to_one_and_is_shift_invariant() {
        let p = softmax(arr1(&[1.0f32, 3.0]).view());
        let q = softmax(arr1(&[1001.0f32, 1003.0]).view());
        assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(p, q);
        assert!(p[1] > p[0]);
    }

    #[test]
    fn ai_probabilities_respect_class_index() {
        let logits = arr2(&[[0.0f32, 0.0], [2.0, -2.0]]);
        let idx1 = ai_probabilities(&logits, 1).expect("idx1");
        let idx0 = ai_probabilities(&logits, 0).expect("idx0");
        assert!((idx1[0] - 0.5).abs() < 1e-6);
        assert!(idx1[1] < 0.5 && idx0[1] > 0.5);
        assert!((idx0[1] + idx1[1] - 1.0).abs() < 1e-6);
        assert!(ai_probabilities(&logits, 2).is_err());
    }

    #[test]
    fn uncertain_low_variance_pushes_toward_ai() {
        let s = blend(0.50, 100.0);
        assert!(approx(s.score, 0.70), "got {}", s.score);
        assert!(s.is_ai);
    }

    #[test]
    fn uncertain_high_variance_pushes_toward_real() {
        let s = blend(0.50, 2500.0);
        assert!(approx(s.score, 0.40), "got {}", s.score);
        assert!(!s.is_ai);
    }

    #[test]
    fn confident_model_is_left_unchanged() {
        for var in [0.5, 100.0, 1000.0, 2500.0] {
            let s = blend(0.90, var);
            assert_eq!(s.score, 0.90);
            assert!(s.is_ai);
        }
    }

    #[test]
    fn band_edges_are_exclusive() {
        assert_eq!(blend(0.45, 100.0).score, 0.45);
        assert_eq!(blend(0.55, 100.0).score, 0.55);
        assert!(!blend(0.55, 1000.0).is_ai);
    }

    #[test]
    fn mid_variance_in_band_is_unchanged() {
        let s = blend(0.52, 1000.0);
        assert_eq!(s.score, 0.52);
        assert!(!s.is_ai);
    }
}
