//! 频域伪影评分：灰度 → 2D FFT → 零频移至中心 → 对数幅度 → 环形频带方差。
//!
//! 方差偏低通常意味着上采样/生成模型留下的周期性伪影。

use image::{DynamicImage, RgbImage};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// 环形频带内半径（像素）
pub const BAND_INNER_RADIUS: f64 = 30.0;
/// 外半径相对 `height / 2` 的收缩量（像素）
pub const BAND_OUTER_MARGIN: f64 = 5.0;
/// 频带内没有任何采样点时的取值
pub const EMPTY_BAND_VARIANCE: f64 = 0.5;
/// 计算失败时的取值（偏向“真实图片”）
pub const FALLBACK_VARIANCE: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyError {
    EmptyImage,
}

/// 计算图片的频域伪影方差。
///
/// 两个兜底值不同：频带为空（图片太小）返回 [`EMPTY_BAND_VARIANCE`]，
/// 其余失败返回 [`FALLBACK_VARIANCE`]。前者低于 300，会把模糊区间内的结果推向 AI。
pub fn artifact_variance(img: &DynamicImage) -> f64 {
    match band_variance(img) {
        Ok(Some(v)) => v,
        Ok(None) => EMPTY_BAND_VARIANCE,
        Err(e) => {
            tracing::debug!("频域评分失败 {:?}，使用默认方差 {}", e, FALLBACK_VARIANCE);
            FALLBACK_VARIANCE
        }
    }
}

/// 频带内对数幅度的总体方差；频带为空时返回 `Ok(None)`。
pub fn band_variance(img: &DynamicImage) -> Result<Option<f64>, FrequencyError> {
    let rgb = img.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    if w == 0 || h == 0 {
        return Err(FrequencyError::EmptyImage);
    }

    let mut data: Vec<Complex<f64>> = luma_plane(&rgb)
        .into_iter()
        .map(|v| Complex::new(f64::from(v), 0.0))
        .collect();
    fft_2d(&mut data, w, h);

    let (cy, cx) = ((h / 2) as f64, (w / 2) as f64);
    let outer = (h / 2) as f64 - BAND_OUTER_MARGIN;

    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            // fftshift：原下标 (y, x) 移动到 ((y + h/2) % h, (x + w/2) % w)
            let sy = ((y + h / 2) % h) as f64;
            let sx = ((x + w / 2) % w) as f64;
            let r = ((sy - cy).powi(2) + (sx - cx).powi(2)).sqrt();
            if r < BAND_INNER_RADIUS || r >= outer {
                continue;
            }
            let magnitude = 20.0 * (data[y * w + x].norm() + 1.0).ln();
            count += 1;
            sum += magnitude;
            sum_sq += magnitude * magnitude;
        }
    }

    if count == 0 {
        return Ok(None);
    }
    let mean = sum / count as f64;
    Ok(Some((sum_sq / count as f64 - mean * mean).max(0.0)))
}

/// ITU-R BT.601 灰度：`0.299*R + 0.587*G + 0.114*B`，四舍五入到 8 位。
///
/// `image` 自带的 `to_luma8` 使用 BT.709 权重，阈值 300/2000 是按 BT.601 标定的。
fn luma_plane(rgb: &RgbImage) -> Vec<u8> {
    rgb.pixels()
        .map(|p| {
            let lum =
                0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2]);
            lum.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// 原地二维 FFT（行主序，先行后列）。
fn fft_2d(data: &mut [Complex<f64>], w: usize, h: usize) {
    let mut planner = FftPlanner::<f64>::new();

    let row_fft = planner.plan_fft_forward(w);
    for row in data.chunks_exact_mut(w) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(h);
    let mut column = vec![Complex::new(0.0, 0.0); h];
    for x in 0..w {
        for y in 0..h {
            column[y] = data[y * w + x];
        }
        col_fft.process(&mut column);
        for y in 0..h {
            data[y * w + x] = column[y];
        }
    }
}
