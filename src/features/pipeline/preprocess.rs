use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Limits};
use ndarray::{Array3, Array4, Axis};

use crate::error::PipelineError;

/// ImageNet 通道均值（协议常量，非可调参数）
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet 通道标准差（协议常量，非可调参数）
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 解码允许的最大边长（像素）。频域评分在原图分辨率上做 FFT，需限制内存占用。
pub const MAX_IMAGE_SIDE: u32 = 4096;

/// 将任意尺寸/像素格式的图片转换为 `3 × S × S` 的归一化张量（CHW）。
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    input_size: u32,
}

impl Preprocessor {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    /// 解码图片字节（格式自动探测），宽或高超过 [`MAX_IMAGE_SIDE`] 时拒绝。
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(MAX_IMAGE_SIDE);
        limits.max_image_height = Some(MAX_IMAGE_SIDE);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode(format!("cannot identify image: {e}")))?;
        reader.limits(limits);
        Ok(reader.decode()?)
    }

    /// 解码并转换为张量。
    pub fn bytes_to_tensor(&self, bytes: &[u8]) -> Result<Array3<f32>, PipelineError> {
        let img = Self::decode(bytes)?;
        self.to_tensor(&img)
    }

    /// RGB 化 → 双线性缩放 → [0,1] → 按通道标准化 → HWC 转 CHW。
    ///
    /// 标准化后不再裁剪到 [0,1]。
    pub fn to_tensor(&self, img: &DynamicImage) -> Result<Array3<f32>, PipelineError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(PipelineError::Preprocess(format!(
                "image has empty dimensions {}x{}",
                img.width(),
                img.height()
            )));
        }

        // 丢弃 alpha / 灰度扩展为三通道
        let rgb = img.to_rgb8();
        let size = self.input_size;
        let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

        let side = size as usize;
        let mut tensor = Array3::<f32>::zeros((3, side, side));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let value = f32::from(pixel[c]) / 255.0;
                tensor[[c, y as usize, x as usize]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
        Ok(tensor)
    }
}

/// 沿首维堆叠为 `N × 3 × S × S` 批次。
pub fn stack_batch(tensors: &[Array3<f32>]) -> Result<Array4<f32>, PipelineError> {
    let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();
    ndarray::stack(Axis(0), &views)
        .map_err(|e| PipelineError::Preprocess(format!("cannot stack batch: {e}")))
}
