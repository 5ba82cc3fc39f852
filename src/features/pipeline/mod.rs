//! 图片获取 → 预处理 → 推理 → 评分 的共享流水线组件。

pub mod acquire;
pub mod frequency;
pub mod inference;
pub mod preprocess;
pub mod scoring;

pub use acquire::{ImageAcquirer, decode_base64_payload, truncate_source};
pub use inference::{Classifier, OnnxClassifier, run_batch};
pub use preprocess::{IMAGENET_MEAN, IMAGENET_STD, MAX_IMAGE_SIDE, Preprocessor, stack_batch};
pub use scoring::{BlendedScore, ai_probabilities, blend, softmax};
