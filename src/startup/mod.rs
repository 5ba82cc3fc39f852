/// 模型加载与启动检查
pub mod checks;
/// 日志初始化
pub mod logging;

pub use checks::{load_classifier, load_optional_classifier};
pub use logging::init_tracing;
