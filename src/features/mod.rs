/// 单图分析（base64 + 频域融合）
pub mod analyze;
/// 批量分类（URL 列表）
pub mod classify;
/// 健康检查
pub mod health;
/// 共享流水线组件
pub mod pipeline;
