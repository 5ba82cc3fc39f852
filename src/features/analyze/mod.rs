pub mod handler;
pub mod models;
pub mod service;

pub use handler::create_analyze_router;
pub use models::{AnalyzeDetails, AnalyzeRequest, AnalyzeResponse};
