pub mod handler;
pub mod models;
pub mod service;

pub use handler::create_classify_router;
pub use models::{ClassifyRequest, ClassifyResponse, ClassifyResult};
