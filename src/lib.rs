pub mod config;
pub mod models;
pub mod image;
pub mod diagnosis;
pub mod web;
pub mod utils;

// 重新导出主要类型
pub use config::Config;
pub use diagnosis::{Diagnosis, DiagnosisReport, DiagnosisResult, Prediction};
pub use utils::error::DetectError;

pub type Result<T> = std::result::Result<T, DetectError>;
