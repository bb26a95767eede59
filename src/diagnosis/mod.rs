pub mod pipeline;
pub mod specialist;
pub mod types;

pub use pipeline::DiagnosisPipeline;
pub use specialist::{doctor_search, SpecialistLink, SPECIALISTS};
pub use types::{Diagnosis, DiagnosisReport, DiagnosisResult, Prediction};
