pub mod classifier;
pub mod manager;

pub use classifier::{argmax, softmax, PneumoniaClassifier, XrayModel, NUM_CLASSES};
pub use manager::{ModelManager, ModelStats};

// Re-export convenience functions from manager
pub use manager::{get_classifier, health_check, get_model_stats};
