pub mod loader;
pub mod preprocessing;
pub mod transforms;

pub use loader::ImageLoader;
pub use preprocessing::{ImagePreprocessor, INPUT_SIZE};
pub use transforms::ImageTransforms;
