use crate::config::AugmentConfig;
use crate::image::ImageTransforms;
use crate::utils::error::DetectError;
use crate::Result;
use image::DynamicImage;
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 缩放后短边尺寸
pub const RESIZE_SIZE: u32 = 256;
/// 模型输入边长
pub const INPUT_SIZE: u32 = 224;

const FLIP_PROBABILITY: f64 = 0.5;
const MAX_ROTATION_DEGREES: f32 = 10.0;
const MAX_TRANSLATE_FRACTION: f32 = 0.05;

/// 胸片预处理流水线：
/// Resize(256) -> CenterCrop(224) -> 随机翻转/旋转/平移 -> 灰度 -> [0,1] 张量 (1, 224, 224)
pub struct ImagePreprocessor {
    augment: bool,
    rng: StdRng,
}

impl ImagePreprocessor {
    pub fn new(config: &AugmentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            augment: config.enabled,
            rng,
        }
    }

    pub fn preprocess(&mut self, image: &DynamicImage) -> Result<Array3<f32>> {
        let resized = ImageTransforms::resize_shorter_side(image, RESIZE_SIZE);
        let cropped = ImageTransforms::center_crop(&resized, INPUT_SIZE)?;

        // 最近邻采样且填充为0时，几何变换与灰度化可交换，先灰度化只需处理单通道
        let mut gray = ImageTransforms::to_grayscale(&cropped);

        if self.augment {
            gray = self.random_augment(gray);
        }

        Self::to_tensor(gray)
    }

    fn random_augment(&mut self, mut gray: Array2<f32>) -> Array2<f32> {
        if self.rng.gen_bool(FLIP_PROBABILITY) {
            gray = ImageTransforms::flip_horizontal(&gray);
        }

        let angle = self.rng.gen_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES);
        gray = ImageTransforms::rotate(&gray, angle);

        let (height, width) = gray.dim();
        let max_dx = MAX_TRANSLATE_FRACTION * width as f32;
        let max_dy = MAX_TRANSLATE_FRACTION * height as f32;
        let dx = self.rng.gen_range(-max_dx..=max_dx).round() as i64;
        let dy = self.rng.gen_range(-max_dy..=max_dy).round() as i64;

        tracing::debug!("Augmentation: angle={:.2}, dx={}, dy={}", angle, dx, dy);

        ImageTransforms::translate(&gray, dx, dy)
    }

    /// 0-255 灰度 (H, W) -> 归一化 (1, H, W)
    fn to_tensor(gray: Array2<f32>) -> Result<Array3<f32>> {
        let (height, width) = gray.dim();
        if (height, width) != (INPUT_SIZE as usize, INPUT_SIZE as usize) {
            return Err(DetectError::ImageProcessing(format!(
                "Unexpected tensor shape {}x{}, expected {}x{}",
                height, width, INPUT_SIZE, INPUT_SIZE
            )));
        }

        Ok((gray / 255.0).insert_axis(Axis(0)))
    }
}
