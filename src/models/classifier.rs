use crate::diagnosis::Prediction;
use crate::utils::error::DetectError;
use crate::{Config, Result};
use ndarray::{Array3, Axis};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
    inputs,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 类别数：正常 / 细菌性肺炎 / 病毒性肺炎
pub const NUM_CLASSES: usize = 3;

/// 前向推理接口，便于替换模型实现
pub trait XrayModel: Send + Sync {
    /// 输入 (1, H, W) 单通道张量，返回各类别的原始输出
    fn forward(&self, input: Array3<f32>) -> Result<Vec<f32>>;

    /// softmax 后取最大概率类别
    fn predict(&self, input: Array3<f32>) -> Result<Prediction> {
        let logits = self.forward(input)?;
        if logits.len() != NUM_CLASSES {
            return Err(DetectError::Inference(format!(
                "Expected {} class scores, got {}",
                NUM_CLASSES,
                logits.len()
            )));
        }

        let probabilities = softmax(&logits);
        let (class_index, confidence) = argmax(&probabilities)
            .ok_or_else(|| DetectError::Inference("Empty model output".to_string()))?;

        Ok(Prediction {
            class_index,
            confidence,
            probabilities,
        })
    }
}

/// ResNet-50 胸片分类器（ONNX）
pub struct PneumoniaClassifier {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
}

impl PneumoniaClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.model_path();

        if !model_path.exists() {
            return Err(DetectError::ModelLoad(
                format!("Classification model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let optimization_level = match config.onnx_config.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        };

        let session = Session::builder()
            .map_err(load_error)?
            .with_optimization_level(optimization_level)
            .map_err(load_error)?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(load_error)?
            .commit_from_file(&model_path)
            .map_err(load_error)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectError::ModelLoad("Classification model has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| DetectError::ModelLoad("Classification model has no outputs".to_string()))?;

        tracing::info!("Classification model input: '{}', output: '{}'", input_name, output_name);
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }
}

impl XrayModel for PneumoniaClassifier {
    fn forward(&self, input: Array3<f32>) -> Result<Vec<f32>> {
        // 添加batch维度
        let input_tensor = Tensor::from_array(input.insert_axis(Axis(0)))?;

        let scores = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(&self.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(DetectError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        let shape = scores.shape();
        if shape != [1, NUM_CLASSES] {
            return Err(DetectError::Inference(format!(
                "Expected output shape [1, {}], got {:?}",
                NUM_CLASSES, shape
            )));
        }

        Ok(scores.iter().copied().collect())
    }
}

fn load_error(e: impl std::fmt::Display) -> DetectError {
    DetectError::ModelLoad(e.to_string())
}

/// 数值稳定的 softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// 最大值下标及其值；并列时取第一个
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
}
