use crate::{
    config::AugmentConfig,
    diagnosis::{DiagnosisReport, DiagnosisResult},
    image::{ImageLoader, ImagePreprocessor},
    models::{get_classifier, XrayModel},
    utils::error::DetectError,
    Config, Result,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 胸片诊断流水线：解码 -> 预处理 -> 分类 -> 生成报告
pub struct DiagnosisPipeline;

impl DiagnosisPipeline {
    /// 处理上传的原始字节（阻塞调用）
    pub fn diagnose_bytes(
        model: &dyn XrayModel,
        bytes: &[u8],
        augment: &AugmentConfig,
        max_image_size: usize,
    ) -> Result<DiagnosisResult> {
        let start_time = Instant::now();

        let image = ImageLoader::from_bytes(bytes, max_image_size)?;
        let tensor = ImagePreprocessor::new(augment).preprocess(&image)?;

        let prediction = model.predict(tensor)?;
        let report = DiagnosisReport::from_prediction(&prediction)?;

        let processing_time = start_time.elapsed().as_secs_f32();
        tracing::info!(
            "Diagnosis completed: class={}, confidence={:.4}, time={:.3}s",
            prediction.class_index,
            prediction.confidence,
            processing_time
        );

        Ok(DiagnosisResult {
            processing_time,
            prediction,
            report,
        })
    }

    /// 使用全局模型处理字节流，推理放到阻塞线程池
    pub async fn process_bytes(bytes: Vec<u8>, config: &Config) -> Result<DiagnosisResult> {
        let model = get_classifier()?;
        Self::run_blocking(model, bytes, config).await
    }

    /// 使用全局模型处理 base64 / 数据URL
    pub async fn process_base64(base64_data: &str, config: &Config) -> Result<DiagnosisResult> {
        let bytes = ImageLoader::decode_base64(base64_data)?;
        Self::process_bytes(bytes, config).await
    }

    /// 完整解码一次以确认上传的是可用图像，解码放到阻塞线程池
    pub async fn validate_bytes(bytes: Vec<u8>, config: &Config) -> Result<Vec<u8>> {
        let max_image_size = config.server_config.max_image_size;

        tokio::task::spawn_blocking(move || {
            ImageLoader::from_bytes(&bytes, max_image_size)?;
            Ok(bytes)
        })
        .await
        .map_err(|e| DetectError::Internal(format!("Image validation task failed: {}", e)))?
    }

    async fn run_blocking(
        model: Arc<dyn XrayModel>,
        bytes: Vec<u8>,
        config: &Config,
    ) -> Result<DiagnosisResult> {
        let augment = config.augment;
        let max_image_size = config.server_config.max_image_size;
        let timeout = Duration::from_secs(config.server_config.request_timeout);
        let started = Instant::now();

        // 请求超时后阻塞任务不会被取消，只能在结束时记录
        tokio::task::spawn_blocking(move || {
            let result = Self::diagnose_bytes(model.as_ref(), &bytes, &augment, max_image_size);
            if outlived_request(started.elapsed(), timeout) {
                tracing::warn!(
                    "Inference finished after the {}s request timeout, result discarded",
                    timeout.as_secs()
                );
            }
            result
        })
        .await
        .map_err(|e| DetectError::Internal(format!("Inference task failed: {}", e)))?
    }
}

fn outlived_request(elapsed: Duration, timeout: Duration) -> bool {
    elapsed >= timeout
}
