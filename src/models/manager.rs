use crate::models::{PneumoniaClassifier, XrayModel};
use crate::utils::error::DetectError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 全局模型管理器单例：启动时加载一次，之后只读共享
pub struct ModelManager {
    classifier: Arc<dyn XrayModel>,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器
    pub fn init(config: Config) -> Result<()> {
        tracing::info!("Initializing model manager...");

        let classifier = Arc::new(PneumoniaClassifier::new(&config)?);
        Self::install(classifier, config)?;

        tracing::info!("Model manager initialized successfully");
        Ok(())
    }

    /// 使用已构建的模型初始化（嵌入式部署或测试替身）
    pub fn install(classifier: Arc<dyn XrayModel>, config: Config) -> Result<()> {
        let manager = ModelManager { classifier, config };

        MODEL_MANAGER.set(Arc::new(manager))
            .map_err(|_| DetectError::Internal("Model manager already initialized".to_string()))
    }

    /// 获取全局模型管理器实例
    pub fn instance() -> Result<Arc<ModelManager>> {
        MODEL_MANAGER.get()
            .cloned()
            .ok_or_else(|| DetectError::ModelLoad("Model manager not initialized".to_string()))
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Arc<dyn XrayModel> {
        Arc::clone(&self.classifier)
    }

    /// 模型健康检查：模型文件仍在磁盘上
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        let model_path = self.config.model_path();
        if !model_path.exists() {
            return Err(DetectError::ModelLoad(
                format!("Model file disappeared: {}", model_path.display())
            ));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            model_path: self.config.model_path().display().to_string(),
            classes: vec!["normal", "bacterial_pneumonia", "viral_pneumonia"],
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
            augmentation: self.config.augment.enabled,
            augmentation_seed: self.config.augment.seed,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_path: String,
    pub classes: Vec<&'static str>,
    pub intra_threads: usize,
    pub optimization_level: i32,
    pub augmentation: bool,
    pub augmentation_seed: Option<u64>,
}

/// 便捷函数：获取分类器
pub fn get_classifier() -> Result<Arc<dyn XrayModel>> {
    Ok(ModelManager::instance()?.classifier())
}

/// 便捷函数：检查模型健康状态
pub fn health_check() -> Result<()> {
    ModelManager::instance()?.health_check()
}

/// 便捷函数：获取模型统计信息
pub fn get_model_stats() -> Result<ModelStats> {
    Ok(ModelManager::instance()?.get_stats())
}
