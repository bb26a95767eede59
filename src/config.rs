use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 推理前的随机增强
    pub augment: AugmentConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 单张图像最大字节数
    pub max_image_size: usize,
}

/// 随机翻转/旋转/平移设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentConfig {
    pub enabled: bool,

    /// 固定种子：每个请求使用同一随机序列
    pub seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self { enabled: true, seed: None }
    }
}

impl AugmentConfig {
    pub fn disabled() -> Self {
        Self { enabled: false, seed: None }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores).max(1);

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        // /predict 回传 urlencoded 的数据URL：base64 为原图 4/3，
        // 其中 '+' '/' 编码后各占3字节，按最坏情况放行
        let max_image_size: usize = 50 * 1024 * 1024;
        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: max_image_size.div_ceil(3) * 4 * 3 + 64 * 1024,
            max_image_size,
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            augment: AugmentConfig::default(),
        })
    }

    pub fn with_augmentation(mut self, enabled: bool, seed: Option<u64>) -> Self {
        self.augment = AugmentConfig { enabled, seed };
        self
    }

    /// 获取分类模型路径
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join("pneumonia/resnet50.onnx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_is_under_models_dir() {
        let config = Config::new("127.0.0.1:0".into(), "/srv/models".into(), Some(2), false).unwrap();
        assert_eq!(config.model_path(), PathBuf::from("/srv/models/pneumonia/resnet50.onnx"));
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn request_limit_covers_urlencoded_predict_form() {
        let config = Config::new("127.0.0.1:0".into(), "models".into(), None, false).unwrap();
        let server = &config.server_config;

        // 每个 base64 字符最多编码成3字节
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("image", "++//")
            .finish();
        assert_eq!(encoded.len(), "image=".len() + 4 * 3);

        // 上传页能接受的最大图像，回传到 /predict 时也不能被拒
        let prefix = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("image", "data:image/jpeg;base64,")
            .finish();
        let worst_form = prefix.len() + server.max_image_size.div_ceil(3) * 4 * 3;
        assert!(server.max_request_size >= worst_form);
        assert!(config.augment.enabled);

        let config = config.with_augmentation(false, Some(7));
        assert_eq!(config.augment, AugmentConfig { enabled: false, seed: Some(7) });
    }
}
