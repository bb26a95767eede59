use crate::utils::error::DetectError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

pub struct ImageLoader;

impl ImageLoader {
    /// 解码base64，兼容数据URL前缀 (data:image/xxx;base64,)
    pub fn decode_base64(base64_data: &str) -> Result<Vec<u8>> {
        let trimmed = base64_data.trim();
        let base64_clean = match trimmed.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, payload)| payload)
                .ok_or_else(|| DetectError::InvalidInput("Malformed data URL".to_string()))?,
            None => trimmed,
        };

        Ok(base64::engine::general_purpose::STANDARD.decode(base64_clean)?)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(DetectError::InvalidInput("Empty image data".to_string()));
        }

        if bytes.len() > max_size {
            return Err(DetectError::FileTooLarge(bytes.len(), max_size));
        }

        match Self::detect_format(bytes) {
            Some(format) if !Self::is_supported_format(format) => {
                return Err(DetectError::UnsupportedFormat(format!("{:?}", format)));
            }
            Some(format) => tracing::debug!("Detected image format: {:?}", format),
            // 交给解码器报告具体错误
            None => {}
        }

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format,
            ImageFormat::Png |
            ImageFormat::Jpeg |
            ImageFormat::Bmp |
            ImageFormat::Tiff |
            ImageFormat::WebP
        )
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width < 16 || height < 16 {
            return Err(DetectError::InvalidInput(
                format!("Image too small: {}x{}, minimum 16x16", width, height)
            ));
        }

        if width > 8192 || height > 8192 {
            return Err(DetectError::InvalidInput(
                format!("Image too large: {}x{}, maximum 8192x8192", width, height)
            ));
        }

        Ok(())
    }

    /// 生成用于页面预览的数据URL
    pub fn to_data_url(bytes: &[u8]) -> String {
        let mime = Self::detect_format(bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{};base64,{}", mime, payload)
    }
}
