use crate::{
    diagnosis::{DiagnosisPipeline, DiagnosisResult},
    utils::error::DetectError,
    web::extractors::{RequestId, ValidatedJson},
    Config, Result,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// Base64编码的图像数据，可带数据URL前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 读取 multipart 中的 `file` 字段
pub async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        DetectError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        // 验证内容类型
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
                return Err(DetectError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field.bytes().await.map_err(|e| {
            DetectError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;

        if data.is_empty() {
            return Err(DetectError::InvalidInput("Empty file".to_string()));
        }

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data.to_vec());
    }

    image_data.ok_or_else(|| DetectError::InvalidInput("No image file provided".to_string()))
}

/// Multipart文件上传处理器
pub async fn predict_upload_handler(
    State(config): State<Config>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DiagnosisResult>>> {
    let start_time = Instant::now();
    tracing::info!("Processing multipart prediction request: request_id={}", request_id);

    let image_data = read_image_field(&mut multipart).await?;
    let result = DiagnosisPipeline::process_bytes(image_data, &config).await?;

    tracing::info!(
        "Upload prediction completed: request_id={}, class={}, time={:.3}s",
        request_id,
        result.prediction.class_index,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// JSON base64上传处理器
pub async fn predict_json_handler(
    State(config): State<Config>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<PredictJsonRequest>,
) -> Result<Json<ApiResponse<DiagnosisResult>>> {
    let start_time = Instant::now();
    tracing::info!(
        "Processing JSON prediction request: request_id={}, payload={} chars",
        request_id,
        request.image.len()
    );

    let result = DiagnosisPipeline::process_base64(&request.image, &config).await?;

    tracing::info!(
        "JSON prediction completed: request_id={}, class={}, time={:.3}s",
        request_id,
        result.prediction.class_index,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}
