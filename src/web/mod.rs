pub mod handlers;
pub mod middleware;
pub mod extractors;
pub mod ui;

use crate::{models::ModelManager, utils::error::DetectError, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub async fn serve(config: Config) -> Result<()> {
    // 初始化模型管理器
    ModelManager::init(config.clone())?;

    let app = create_app(config.clone());

    let addr: SocketAddr = config.bind_addr
        .parse()
        .map_err(|e| DetectError::Config(
            format!("Invalid bind address {}: {}", config.bind_addr, e)
        ))?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                  - Web UI");
    tracing::info!("  POST /upload            - Web UI file upload");
    tracing::info!("  POST /predict           - Web UI prediction");
    tracing::info!("  POST /api/predict       - Multipart file upload");
    tracing::info!("  POST /api/predict/json  - JSON base64 upload");
    tracing::info!("  GET  /health            - Health check");
    tracing::info!("  GET  /api/info          - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DetectError::Internal(
            format!("Failed to bind to address {}: {}", addr, e)
        ))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DetectError::Internal(
            format!("Server failed to start: {}", e)
        ))?;

    Ok(())
}

pub fn create_app(config: Config) -> Router {
    Router::new()
        // Web UI路由
        .route("/", get(ui::index_handler))
        .route("/upload", post(ui::upload_handler))
        .route("/predict", post(ui::predict_handler))

        // 预测API路由
        .route("/api/predict", post(handlers::predict_upload_handler))
        .route("/api/predict/json", post(handlers::predict_json_handler))

        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))

        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // 由 RequestBodyLimitLayer 统一限制请求体
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server_config.max_request_size))
        // 超时只丢弃响应，已派发的推理任务会在阻塞线程池里跑完
        .layer(TimeoutLayer::new(Duration::from_secs(config.server_config.request_timeout)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(config)
}

/// 健康检查端点
async fn health_handler() -> Result<Json<serde_json::Value>> {
    crate::models::health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler() -> Result<Json<serde_json::Value>> {
    let stats = crate::models::get_model_stats()?;

    Ok(Json(json!({
        "service": "Pneumonia Detection Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "features": {
            "dual_upload_modes": true,
            "specialist_links": true,
            "inference_augmentation": stats.augmentation
        }
    })))
}
