use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Batch, SortRequest, SortResponse};
use crate::orchestrator::BatchOrchestrator;
use crate::services::SortMode;

pub const PROCESS_SINGLE_PATH: &str = "/process-single";
pub const PROCESS_CONCURRENT_PATH: &str = "/process-concurrent";

/// 路由共享状态
///
/// 编排器本身无跨请求可变状态，克隆开销只是几个 `Option<Arc<_>>`。
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub orchestrator: BatchOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: BatchOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(BatchOrchestrator::from_config(config))
    }
}

/// 构造路由
///
/// 不限制请求体大小：旧接口对数组个数和长度都不做校验。
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(PROCESS_SINGLE_PATH, post(process_single))
        .route(PROCESS_CONCURRENT_PATH, post(process_concurrent))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn process_single(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SortResponse>, ApiError> {
    process(&state, &body, SortMode::Sequential).await
}

async fn process_concurrent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SortResponse>, ApiError> {
    process(&state, &body, SortMode::Concurrent).await
}

async fn process(
    state: &AppState,
    body: &[u8],
    mode: SortMode,
) -> Result<Json<SortResponse>, ApiError> {
    // 与旧接口一致：不检查 Content-Type，只看请求体
    let request = SortRequest::from_body(body).map_err(|e| {
        warn!("⚠️ 请求体解析失败 ({}): {}", mode.as_str(), e);
        ApiError::InvalidPayload(e)
    })?;

    let batch = Batch::from(request);
    debug!("收到 {} 个数组 ({})", batch.len(), mode.as_str());

    let sorted = state.orchestrator.sort_batch(batch, mode).await?;
    Ok(Json(SortResponse::from(sorted)))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Orchestration(e) => {
                error!("❌ 批量排序失败: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, format!("{}\n", self)).into_response()
    }
}
