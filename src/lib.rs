pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::StoreConfig;
use crate::services::storage::VideoStorage;
use crate::utils::keyed_mutex::KeyedMutex;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom on top of the file size limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::videos::upload_video,
        api::handlers::videos::get_video,
        api::handlers::videos::list_videos,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::videos::UploadResponse,
            api::handlers::videos::VideoEntry,
            api::handlers::health::HealthResponse,
            api::error::ErrorResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video upload, listing and streaming"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn VideoStorage>,
    pub config: StoreConfig,
    pub write_locks: KeyedMutex,
}

impl AppState {
    pub fn new(storage: Arc<dyn VideoStorage>, config: StoreConfig) -> Self {
        Self {
            storage,
            config,
            write_locks: KeyedMutex::new(),
        }
    }
}

fn cors_layer(config: &StoreConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::page::index))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::videos::upload_video))
        .route("/video/:filename", get(api::handlers::videos::get_video))
        .route("/video-list", get(api::handlers::videos::list_videos))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD),
        ))
        .with_state(state)
}
