pub mod error;
pub mod http;
pub mod stream;

use std::sync::Arc;
use axum::http::HeaderValue;
use axum::routing::post;
use axum::Router;
use log::{info, warn};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::batching::SessionRegistry;
use crate::coach::{CoachService, GeminiClient};
use crate::config::AppConfig;

pub use error::ServerError;

/// 所有处理器共享的状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionRegistry>,
    pub coach: CoachService,
}

impl AppState {
    pub fn new(config: AppConfig, coach: CoachService) -> Self {
        let sessions = Arc::new(SessionRegistry::new(config.batching.http_batch_size));
        Self {
            config: Arc::new(config),
            sessions,
            coach,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route(
            "/baseball",
            post(http::receive_baseball).get(stream::websocket_baseball),
        )
        .route("/bball", post(http::receive_bball))
        .layer(cors)
        .with_state(state)
}

/// 启动服务，Ctrl+C 时优雅退出
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;

    let model = Arc::new(GeminiClient::new(&config.model));
    let coach = CoachService::from_config(model, &config.model, &config.prompt);

    info!(
        "Batching: {} frames per request batch, {} frames per stream batch, {}s stream throttle",
        config.batching.http_batch_size, config.batching.stream_batch_size, config.batching.stream_throttle_secs
    );
    info!("Coach model: {} (timeout {}s, {} retries)", config.model.model, config.model.timeout_secs, config.model.max_retries);

    let app = build_router(AppState::new(config, coach));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
