//! Axum-based desktop simulator of the rover's HTTP surface.
//!
//! Serves the same routes as the device (except `/stream`) over any
//! [`RoverProvider`], so the browser UI and the teleop client can be
//! exercised against mock hardware:
//! - GET `/drive?forward=F&steer=S`
//! - GET `/config?framesize=N` (or `quality`, `flash`)
//! - GET `/control?var=K&val=N`
//! - GET `/status`
//! - GET `/capture`
//! - GET `/`, `/index.html`, `/style.css`, `/control.js`

use core::fmt::Debug;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::stream::CAPTURE_DISPOSITION;
use crate::traits::{FrameSource, StdClock};

use super::http_handler::{capture_jpeg, static_asset, ApiResult, HttpApiHandler, STATIC_ASSETS};
use super::shared::RoverProvider;

// ============================================================================
// Application State
// ============================================================================

/// Everything the routes need: the handler core and a frame source.
pub struct AppState<S: RoverProvider, F> {
    handler: HttpApiHandler<S>,
    frames: Mutex<F>,
    clock: StdClock,
}

impl<S: RoverProvider, F> AppState<S, F> {
    /// Shared state for the router: the rover and a frame source for `/capture`.
    pub fn new(rover: S, frames: F) -> Self {
        Self {
            handler: HttpApiHandler::new(rover),
            frames: Mutex::new(frames),
            clock: StdClock::new(),
        }
    }

    /// The shared endpoint handler.
    pub fn handler(&self) -> &HttpApiHandler<S> {
        &self.handler
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn drive<S: RoverProvider, F>(
    State(state): State<Arc<AppState<S, F>>>,
    RawQuery(query): RawQuery,
) -> ApiResult {
    state.handler.handle_drive(query.as_deref().unwrap_or(""))
}

async fn config<S: RoverProvider, F>(
    State(state): State<Arc<AppState<S, F>>>,
    RawQuery(query): RawQuery,
) -> ApiResult {
    state.handler.handle_config(query.as_deref().unwrap_or(""))
}

async fn control<S: RoverProvider, F>(
    State(state): State<Arc<AppState<S, F>>>,
    RawQuery(query): RawQuery,
) -> ApiResult {
    state.handler.handle_control(query.as_deref().unwrap_or(""))
}

async fn status<S: RoverProvider, F>(State(state): State<Arc<AppState<S, F>>>) -> ApiResult {
    state.handler.handle_status()
}

/// GET /capture - one JPEG from the frame source
async fn capture<S, F>(State(state): State<Arc<AppState<S, F>>>) -> Response
where
    S: RoverProvider,
    F: FrameSource,
    F::Error: Debug,
{
    let result = {
        let mut frames = state
            .frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        capture_jpeg(&mut *frames, &state.clock)
    };

    match result {
        Ok(jpeg) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CONTENT_DISPOSITION, CAPTURE_DISPOSITION),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            jpeg,
        )
            .into_response(),
        Err(e) => ApiResult::error(e.status_code(), e.to_string()).into_response(),
    }
}

/// GET of an embedded page asset
async fn page(uri: Uri) -> Response {
    match static_asset(uri.path()) {
        Some(asset) => {
            let mut response = asset.body.into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(asset.content_type),
            );
            response
        }
        None => not_found().await.into_response(),
    }
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Listen on `addr`, CORS permissive.
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Send or omit the permissive CORS layer.
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<S, F>(state: Arc<AppState<S, F>>, server_config: &WebServerConfig) -> Router
where
    S: RoverProvider + 'static,
    F: FrameSource + Send + 'static,
    F::Error: Debug,
{
    let mut router = Router::new()
        .route("/drive", get(drive::<S, F>))
        .route("/config", get(config::<S, F>))
        .route("/control", get(control::<S, F>))
        .route("/status", get(status::<S, F>))
        .route("/capture", get(capture::<S, F>));

    for asset in STATIC_ASSETS.iter() {
        router = router.route(asset.path, get(page));
    }

    let mut router = router.fallback(not_found).with_state(state);

    if server_config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state.
///
/// Blocks until the server is shut down.
///
/// # Example
///
/// ```ignore
/// let rover = Arc::new(SharedRover::new(rover));
/// let state = Arc::new(AppState::new(Arc::clone(&rover), MockFrames::repeating(jpeg)));
/// run_server_with_state(state, WebServerConfig::default()).await?;
/// ```
pub async fn run_server_with_state<S, F>(
    state: Arc<AppState<S, F>>,
    config: WebServerConfig,
) -> Result<(), std::io::Error>
where
    S: RoverProvider + 'static,
    F: FrameSource + Send + 'static,
    F::Error: Debug,
{
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("Web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
