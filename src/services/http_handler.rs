//! HTTP request handling shared by the device and the desktop simulator.
//!
//! The esp-idf-svc servers and the axum router both decode the request
//! target, call into [`HttpApiHandler`], and translate the [`ApiResult`]
//! into their native response type. Status codes, CORS, and bodies are
//! therefore identical on both platforms.
//!
//! | Route | Success | Failure |
//! |-------|---------|---------|
//! | `/drive?forward=F&steer=S` | 200, empty | 404 bad query, 500 motor |
//! | `/config?<key>=<n>` | 200, empty | 404 bad query, 500 driver |
//! | `/control?var=<k>&val=<n>` | 200, empty | 404 bad query, 500 driver |
//! | `/status` | 200, `{"framesize":N,"quality":N}` | 500 |
//! | `/capture` | 200, JPEG | 500 |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rs_rover::Rover;
//! use rs_rover::hal::{mock_stage, MockCamera, MockLight};
//! use rs_rover::services::{HttpApiHandler, SharedRover};
//!
//! let rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
//! let handler = HttpApiHandler::new(Arc::new(SharedRover::new(rover)));
//!
//! assert_eq!(handler.handle_drive("forward=40&steer=0").status(), 200);
//! assert_eq!(handler.handle_drive("forward=40").status(), 404);
//! ```

use core::fmt::Debug;

use crate::device::RoverError;
use crate::query::{parse_config, parse_control, parse_drive};
use crate::stream::{self, StreamStop};
use crate::traits::{Clock, FrameSource};

use super::shared::RoverProvider;

/// Header every control response carries.
pub const CORS_HEADER: (&str, &str) = ("Access-Control-Allow-Origin", "*");

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult {
    /// Success with a (possibly empty) JSON body.
    Ok(String),
    /// Error with status code and message.
    Error(u16, String),
}

impl ApiResult {
    /// Success with no body.
    pub fn empty() -> Self {
        Self::Ok(String::new())
    }

    /// Success with a JSON body.
    pub fn ok(json: impl Into<String>) -> Self {
        Self::Ok(json.into())
    }

    /// Failure with an HTTP status and a plain-text message.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Error(status, message.into())
    }

    /// 404 with a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Error(404, message.into())
    }

    /// Whether this is a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The JSON body (for success) or error message.
    pub fn body(&self) -> &str {
        match self {
            Self::Ok(json) => json,
            Self::Error(_, msg) => msg,
        }
    }

    /// HTTP status code: 200 for success.
    pub fn status(&self) -> u16 {
        match self {
            Self::Ok(_) => 200,
            Self::Error(status, _) => *status,
        }
    }

    /// `Content-Type` for the body, if there is one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Ok(json) if json.is_empty() => None,
            Self::Ok(_) => Some("application/json"),
            Self::Error(..) => Some("text/plain"),
        }
    }
}

impl From<Result<(), RoverError>> for ApiResult {
    fn from(result: Result<(), RoverError>) -> Self {
        match result {
            Ok(()) => ApiResult::empty(),
            Err(e) => {
                log::warn!("request failed: {}", e);
                ApiResult::error(e.status_code(), e.to_string())
            }
        }
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
#[cfg(feature = "web")]
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, HeaderValue, StatusCode};

        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = self.content_type();
        let body = match self {
            ApiResult::Ok(json) => json,
            ApiResult::Error(_, msg) => msg,
        };

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_HEADER.1),
        );
        match content_type {
            Some(ct) => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
            }
            None => {
                headers.remove(header::CONTENT_TYPE);
            }
        }
        response
    }
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// Endpoint logic over any [`RoverProvider`].
///
/// Every handler decodes its query completely before touching the rover,
/// so a 404 never leaves partial state behind.
pub struct HttpApiHandler<S: RoverProvider> {
    rover: S,
}

impl<S: RoverProvider> HttpApiHandler<S> {
    /// Wraps a rover provider.
    pub fn new(rover: S) -> Self {
        Self { rover }
    }

    /// The provider behind this handler.
    pub fn rover(&self) -> &S {
        &self.rover
    }

    /// GET /drive?forward=F&steer=S
    pub fn handle_drive(&self, query: &str) -> ApiResult {
        let result = parse_drive(query)
            .map_err(RoverError::from)
            .and_then(|cmd| self.rover.drive(cmd).map(|_| ()));
        result.into()
    }

    /// GET /config?framesize=N | quality=N | flash=N
    pub fn handle_config(&self, query: &str) -> ApiResult {
        let result = parse_config(query)
            .map_err(RoverError::from)
            .and_then(|param| self.rover.configure(param));
        result.into()
    }

    /// GET /control?var=K&val=N
    pub fn handle_control(&self, query: &str) -> ApiResult {
        let result = parse_control(query)
            .map_err(RoverError::from)
            .and_then(|var| self.rover.control(var));
        result.into()
    }

    /// GET /status
    pub fn handle_status(&self) -> ApiResult {
        let status = self.rover.status();
        match serde_json::to_string(&status) {
            Ok(json) => ApiResult::ok(json),
            Err(e) => ApiResult::error(500, e.to_string()),
        }
    }
}

/// Split a request target into path and query (without the `?`).
///
/// ```
/// use rs_rover::services::split_target;
///
/// assert_eq!(split_target("/drive?forward=1&steer=2"), ("/drive", "forward=1&steer=2"));
/// assert_eq!(split_target("/status"), ("/status", ""));
/// ```
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

/// GET /capture: grab one JPEG into memory.
pub fn capture_jpeg<F, C>(source: &mut F, clock: &C) -> Result<Vec<u8>, RoverError>
where
    F: FrameSource,
    F::Error: Debug,
    C: Clock,
{
    let mut jpeg = Vec::new();
    match stream::capture(source, &mut jpeg, clock) {
        Ok(_) => Ok(jpeg),
        Err(StreamStop::CaptureFailed) => Err(RoverError::Capture("camera capture failed".into())),
        Err(StreamStop::Disconnected) => Err(RoverError::Capture("client disconnected".into())),
    }
}

// ============================================================================
// Static Pages
// ============================================================================

/// One embedded page asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAsset {
    /// Request path.
    pub path: &'static str,
    /// `Content-Type` header value.
    pub content_type: &'static str,
    /// File contents, embedded at build time.
    pub body: &'static str,
}

const INDEX_HTML: &str = include_str!("../../www/index.html");
const STYLE_CSS: &str = include_str!("../../www/style.css");
const CONTROL_JS: &str = include_str!("../../www/control.js");

/// All embedded assets, in route order.
pub const STATIC_ASSETS: [StaticAsset; 4] = [
    StaticAsset {
        path: "/",
        content_type: "text/html",
        body: INDEX_HTML,
    },
    StaticAsset {
        path: "/index.html",
        content_type: "text/html",
        body: INDEX_HTML,
    },
    StaticAsset {
        path: "/style.css",
        content_type: "text/css",
        body: STYLE_CSS,
    },
    StaticAsset {
        path: "/control.js",
        content_type: "application/javascript",
        body: CONTROL_JS,
    },
];

/// Look up an embedded asset by request path.
pub fn static_asset(path: &str) -> Option<&'static StaticAsset> {
    STATIC_ASSETS.iter().find(|asset| asset.path == path)
}
