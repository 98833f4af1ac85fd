//! HTTP servers for the ESP32 rover.
//!
//! Two esp-idf-svc servers run side by side, like the stock camera
//! firmware:
//!
//! - port 80: control endpoints, `/status`, `/capture`, and the page assets
//! - port 81: `/stream`, which blocks its server task for as long as the
//!   client stays connected
//!
//! Endpoint logic lives in [`HttpApiHandler`]; this module only moves
//! bytes between it and the esp-idf request/response types.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_rover::hal::esp32::{Esp32Camera, Esp32HttpServer};
//! use rs_rover::services::{HttpApiHandler, SharedRover};
//!
//! let shared = Arc::new(SharedRover::new(rover));
//! let api = Arc::new(HttpApiHandler::new(shared));
//! let _server = Esp32HttpServer::new(&config.web, api, camera)?;
//! ```

use core::fmt::Debug;
use std::sync::Arc;

use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Write};

use super::Esp32Clock;
use crate::config::WebConfig;
use crate::services::{
    capture_jpeg, split_target, ApiResult, HttpApiHandler, RoverProvider, CORS_HEADER,
    STATIC_ASSETS,
};
use crate::stream::{self, CAPTURE_DISPOSITION, STREAM_CONTENT_TYPE};
use crate::traits::{FrameSink, FrameSource};

/// esp-idf's default control port; each server needs its own.
const CONTROL_CTRL_PORT: u16 = 32768;
const STREAM_CTRL_PORT: u16 = 32769;

/// An esp-idf response body as a [`FrameSink`].
pub struct EspSink<W>(pub W);

impl<W: Write> FrameSink for EspSink<W> {
    type Error = W::Error;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), W::Error> {
        self.0.write_all(chunk)
    }
}

/// The rover's two HTTP servers. Dropping this stops both.
pub struct Esp32HttpServer {
    _control: EspHttpServer<'static>,
    _stream: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start both servers.
    ///
    /// `camera` is cloned per request, so it should be a cheap handle
    /// (such as `Esp32Camera`) rather than owned frame storage.
    ///
    /// # Errors
    ///
    /// Returns an error if either server fails to start or a handler fails
    /// to register.
    pub fn new<S, F>(
        config: &WebConfig,
        api: Arc<HttpApiHandler<S>>,
        camera: F,
    ) -> anyhow::Result<Self>
    where
        S: RoverProvider + 'static,
        F: FrameSource + Clone + Send + 'static,
        F::Error: Debug,
    {
        let control = Self::control_server(config, api, camera.clone())?;
        let stream = Self::stream_server(config, camera)?;
        Ok(Self {
            _control: control,
            _stream: stream,
        })
    }

    fn control_server<S, F>(
        config: &WebConfig,
        api: Arc<HttpApiHandler<S>>,
        camera: F,
    ) -> anyhow::Result<EspHttpServer<'static>>
    where
        S: RoverProvider + 'static,
        F: FrameSource + Clone + Send + 'static,
        F::Error: Debug,
    {
        let server_config = Configuration {
            http_port: config.port,
            ctrl_port: CONTROL_CTRL_PORT,
            max_uri_handlers: 16,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;

        let drive_api = Arc::clone(&api);
        server.fn_handler("/drive", Method::Get, move |req| {
            let (_, query) = split_target(req.uri());
            let result = drive_api.handle_drive(query);
            respond(req, &result)
        })?;

        let config_api = Arc::clone(&api);
        server.fn_handler("/config", Method::Get, move |req| {
            let (_, query) = split_target(req.uri());
            let result = config_api.handle_config(query);
            respond(req, &result)
        })?;

        let control_api = Arc::clone(&api);
        server.fn_handler("/control", Method::Get, move |req| {
            let (_, query) = split_target(req.uri());
            let result = control_api.handle_control(query);
            respond(req, &result)
        })?;

        let status_api = Arc::clone(&api);
        server.fn_handler("/status", Method::Get, move |req| {
            let result = status_api.handle_status();
            respond(req, &result)
        })?;

        server.fn_handler("/capture", Method::Get, move |req| {
            let mut source = camera.clone();
            match capture_jpeg(&mut source, &Esp32Clock::new()) {
                Ok(jpeg) => {
                    let mut resp = req.into_response(
                        200,
                        Some("OK"),
                        &[
                            ("Content-Type", "image/jpeg"),
                            ("Content-Disposition", CAPTURE_DISPOSITION),
                            CORS_HEADER,
                        ],
                    )?;
                    resp.write_all(&jpeg)?;
                    Ok(())
                }
                Err(e) => respond(req, &ApiResult::error(e.status_code(), e.to_string())),
            }
        })?;

        for asset in STATIC_ASSETS.iter() {
            server.fn_handler(asset.path, Method::Get, move |req| {
                let mut resp =
                    req.into_response(200, None, &[("Content-Type", asset.content_type)])?;
                resp.write_all(asset.body.as_bytes())?;
                Ok::<_, EspIOError>(())
            })?;
        }

        log::info!("[HTTP] Control server started on port {}", config.port);
        Ok(server)
    }

    fn stream_server<F>(config: &WebConfig, camera: F) -> anyhow::Result<EspHttpServer<'static>>
    where
        F: FrameSource + Clone + Send + 'static,
        F::Error: Debug,
    {
        let server_config = Configuration {
            http_port: config.stream_port,
            ctrl_port: STREAM_CTRL_PORT,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;

        server.fn_handler("/stream", Method::Get, move |req| {
            let mut source = camera.clone();
            let resp = req.into_response(
                200,
                Some("OK"),
                &[
                    ("Content-Type", STREAM_CONTENT_TYPE),
                    CORS_HEADER,
                    ("X-Framerate", "60"),
                ],
            )?;
            log::info!("[HTTP] Stream client connected");
            let mut sink = EspSink(resp);
            let stop = stream::run_stream(&mut source, &mut sink, &Esp32Clock::new());
            log::info!("[HTTP] Stream ended: {}", stop);
            Ok::<_, EspIOError>(())
        })?;

        log::info!("[HTTP] Stream server started on port {}", config.stream_port);
        Ok(server)
    }
}

/// Write an [`ApiResult`] with the CORS header and, when there is a body,
/// its content type.
fn respond(req: Request<&mut EspHttpConnection<'_>>, result: &ApiResult) -> Result<(), EspIOError> {
    let typed;
    let headers: &[(&str, &str)] = match result.content_type() {
        Some(content_type) => {
            typed = [CORS_HEADER, ("Content-Type", content_type)];
            &typed
        }
        None => &[CORS_HEADER],
    };
    let mut resp = req.into_response(result.status(), None, headers)?;
    resp.write_all(result.body().as_bytes())?;
    Ok(())
}
