//! Desktop simulator of the rover's control server.
//!
//! Runs the device's HTTP routes over mock hardware, so you can:
//! - Open the control page at http://localhost:8080
//! - Drive with the arrow keys or the pad and watch the wheel speeds in the log
//! - Point the `teleop` binary at it
//!
//! There is no `/stream` here; `/capture` returns a fixed placeholder frame.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_server --features web
//! ```

use std::sync::Arc;

use rs_rover::hal::{mock_stage, MockCamera, MockFrames, MockLight};
use rs_rover::services::{run_server_with_state, AppState, SharedRover, WebServerConfig};
use rs_rover::{Config, Rover};

/// Smallest well-formed JPEG marker pair, served by `/capture`.
const PLACEHOLDER_JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        log::info!("=================================");
        log::info!("  rs-rover Desktop Simulator");
        log::info!("=================================");

        // Central configuration - modify this for your setup
        let config = Config::default().with_web(rs_rover::WebConfig::default().with_port(8080));

        let rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
        let shared = Arc::new(SharedRover::new(rover));
        let frames = MockFrames::repeating(PLACEHOLDER_JPEG.to_vec());
        let state = Arc::new(AppState::new(Arc::clone(&shared), frames));

        let web_config = WebServerConfig::from_config(&config.web);
        log::info!("Control page: http://localhost:{}/", config.web.port);

        let served = run_server_with_state(state, web_config).await;

        if let Err(e) = shared.stop() {
            log::warn!("failed to stop motors on shutdown: {}", e);
        }
        served
    })?;

    Ok(())
}
