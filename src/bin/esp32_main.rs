//! ESP32-CAM camera rover.
//!
//! Boot sequence:
//! - Brings up the motor PWM outputs (stopped), H-bridge or servo per
//!   `DriveConfig::kind`
//! - Initializes the OV2640 with the page's default settings
//! - Joins WiFi (if enabled and configured)
//! - Starts the control server on port 80 and the MJPEG stream on port 81
//!
//! After boot the main task only idles; all work happens in the HTTP
//! server tasks.
//!
//! # Build
//!
//! ```bash
//! # Motors + camera, no network
//! cargo build --release --features esp32
//!
//! # Full rover (WiFi + HTTP)
//! WIFI_SSID=... WIFI_PASSWORD=... cargo build --release --features esp32-http
//!
//! # Continuous-rotation servos instead of an H-bridge
//! cargo build --release --features esp32-http,servo
//! ```

use core::fmt::Debug;
use std::thread;
use std::time::Duration;

use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripherals::Peripherals;
use rs_rover::camera::CameraParam;
use rs_rover::hal::esp32::{hbridge_stage, servo_stage, Esp32Camera};
use rs_rover::motor::{MotorOutputStage, WheelOutput};
use rs_rover::traits::NoopLight;
use rs_rover::{CameraConfig, Config, DriveConfig, MotorKind, Rover};

/// Idle loop interval once the servers are up.
const IDLE_INTERVAL_MS: u64 = 1000;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("================================");
    log::info!("  rs-rover ESP32-CAM");
    log::info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let kind = if cfg!(feature = "servo") {
        MotorKind::Servo
    } else {
        MotorKind::HBridge
    };
    let config = Config::default()
        .with_wifi(
            rs_rover::WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_web(rs_rover::WebConfig::default().with_port(80).with_stream_port(81))
        .with_drive(DriveConfig::default().with_kind(kind))
        .with_camera(CameraConfig::default());

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize Motors (LEDC timer1, channels from 2)
    // =========================================================================
    match config.drive.kind {
        MotorKind::HBridge => {
            let motors = hbridge_stage(
                peripherals.ledc.timer1,
                (
                    peripherals.ledc.channel2,
                    peripherals.ledc.channel3,
                    peripherals.ledc.channel4,
                    peripherals.ledc.channel5,
                ),
                peripherals.pins.gpio2,
                peripherals.pins.gpio4,
                peripherals.pins.gpio14,
                peripherals.pins.gpio15,
                &config.drive,
            )?;
            log::info!("[OK] H-bridge initialized (GPIO2/4/14/15 PWM)");
            run(motors, peripherals.modem, &config)
        }
        MotorKind::Servo => {
            let motors = servo_stage(
                peripherals.ledc.timer1,
                peripherals.ledc.channel2,
                peripherals.ledc.channel3,
                peripherals.pins.gpio2,
                peripherals.pins.gpio14,
                &config.drive,
            )?;
            log::info!("[OK] Servos initialized (GPIO2/14 PWM)");
            run(motors, peripherals.modem, &config)
        }
    }
}

/// Everything after the output stage: camera, WiFi, servers, idle.
fn run<O>(
    motors: MotorOutputStage<O>,
    #[cfg_attr(not(feature = "wifi"), allow(unused_variables))] modem: Modem,
    config: &Config,
) -> anyhow::Result<()>
where
    O: WheelOutput + Send + 'static,
    O::Error: Debug,
{
    // =========================================================================
    // Initialize Camera (OV2640, JPEG)
    // =========================================================================
    let camera = Esp32Camera::init(&config.camera)?;
    log::info!("[OK] Camera initialized");

    let mut rover = Rover::new(motors, camera, NoopLight);
    rover.configure(CameraParam::Flash(config.camera.flash_brightness))?;
    rover.stop()?;

    // =========================================================================
    // Initialize WiFi (required for HTTP)
    // =========================================================================
    #[cfg(feature = "wifi")]
    let _wifi = {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use rs_rover::hal::esp32::Esp32Wifi;

        if config.wifi.enabled && config.wifi.is_configured() {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            let wifi = Esp32Wifi::new(modem, sysloop, Some(nvs), &config.wifi)?;
            log::info!("[OK] WiFi connected: {:?}", wifi.ip_addr());
            Some(wifi)
        } else {
            log::warn!("[SKIP] WiFi not configured (set WIFI_SSID/WIFI_PASSWORD)");
            None
        }
    };

    // =========================================================================
    // Initialize HTTP Servers (control :80, stream :81)
    // =========================================================================
    #[cfg(feature = "esp32-http")]
    let _server = {
        use rs_rover::hal::esp32::Esp32HttpServer;
        use rs_rover::services::{HttpApiHandler, SharedRover};
        use std::sync::Arc;

        if config.web.enabled {
            let shared = Arc::new(SharedRover::new(rover));
            let api = Arc::new(HttpApiHandler::new(shared));
            let server = Esp32HttpServer::new(&config.web, api, camera)?;
            log::info!("[OK] Control page at http://<ip>:{}/", config.web.port);
            log::info!(
                "[OK] Stream at http://<ip>:{}/stream",
                config.web.stream_port
            );
            Some(server)
        } else {
            log::warn!("[SKIP] HTTP disabled");
            None
        }
    };

    #[cfg(not(feature = "esp32-http"))]
    let _rover = {
        log::warn!("[SKIP] HTTP not built (enable esp32-http)");
        rover
    };

    // =========================================================================
    // Idle
    // =========================================================================
    loop {
        thread::sleep(Duration::from_millis(IDLE_INTERVAL_MS));
    }
}
