//! # rs-rover
//!
//! Firmware and host tooling for a Wi-Fi camera rover: an ESP32-CAM with
//! two drive motors, controlled from a browser page or a terminal.
//!
//! ## Features
//!
//! - **Differential drive**: `forward`/`steer` percentages mixed into
//!   left/right wheel speeds, clamped only at the final PWM write
//! - **Motor output stage**: dual H-bridge or continuous-rotation servos
//!   behind one [`motor::WheelOutput`] trait
//! - **Typed query decoding**: `/drive`, `/config`, `/control` parameters
//!   decoded completely before any side effect
//! - **MJPEG streaming**: multipart stream and single-frame capture over a
//!   [`traits::FrameSink`]
//! - **Client logic**: input sampler and command debouncer, shared by the
//!   browser page and the `teleop` binary
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - PWM, clock, camera, light, and sink abstractions
//! - `drive` - Drive commands and differential mixing
//! - `motor` - Wheel outputs and the two-wheel output stage
//! - `query` - Query-string decoding for the HTTP endpoints
//! - `device` - The [`Rover`] and its state
//! - `stream` - MJPEG and capture plumbing
//! - `client` - Input sampling and send debouncing
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//! - `services` - HTTP handlers (device and desktop simulator)
//!
//! ## Example
//!
//! ```rust
//! use rs_rover::{Rover, WheelSpeed};
//! use rs_rover::hal::{mock_stage, MockCamera, MockLight};
//! use rs_rover::query::parse_drive;
//!
//! let mut rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
//!
//! // GET /drive?forward=80&steer=40
//! let cmd = parse_drive("forward=80&steer=40").unwrap();
//! let applied = rover.drive(cmd).unwrap();
//!
//! // left = 120 is clamped at the motor stage, right = 40 passes through
//! assert_eq!(applied, WheelSpeed::new(100, 40));
//! ```

#![warn(missing_docs)]

/// Camera settings, ranges, and the `/config` parameter type.
pub mod camera;
/// Client-side input sampling and command debouncing.
pub mod client;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Rover device state and endpoint logic.
pub mod device;
/// Drive commands and differential mixing.
pub mod drive;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Wheel outputs and the motor output stage.
pub mod motor;
/// Query-string decoding for the HTTP endpoints.
pub mod query;
/// MJPEG streaming and single-frame capture.
pub mod stream;
/// Core traits for hardware abstraction.
pub mod traits;

/// HTTP services for the device and the desktop simulator (feature-gated).
#[cfg(any(feature = "web", feature = "esp32-http"))]
pub mod services;

// Re-exports for convenience
pub use camera::{CameraParam, CameraSettings};
pub use client::{AxisState, CommandDebouncer, DebounceConfig, InputEvent, InputSampler};
pub use device::{CarCommand, CarState, DeviceState, Rover, RoverError, SpeedLevel};
pub use drive::{DriveCommand, WheelSpeed};
pub use motor::{HBridgeWheel, MotorOutputStage, Polarity, ServoWheel, WheelOutput};
pub use query::{ControlVar, QueryError};
pub use stream::StreamStop;
pub use traits::{
    CameraControl, CameraStatus, Clock, FrameSink, FrameSource, LightControl, PwmChannel, Wheel,
};

// Config re-exports
pub use config::{
    CameraConfig, Config, DriveConfig, MotorKind, ServoConfig, WebConfig, WifiConfig,
};
