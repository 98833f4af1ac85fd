//! ESP32-CAM hardware abstraction layer for the camera rover.
//!
//! This module provides hardware implementations for an AI-Thinker
//! ESP32-CAM style board driving two motors and streaming from its OV2640.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa dual core, 4MB PSRAM)
//! - **Camera**: OV2640 on the board's DVP connector
//! - **Motor Driver**: dual H-bridge (e.g. DRV8833), or two continuous-rotation servos
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments. The camera claims LEDC
//! timer 0 / channel 0 for its XCLK; the motors use timer 1 and channels 2..=5.

mod camera;
mod clock;
mod motor;

pub use camera::{CameraError, Esp32Camera, Esp32Frame};
pub use clock::Esp32Clock;
pub use motor::{hbridge_stage, servo_stage, Esp32Pwm};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::{EspSink, Esp32HttpServer};

/// Pin assignments for the ESP32-CAM rover.
pub mod pins {
    // =========================================================================
    // Motor Control (dual H-bridge)
    // =========================================================================

    /// Left motor input 1 (driven when reversing)
    pub const LEFT_1: i32 = 2;

    /// Left motor input 2 (driven when going forward)
    pub const LEFT_2: i32 = 4;

    /// Right motor input 1 (driven when reversing)
    pub const RIGHT_1: i32 = 14;

    /// Right motor input 2 (driven when going forward)
    pub const RIGHT_2: i32 = 15;

    // =========================================================================
    // Camera (AI-Thinker pinout)
    // =========================================================================

    /// Sensor power-down
    pub const CAM_PWDN: i32 = 32;
    /// Sensor reset (not wired)
    pub const CAM_RESET: i32 = -1;
    /// Master clock out
    pub const CAM_XCLK: i32 = 0;
    /// SCCB data
    pub const CAM_SIOD: i32 = 26;
    /// SCCB clock
    pub const CAM_SIOC: i32 = 27;
    /// Pixel data D7
    pub const CAM_Y9: i32 = 35;
    /// Pixel data D6
    pub const CAM_Y8: i32 = 34;
    /// Pixel data D5
    pub const CAM_Y7: i32 = 39;
    /// Pixel data D4
    pub const CAM_Y6: i32 = 36;
    /// Pixel data D3
    pub const CAM_Y5: i32 = 21;
    /// Pixel data D2
    pub const CAM_Y4: i32 = 19;
    /// Pixel data D1
    pub const CAM_Y3: i32 = 18;
    /// Pixel data D0
    pub const CAM_Y2: i32 = 5;
    /// Vertical sync
    pub const CAM_VSYNC: i32 = 25;
    /// Horizontal reference
    pub const CAM_HREF: i32 = 23;
    /// Pixel clock
    pub const CAM_PCLK: i32 = 22;
}
