//! Trait definitions for hardware and camera abstraction.
//!
//! This module defines the core abstractions that allow rs-rover to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Swap motor drivers (H-bridge, continuous-rotation servos)
//! - Stream frames from any JPEG source into any transport
//!
//! # Submodules
//!
//! - `hardware`: PWM channels, wheel identity, clock
//! - `camera`: Camera settings, frame acquisition, light control
//! - `sink`: Chunk sink used by capture and streaming

pub mod camera;
pub mod hardware;
pub mod sink;

pub use camera::*;
pub use hardware::*;
pub use sink::*;
