//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: PWM, camera, light, frame and clock doubles for tests and the
//!   desktop simulator
//! - `esp32`: ESP32-CAM with LEDC motor outputs and the OV2640 driver
//!   (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
