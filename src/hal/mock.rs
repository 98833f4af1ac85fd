//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware and camera traits,
//! enabling development and testing on desktop without a board attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPwm`] | [`PwmChannel`] | Records every duty write |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockCamera`] | [`CameraControl`] | Records setter calls, rejects out-of-range values |
//! | [`MockLight`] | [`LightControl`] | Records brightness calls |
//! | [`MockFrames`] | [`FrameSource`] | Queued or repeating JPEG frames |
//! | [`FailingSink`] | [`FrameSink`] | Accepts a fixed number of bytes, then fails |
//!
//! # Example
//!
//! ```rust
//! use rs_rover::{DriveCommand, Rover};
//! use rs_rover::hal::{mock_stage, MockCamera, MockLight};
//!
//! let mut rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
//! rover.drive(DriveCommand::new(0, 25)).unwrap();
//!
//! // Left is wired inverted, so a right turn drives its reverse input
//! let left = rover.motors().left();
//! assert_eq!(left.reverse_channel().duty, 16384);
//! assert_eq!(left.forward_channel().duty, 0);
//! ```
//!
//! [`PwmChannel`]: crate::traits::PwmChannel
//! [`Clock`]: crate::traits::Clock
//! [`CameraControl`]: crate::traits::CameraControl
//! [`LightControl`]: crate::traits::LightControl
//! [`FrameSource`]: crate::traits::FrameSource
//! [`FrameSink`]: crate::traits::FrameSink

use std::collections::VecDeque;

use crate::camera::CameraSettings;
use crate::motor::{HBridgeWheel, MotorOutputStage, Polarity};
use crate::traits::{
    CameraControl, CameraStatus, Clock, FrameSink, FrameSource, LightControl, PwmChannel,
};

/// Error returned by the mocks when asked to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError(pub &'static str);

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock PWM channel for testing.
///
/// Records every duty write for verification. Use the public fields to
/// inspect state after test operations.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockPwm;
/// use rs_rover::traits::PwmChannel;
///
/// let mut pwm = MockPwm::new();
/// pwm.set_duty(1000).unwrap();
/// pwm.set_duty(0).unwrap();
///
/// assert_eq!(pwm.duty, 0);
/// assert_eq!(pwm.history, vec![1000, 0]);
/// assert_eq!(pwm.max_duty(), 65535);
/// ```
#[derive(Debug, Clone)]
pub struct MockPwm {
    /// Last duty written.
    pub duty: u32,
    /// Every duty written, in order.
    pub history: Vec<u32>,
    /// Value reported by `max_duty`.
    pub max_duty: u32,
    /// When true every write fails.
    pub fail: bool,
}

impl MockPwm {
    /// Creates a 16-bit channel.
    pub fn new() -> Self {
        Self {
            duty: 0,
            history: Vec::new(),
            max_duty: 65535,
            fail: false,
        }
    }

    /// Creates a channel whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Override the reported maximum duty.
    pub fn with_max_duty(mut self, max_duty: u32) -> Self {
        self.max_duty = max_duty;
        self
    }

    /// Number of writes so far.
    pub fn writes(&self) -> usize {
        self.history.len()
    }
}

impl Default for MockPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmChannel for MockPwm {
    type Error = MockError;

    fn set_duty(&mut self, duty: u32) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError("pwm write failed"));
        }
        self.duty = duty;
        self.history.push(duty);
        Ok(())
    }

    fn max_duty(&self) -> u32 {
        self.max_duty
    }
}

/// H-bridge stage on mock channels, wired like the reference board
/// (left inverted, right normal).
pub fn mock_stage() -> MotorOutputStage<HBridgeWheel<MockPwm>> {
    MotorOutputStage::new(
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Inverted),
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
    )
}

/// Mock clock for testing.
///
/// Provides controllable time for testing frame timing and debouncing.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockClock;
/// use rs_rover::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Camera Mocks
// ============================================================================

/// Mock camera settings driver.
///
/// Every setter call is recorded, including rejected ones. Values outside
/// the ranges in [`CameraSettings`] are rejected the way the real sensor
/// driver would.
#[derive(Debug, Clone)]
pub struct MockCamera {
    /// Settings accepted so far.
    pub settings: CameraSettings,
    /// Arguments of every `set_frame_size` call.
    pub frame_size_calls: Vec<i32>,
    /// Arguments of every `set_quality` call.
    pub quality_calls: Vec<i32>,
}

impl MockCamera {
    /// Creates a camera at boot settings with no calls recorded.
    pub fn new() -> Self {
        Self {
            settings: CameraSettings::default(),
            frame_size_calls: Vec::new(),
            quality_calls: Vec::new(),
        }
    }

    /// Total setter calls of any kind.
    pub fn call_count(&self) -> usize {
        self.frame_size_calls.len() + self.quality_calls.len()
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraControl for MockCamera {
    type Error = MockError;

    fn set_frame_size(&mut self, index: i32) -> Result<(), MockError> {
        self.frame_size_calls.push(index);
        if !CameraSettings::accepts_frame_size(index) {
            return Err(MockError("frame size out of range"));
        }
        self.settings.frame_size = index;
        Ok(())
    }

    fn set_quality(&mut self, quality: i32) -> Result<(), MockError> {
        self.quality_calls.push(quality);
        if !CameraSettings::accepts_quality(quality) {
            return Err(MockError("quality out of range"));
        }
        self.settings.quality = quality;
        Ok(())
    }

    fn status(&self) -> CameraStatus {
        CameraStatus {
            framesize: self.settings.frame_size,
            quality: self.settings.quality,
        }
    }
}

/// Mock light that records every brightness request.
#[derive(Debug, Clone, Default)]
pub struct MockLight {
    /// Last brightness set.
    pub level: i32,
    /// Arguments of every call.
    pub calls: Vec<i32>,
}

impl MockLight {
    /// Creates a light at brightness 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LightControl for MockLight {
    type Error = core::convert::Infallible;

    fn set_brightness(&mut self, level: i32) -> Result<(), Self::Error> {
        self.level = level;
        self.calls.push(level);
        Ok(())
    }
}

/// Mock frame source.
///
/// Hands out queued frames in order, then either repeats a fixed frame
/// forever or fails, depending on how it was built.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockFrames;
/// use rs_rover::traits::FrameSource;
///
/// let mut frames = MockFrames::new(vec![vec![0xFF, 0xD8, 0xFF, 0xD9]]);
/// {
///     let frame = frames.capture().unwrap();
///     assert_eq!(frame.as_ref().len(), 4);
/// }
/// assert_eq!(frames.released, 1);
/// assert!(frames.capture().is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockFrames {
    queue: VecDeque<Vec<u8>>,
    repeat: Option<Vec<u8>>,
    /// Frames returned to the source (dropped).
    pub released: usize,
    /// Frames handed out.
    pub captured: usize,
}

impl MockFrames {
    /// Source that yields `frames` once each, then fails.
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            queue: frames.into(),
            ..Self::default()
        }
    }

    /// Source that yields `frame` forever.
    pub fn repeating(frame: Vec<u8>) -> Self {
        Self {
            repeat: Some(frame),
            ..Self::default()
        }
    }

    /// Frames outstanding (captured but not yet released).
    pub fn outstanding(&self) -> usize {
        self.captured - self.released
    }
}

/// A frame borrowed from [`MockFrames`]; counts its release on drop.
#[derive(Debug)]
pub struct MockFrame<'a> {
    data: Vec<u8>,
    released: &'a mut usize,
}

impl AsRef<[u8]> for MockFrame<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for MockFrame<'_> {
    fn drop(&mut self) {
        *self.released += 1;
    }
}

impl FrameSource for MockFrames {
    type Error = MockError;
    type Frame<'a> = MockFrame<'a>;

    fn capture(&mut self) -> Result<MockFrame<'_>, MockError> {
        let data = match self.queue.pop_front() {
            Some(frame) => frame,
            None => self.repeat.clone().ok_or(MockError("no frame available"))?,
        };
        self.captured += 1;
        Ok(MockFrame {
            data,
            released: &mut self.released,
        })
    }
}

/// Sink that accepts up to a byte limit, then reports a broken pipe.
#[derive(Debug, Default)]
pub struct FailingSink {
    limit: usize,
    /// Bytes accepted before failing.
    pub data: Vec<u8>,
}

impl FailingSink {
    /// Accept at most `limit` bytes in total.
    pub fn after_bytes(limit: usize) -> Self {
        Self {
            limit,
            data: Vec::new(),
        }
    }
}

impl FrameSink for FailingSink {
    type Error = std::io::Error;

    fn accept(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        if self.data.len() + chunk.len() > self.limit {
            return Err(std::io::ErrorKind::BrokenPipe.into());
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }
}
