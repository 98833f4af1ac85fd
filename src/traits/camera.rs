//! Camera and light collaborator traits.
//!
//! The camera sensor driver, frame-buffer pool, and flash LED are vendor
//! components. The rover only forwards settings to them and pulls encoded
//! JPEG frames out of them, so these traits are deliberately thin.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CameraControl`] | Sensor settings (frame size, JPEG quality) |
//! | [`FrameSource`] | Acquire one encoded JPEG frame |
//! | [`LightControl`] | Flash/headlight brightness |

/// Sensor settings as reported back by the camera driver.
///
/// Serialized as `{"framesize":N,"quality":N}` for the `/status` endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraStatus {
    /// Frame size index currently configured.
    pub framesize: i32,
    /// JPEG quality currently configured (lower is better).
    pub quality: i32,
}

/// Camera sensor settings.
///
/// Values are forwarded unvalidated; the driver is the one that decides
/// whether a frame size or quality is acceptable and reports a rejection
/// through `Err`.
pub trait CameraControl {
    /// Error type returned when the driver rejects a setting.
    type Error;

    /// Set the frame size by driver index.
    fn set_frame_size(&mut self, index: i32) -> Result<(), Self::Error>;

    /// Set the JPEG quality (driver range, typically 10..=63).
    fn set_quality(&mut self, quality: i32) -> Result<(), Self::Error>;

    /// Read back the current settings.
    fn status(&self) -> CameraStatus;
}

/// Source of encoded JPEG frames.
///
/// A frame borrows the source until it is dropped, which is when the
/// underlying buffer goes back to the driver.
pub trait FrameSource {
    /// Error type for a failed capture.
    type Error;

    /// A captured frame. Dropping it releases the frame buffer.
    type Frame<'a>: AsRef<[u8]>
    where
        Self: 'a;

    /// Acquire the next frame.
    fn capture(&mut self) -> Result<Self::Frame<'_>, Self::Error>;
}

/// Flash/headlight brightness.
pub trait LightControl {
    /// Error type for brightness writes.
    type Error;

    /// Set brightness (0..=255 from the settings page).
    fn set_brightness(&mut self, level: i32) -> Result<(), Self::Error>;
}

/// Light control that accepts every brightness and does nothing.
///
/// The reference board has no dimmable LED wired to a PWM channel, so the
/// `flash` setting is accepted and logged, with no hardware effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLight;

impl LightControl for NoopLight {
    type Error = core::convert::Infallible;

    fn set_brightness(&mut self, level: i32) -> Result<(), Self::Error> {
        log::debug!("flash brightness {} (no light fitted)", level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_light_accepts_anything() {
        let mut light = NoopLight;
        assert!(light.set_brightness(0).is_ok());
        assert!(light.set_brightness(255).is_ok());
        assert!(light.set_brightness(-40).is_ok());
        assert!(light.set_brightness(9000).is_ok());
    }

    #[test]
    fn camera_status_default() {
        let status = CameraStatus::default();
        assert_eq!(status.framesize, 0);
        assert_eq!(status.quality, 0);
    }
}
