//! Camera settings as exposed on the control surface.
//!
//! The sensor driver owns the real settings. This module names the three
//! parameters the HTTP surface can change and the ranges the settings page
//! offers for them. The device forwards values unvalidated; the ranges are
//! only enforced by simulated drivers.

use core::fmt;
use core::ops::RangeInclusive;

/// Frame size indices offered by the settings page.
pub const FRAME_SIZE_RANGE: RangeInclusive<i32> = 0..=6;

/// JPEG quality range accepted by the sensor (lower is better).
pub const QUALITY_RANGE: RangeInclusive<i32> = 10..=63;

/// Flash brightness range offered by the settings page.
pub const FLASH_RANGE: RangeInclusive<i32> = 0..=255;

/// One camera parameter change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraParam {
    /// `framesize`: sensor frame size index.
    FrameSize(i32),
    /// `quality`: JPEG quality.
    Quality(i32),
    /// `flash`: light brightness.
    Flash(i32),
}

impl CameraParam {
    /// Query keys recognised by `/config`.
    pub const KEYS: [&'static str; 3] = ["framesize", "quality", "flash"];

    /// Builds a parameter from its query key.
    ///
    /// ```
    /// use rs_rover::camera::CameraParam;
    ///
    /// assert_eq!(CameraParam::from_key("quality", 15), Some(CameraParam::Quality(15)));
    /// assert_eq!(CameraParam::from_key("brightness", 1), None);
    /// ```
    pub fn from_key(key: &str, value: i32) -> Option<Self> {
        match key {
            "framesize" => Some(Self::FrameSize(value)),
            "quality" => Some(Self::Quality(value)),
            "flash" => Some(Self::Flash(value)),
            _ => None,
        }
    }

    /// The query key for this parameter.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::FrameSize(_) => "framesize",
            Self::Quality(_) => "quality",
            Self::Flash(_) => "flash",
        }
    }

    /// The raw value.
    pub const fn value(&self) -> i32 {
        match self {
            Self::FrameSize(v) | Self::Quality(v) | Self::Flash(v) => *v,
        }
    }
}

impl fmt::Display for CameraParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

/// Snapshot of the three adjustable camera settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraSettings {
    /// Frame size index.
    pub frame_size: i32,
    /// JPEG quality.
    pub quality: i32,
    /// Flash brightness.
    pub flash_brightness: i32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            frame_size: 5,
            quality: 10,
            flash_brightness: 10,
        }
    }
}

impl CameraSettings {
    /// Whether `index` names a supported frame size.
    pub fn accepts_frame_size(index: i32) -> bool {
        FRAME_SIZE_RANGE.contains(&index)
    }

    /// Whether `quality` is inside the JPEG quality range.
    pub fn accepts_quality(quality: i32) -> bool {
        QUALITY_RANGE.contains(&quality)
    }

    /// Whether `level` is a valid flash brightness.
    pub fn accepts_flash(level: i32) -> bool {
        FLASH_RANGE.contains(&level)
    }

    /// Returns true if `param` is inside the page's offered range.
    pub fn accepts(param: CameraParam) -> bool {
        match param {
            CameraParam::FrameSize(v) => Self::accepts_frame_size(v),
            CameraParam::Quality(v) => Self::accepts_quality(v),
            CameraParam::Flash(v) => Self::accepts_flash(v),
        }
    }

    /// Store `param` without range checking.
    pub fn set(&mut self, param: CameraParam) {
        match param {
            CameraParam::FrameSize(v) => self.frame_size = v,
            CameraParam::Quality(v) => self.quality = v,
            CameraParam::Flash(v) => self.flash_brightness = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_page() {
        let s = CameraSettings::default();
        assert_eq!(s.frame_size, 5);
        assert_eq!(s.quality, 10);
        assert_eq!(s.flash_brightness, 10);
    }

    #[test]
    fn range_bounds() {
        assert!(CameraSettings::accepts_frame_size(0));
        assert!(CameraSettings::accepts_frame_size(6));
        assert!(!CameraSettings::accepts_frame_size(7));
        assert!(!CameraSettings::accepts_frame_size(-1));

        assert!(CameraSettings::accepts_quality(10));
        assert!(CameraSettings::accepts_quality(63));
        assert!(!CameraSettings::accepts_quality(9));
        assert!(!CameraSettings::accepts_quality(64));

        assert!(CameraSettings::accepts_flash(0));
        assert!(CameraSettings::accepts_flash(255));
        assert!(!CameraSettings::accepts_flash(256));
    }

    #[test]
    fn set_touches_one_field() {
        let mut s = CameraSettings::default();
        s.set(CameraParam::Quality(40));
        assert_eq!(
            s,
            CameraSettings {
                quality: 40,
                ..CameraSettings::default()
            }
        );
    }

    #[test]
    fn param_keys_round_trip() {
        for key in CameraParam::KEYS {
            let param = CameraParam::from_key(key, 3).unwrap();
            assert_eq!(param.key(), key);
            assert_eq!(param.value(), 3);
        }
    }

    #[test]
    fn param_display() {
        assert_eq!(CameraParam::FrameSize(4).to_string(), "framesize=4");
    }
}
