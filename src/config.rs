//! Shared configuration for the device, the simulator, and teleop.
//!
//! String fields use `heapless::String` so the same structs can be baked
//! into firmware as constants.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::config::{CameraConfig, Config, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.web.stream_port, 81);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_web(WebConfig::default().with_port(8080).with_stream_port(8081))
//!     .with_camera(CameraConfig::default().with_quality(12));
//! ```

use heapless::String as HString;

use crate::client::DebounceConfig;
use crate::motor::{Polarity, SERVO_NEUTRAL_DUTY, SERVO_SPAN_DUTY};

/// Maximum length for config strings (SSIDs, names, hosts)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut end = s.len().min(MAX_SHORT_STRING);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut hs = ShortString::new();
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// HTTP servers
    pub web: WebConfig,
    /// Motor outputs and client debouncing
    pub drive: DriveConfig,
    /// Camera settings applied at boot
    pub camera: CameraConfig,
}

impl Config {
    /// Set the WiFi station config
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set the HTTP server config
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set the motor output and debounce config
    pub fn with_drive(mut self, drive: DriveConfig) -> Self {
        self.drive = drive;
        self
    }

    /// Set the boot camera settings
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// HTTP server configuration
///
/// The control page and the MJPEG stream run on separate servers so a
/// blocked stream handler never stalls `/drive`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Control server port (pages, `/drive`, `/config`, `/capture`)
    pub port: u16,
    /// Stream server port (`/stream`)
    pub stream_port: u16,
    /// Whether to send `Access-Control-Allow-Origin: *`
    pub cors_permissive: bool,
    /// Whether the servers are started at all
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            stream_port: 81,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the control server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the stream server port
    pub fn with_stream_port(mut self, port: u16) -> Self {
        self.stream_port = port;
        self
    }

    /// Send or omit the permissive CORS header
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Start or skip both servers
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Drive Config
// ============================================================================

/// Which wheel driver the board carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotorKind {
    /// Two DC motors on a dual H-bridge (four PWM channels)
    #[default]
    HBridge,
    /// Two continuous-rotation servos (two PWM channels)
    Servo,
}

/// Motor output configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveConfig {
    /// Wheel driver fitted; the device builds its output stage from this
    pub kind: MotorKind,
    /// Left wheel direction inversion
    pub left_polarity: Polarity,
    /// Right wheel direction inversion
    pub right_polarity: Polarity,
    /// H-bridge PWM frequency
    pub pwm_frequency_hz: u32,
    /// PWM timer resolution
    pub resolution_bits: u8,
    /// Servo pulse timing
    pub servo: ServoConfig,
    /// Client-side command debouncing
    pub debounce: DebounceConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            kind: MotorKind::HBridge,
            left_polarity: Polarity::Inverted,
            right_polarity: Polarity::Normal,
            pwm_frequency_hz: 500,
            resolution_bits: 16,
            servo: ServoConfig::default(),
            debounce: DebounceConfig::default(),
        }
    }
}

impl DriveConfig {
    /// Set the wheel driver kind
    pub fn with_kind(mut self, kind: MotorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set both wheels' direction inversion
    pub fn with_polarity(mut self, left: Polarity, right: Polarity) -> Self {
        self.left_polarity = left;
        self.right_polarity = right;
        self
    }

    /// Set the H-bridge PWM frequency
    pub fn with_pwm_frequency_hz(mut self, hz: u32) -> Self {
        self.pwm_frequency_hz = hz;
        self
    }

    /// Set the PWM resolution, clamped to the 1..=16 bits LEDC supports
    pub fn with_resolution_bits(mut self, bits: u8) -> Self {
        self.resolution_bits = bits.clamp(1, 16);
        self
    }

    /// Set the servo pulse timing
    pub fn with_servo(mut self, servo: ServoConfig) -> Self {
        self.servo = servo;
        self
    }

    /// Set the client debouncing used by teleop
    pub fn with_debounce(mut self, debounce: DebounceConfig) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Continuous-rotation servo pulse timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoConfig {
    /// Servo PWM frequency
    pub frequency_hz: u32,
    /// Duty for the stopped pulse width
    pub neutral_duty: u32,
    /// Duty offset for full speed
    pub span_duty: u32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 50,
            neutral_duty: SERVO_NEUTRAL_DUTY,
            span_duty: SERVO_SPAN_DUTY,
        }
    }
}

impl ServoConfig {
    /// Set the stopped pulse duty
    pub fn with_neutral_duty(mut self, duty: u32) -> Self {
        self.neutral_duty = duty;
        self
    }

    /// Set the full-speed pulse offset
    pub fn with_span_duty(mut self, duty: u32) -> Self {
        self.span_duty = duty;
        self
    }
}

// ============================================================================
// Camera Config
// ============================================================================

/// Camera settings applied at boot (the settings page defaults)
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraConfig {
    /// Frame size index, `0..=6`
    pub frame_size: i32,
    /// JPEG quality, `10..=63` (lower is better)
    pub quality: i32,
    /// Flash LED brightness, `0..=255`
    pub flash_brightness: i32,
    /// Number of frame buffers the driver allocates
    pub frame_buffers: u8,
    /// Camera master clock
    pub xclk_hz: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_size: 5,
            quality: 10,
            flash_brightness: 10,
            frame_buffers: 2,
            xclk_hz: 20_000_000,
        }
    }
}

impl CameraConfig {
    /// Set the boot frame size
    pub fn with_frame_size(mut self, index: i32) -> Self {
        self.frame_size = index;
        self
    }

    /// Set the boot JPEG quality
    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the boot flash brightness
    pub fn with_flash_brightness(mut self, level: i32) -> Self {
        self.flash_brightness = level;
        self
    }

    /// Set the frame buffer count (at least one)
    pub fn with_frame_buffers(mut self, count: u8) -> Self {
        self.frame_buffers = count.max(1);
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Whether WiFi is enabled
    pub enabled: bool,
    /// Maximum connection retry attempts (0 = unlimited)
    pub max_retries: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            enabled: true,
            max_retries: 5,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set how long the association keeps retrying
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the association retry limit (0 = unlimited)
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
