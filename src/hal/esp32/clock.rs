//! ESP32 clock implementation using the ESP-IDF high-resolution timer.

use crate::traits::Clock;

/// ESP32 clock using the hardware timer.
///
/// Wraps `esp_timer_get_time()`, which counts microseconds since boot.
/// Used to time frames in the MJPEG stream.
///
/// # Example
///
/// ```ignore
/// use rs_rover::hal::esp32::Esp32Clock;
/// use rs_rover::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let start = clock.now_ms();
/// // ... capture a frame ...
/// let frame_ms = clock.now_ms() - start;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates the clock. The timer is already running after boot.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // SAFETY: plain read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
