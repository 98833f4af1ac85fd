//! Hardware abstraction traits for PWM output and timekeeping.
//!
//! This module defines the hardware interfaces the drive pipeline is written
//! against, so the same mixing and output logic runs on the ESP32 and in
//! desktop tests.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PwmChannel`] | One hardware PWM output (duty-cycle write) |
//! | [`Clock`] | Monotonic millisecond time source |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_rover::traits::PwmChannel;
//! use rs_rover::hal::MockPwm;
//!
//! let mut pwm = MockPwm::new();
//! pwm.set_duty(32768).unwrap();
//! assert_eq!(pwm.duty, 32768);
//! ```

/// Which side of the rover a wheel is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Wheel {
    /// Left-hand wheel (viewed from behind the rover).
    Left,
    /// Right-hand wheel.
    Right,
}

impl Wheel {
    /// Both wheels, left first.
    pub const ALL: [Wheel; 2] = [Wheel::Left, Wheel::Right];

    /// Returns the wheel name as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_rover::traits::Wheel;
    ///
    /// assert_eq!(Wheel::Left.as_str(), "left");
    /// assert_eq!(Wheel::Right.as_str(), "right");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Wheel::Left => "left",
            Wheel::Right => "right",
        }
    }
}

/// A single hardware PWM output.
///
/// Implement this for whatever drives one motor-driver input pin. The
/// motor output stage computes duty values in the 16-bit domain and
/// saturates them to [`max_duty`](Self::max_duty) before calling
/// [`set_duty`](Self::set_duty).
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_rover::traits::PwmChannel;
///
/// struct MyPwm { /* timer/channel handles */ }
///
/// impl PwmChannel for MyPwm {
///     type Error = ();
///
///     fn set_duty(&mut self, duty: u32) -> Result<(), ()> {
///         // Write compare register...
///         Ok(())
///     }
///
///     fn max_duty(&self) -> u32 {
///         65535
///     }
/// }
/// ```
pub trait PwmChannel {
    /// Error type for PWM writes.
    type Error;

    /// Write a raw duty-cycle value.
    fn set_duty(&mut self, duty: u32) -> Result<(), Self::Error>;

    /// Largest duty value the channel accepts (fully on).
    fn max_duty(&self) -> u32;
}

/// Time source trait.
///
/// Provides monotonic time in milliseconds for stream frame timing and
/// command debouncing. On desktop, this can wrap `std::time::Instant`.
/// On the ESP32, it reads the hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_rover::traits::Clock;
/// use rs_rover::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source backed by `std::time::Instant`.
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    start: std::time::Instant,
}

impl StdClock {
    /// Creates a clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_all_order() {
        assert_eq!(Wheel::ALL, [Wheel::Left, Wheel::Right]);
    }

    #[test]
    fn wheel_debug() {
        assert_eq!(format!("{:?}", Wheel::Left), "Left");
        assert_eq!(format!("{:?}", Wheel::Right), "Right");
    }

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    struct CountingPwm {
        writes: usize,
    }

    impl PwmChannel for CountingPwm {
        type Error = ();

        fn set_duty(&mut self, _duty: u32) -> Result<(), ()> {
            self.writes += 1;
            Ok(())
        }

        fn max_duty(&self) -> u32 {
            1023
        }
    }

    #[test]
    fn pwm_channel_object_usage() {
        let mut pwm = CountingPwm { writes: 0 };
        pwm.set_duty(10).unwrap();
        pwm.set_duty(20).unwrap();
        assert_eq!(pwm.writes, 2);
        assert_eq!(pwm.max_duty(), 1023);
    }
}
