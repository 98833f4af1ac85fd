//! Motor output stage: signed wheel speed to PWM duty.
//!
//! Open-loop duty-cycle control only. Each wheel takes a signed speed
//! percentage, the stage clamps it to `[-100, 100]`, and the wheel output
//! turns it into one or two PWM writes.
//!
//! Two wheel outputs are provided:
//!
//! - [`HBridgeWheel`]: two complementary channels per motor (forward and
//!   reverse inputs of a dual H-bridge). Zero speed drives both low, so the
//!   motor coasts rather than brakes.
//! - [`ServoWheel`]: one channel per continuous-rotation servo, pulse width
//!   offset from a neutral point, with a per-wheel trim.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::motor::{HBridgeWheel, MotorOutputStage, Polarity};
//! use rs_rover::hal::MockPwm;
//! use rs_rover::traits::Wheel;
//!
//! let mut stage = MotorOutputStage::new(
//!     HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
//!     HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
//! );
//!
//! stage.set_wheel_speed(Wheel::Left, 50, 0).unwrap();
//! assert_eq!(stage.left().forward_channel().duty, 32768);
//! assert_eq!(stage.left().reverse_channel().duty, 0);
//! ```

use crate::drive::{clamp_speed, WheelSpeed};
use crate::traits::{PwmChannel, Wheel};

/// Duty value corresponding to 100% speed in the 16-bit timer domain.
pub const DUTY_FULL_SCALE: u32 = 65536;

/// Servo neutral pulse (1.5 ms) at 50 Hz with 16-bit resolution.
pub const SERVO_NEUTRAL_DUTY: u32 = 4915;

/// Servo pulse offset for full speed (0.5 ms) at 50 Hz with 16-bit resolution.
pub const SERVO_SPAN_DUTY: u32 = 1638;

/// Convert a signed speed percentage to an unsigned duty magnitude.
///
/// Computes `round(|clamp(speed, -100, 100)| * 65536 / 100)`.
///
/// ```
/// use rs_rover::motor::percent_to_duty;
///
/// assert_eq!(percent_to_duty(0), 0);
/// assert_eq!(percent_to_duty(50), 32768);
/// assert_eq!(percent_to_duty(-50), 32768);
/// assert_eq!(percent_to_duty(100), 65536);
/// assert_eq!(percent_to_duty(250), 65536);
/// ```
pub fn percent_to_duty(speed: i32) -> u32 {
    let magnitude = clamp_speed(speed).unsigned_abs();
    (magnitude * DUTY_FULL_SCALE + 50) / 100
}

/// Direction inversion for one wheel.
///
/// Motors on opposite sides face opposite ways, and wiring may swap the
/// leads. An inverted wheel negates its speed, so a positive speed always
/// means the rover moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Polarity {
    /// Positive speed drives the forward channel.
    #[default]
    Normal,
    /// Positive speed drives the reverse channel.
    Inverted,
}

impl Polarity {
    /// Apply this polarity to a signed value.
    #[inline]
    pub const fn apply(&self, value: i32) -> i32 {
        match self {
            Polarity::Normal => value,
            Polarity::Inverted => -value,
        }
    }
}

/// Duty values for the two channels of an H-bridge input pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ChannelDuty {
    /// Duty for the forward input.
    pub forward: u32,
    /// Duty for the reverse input.
    pub reverse: u32,
}

impl ChannelDuty {
    /// Compute channel duties for a signed speed under the given polarity.
    ///
    /// At most one channel is non-zero.
    pub fn for_speed(speed: i32, polarity: Polarity) -> Self {
        let signed = polarity.apply(clamp_speed(speed));
        let duty = percent_to_duty(signed);
        match signed.signum() {
            1 => Self {
                forward: duty,
                reverse: 0,
            },
            -1 => Self {
                forward: 0,
                reverse: duty,
            },
            _ => Self::default(),
        }
    }
}

/// One physical wheel driver.
///
/// `speed` is already clamped to `[-100, 100]` by [`MotorOutputStage`].
/// `trim` is a signed neutral-point bias; outputs with no neutral point
/// ignore it.
pub trait WheelOutput {
    /// Error type for the underlying PWM writes.
    type Error;

    /// Drive the wheel at the given speed.
    fn apply(&mut self, speed: i32, trim: i16) -> Result<(), Self::Error>;

    /// Best-effort stop after a failed write. Errors are dropped.
    fn halt(&mut self) {
        let _ = self.apply(0, 0);
    }
}

/// DC motor on a dual H-bridge input pair.
#[derive(Debug)]
pub struct HBridgeWheel<P> {
    forward: P,
    reverse: P,
    polarity: Polarity,
}

impl<P: PwmChannel> HBridgeWheel<P> {
    /// Creates a wheel from its forward and reverse PWM channels.
    pub fn new(forward: P, reverse: P, polarity: Polarity) -> Self {
        Self {
            forward,
            reverse,
            polarity,
        }
    }

    /// The forward-input channel.
    pub fn forward_channel(&self) -> &P {
        &self.forward
    }

    /// The reverse-input channel.
    pub fn reverse_channel(&self) -> &P {
        &self.reverse
    }

    /// Configured polarity.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}

impl<P: PwmChannel> WheelOutput for HBridgeWheel<P> {
    type Error = P::Error;

    fn apply(&mut self, speed: i32, _trim: i16) -> Result<(), Self::Error> {
        let duty = ChannelDuty::for_speed(speed, self.polarity);
        let forward = duty.forward.min(self.forward.max_duty());
        let reverse = duty.reverse.min(self.reverse.max_duty());

        // Zero the idle input first so both are never high together.
        if forward == 0 {
            self.forward.set_duty(0)?;
            self.reverse.set_duty(reverse)
        } else {
            self.reverse.set_duty(0)?;
            self.forward.set_duty(forward)
        }
    }

    fn halt(&mut self) {
        // Each input on its own, so one dead channel cannot keep the other high.
        let _ = self.forward.set_duty(0);
        let _ = self.reverse.set_duty(0);
    }
}

/// Continuous-rotation servo on a single 50 Hz PWM channel.
///
/// Stopped with zero trim sends no pulse at all, which releases the servo
/// and avoids creep from a slightly-off neutral point. Any other state
/// writes `neutral + trim + speed * span / 100`.
#[derive(Debug)]
pub struct ServoWheel<P> {
    channel: P,
    polarity: Polarity,
    neutral: u32,
    span: u32,
}

impl<P: PwmChannel> ServoWheel<P> {
    /// Creates a servo wheel with the default neutral point and span.
    pub fn new(channel: P, polarity: Polarity) -> Self {
        Self {
            channel,
            polarity,
            neutral: SERVO_NEUTRAL_DUTY,
            span: SERVO_SPAN_DUTY,
        }
    }

    /// Override the neutral pulse duty.
    pub fn with_neutral(mut self, neutral: u32) -> Self {
        self.neutral = neutral;
        self
    }

    /// Override the full-speed pulse offset.
    pub fn with_span(mut self, span: u32) -> Self {
        self.span = span;
        self
    }

    /// The PWM channel.
    pub fn channel(&self) -> &P {
        &self.channel
    }

    /// Duty that would be written for `speed` and `trim`.
    pub fn duty_for(&self, speed: i32, trim: i16) -> u32 {
        let speed = self.polarity.apply(clamp_speed(speed));
        if speed == 0 && trim == 0 {
            return 0;
        }
        let trim = self.polarity.apply(i32::from(trim));
        let offset = speed * self.span as i32 / 100;
        let duty = self.neutral as i32 + trim + offset;
        (duty.max(0) as u32).min(self.channel.max_duty())
    }
}

impl<P: PwmChannel> WheelOutput for ServoWheel<P> {
    type Error = P::Error;

    fn apply(&mut self, speed: i32, trim: i16) -> Result<(), Self::Error> {
        let duty = self.duty_for(speed, trim);
        self.channel.set_duty(duty)
    }
}

/// Left and right wheel outputs with clamping at the final write.
#[derive(Debug)]
pub struct MotorOutputStage<O> {
    left: O,
    right: O,
}

impl<O: WheelOutput> MotorOutputStage<O> {
    /// Creates a stage from the two wheel outputs.
    pub fn new(left: O, right: O) -> Self {
        Self { left, right }
    }

    /// Drive one wheel. Returns the clamped speed that was applied.
    pub fn set_wheel_speed(&mut self, wheel: Wheel, speed: i32, trim: i16) -> Result<i32, O::Error> {
        let clamped = clamp_speed(speed);
        log::trace!("{} wheel: {} -> {}", wheel.as_str(), speed, clamped);
        self.wheel_mut(wheel).apply(clamped, trim)?;
        Ok(clamped)
    }

    /// Drive both wheels. Returns the clamped speeds that were applied.
    ///
    /// If either write fails both wheels are halted before the error is
    /// returned, so a half-applied command never leaves one side running.
    pub fn apply(&mut self, speed: WheelSpeed, trims: (i16, i16)) -> Result<WheelSpeed, O::Error> {
        let result = self.write_both(speed, trims);
        if result.is_err() {
            log::warn!("wheel write failed, halting both wheels");
            self.halt();
        }
        result
    }

    /// Zero every output, ignoring write errors.
    pub fn halt(&mut self) {
        self.left.halt();
        self.right.halt();
    }

    /// Stop both wheels with no trim applied.
    pub fn stop(&mut self) -> Result<(), O::Error> {
        self.apply(WheelSpeed::STOPPED, (0, 0)).map(|_| ())
    }

    /// The left wheel output.
    pub fn left(&self) -> &O {
        &self.left
    }

    /// The right wheel output.
    pub fn right(&self) -> &O {
        &self.right
    }

    fn write_both(&mut self, speed: WheelSpeed, trims: (i16, i16)) -> Result<WheelSpeed, O::Error> {
        let left = self.set_wheel_speed(Wheel::Left, speed.left, trims.0)?;
        let right = self.set_wheel_speed(Wheel::Right, speed.right, trims.1)?;
        Ok(WheelSpeed::new(left, right))
    }

    fn wheel_mut(&mut self, wheel: Wheel) -> &mut O {
        match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockPwm;

    fn stage(left: Polarity, right: Polarity) -> MotorOutputStage<HBridgeWheel<MockPwm>> {
        MotorOutputStage::new(
            HBridgeWheel::new(MockPwm::new(), MockPwm::new(), left),
            HBridgeWheel::new(MockPwm::new(), MockPwm::new(), right),
        )
    }

    // =========================================================================
    // Duty mapping
    // =========================================================================

    #[test]
    fn duty_rounds_to_nearest() {
        // 1% = 655.36
        assert_eq!(percent_to_duty(1), 655);
        // 3% = 1966.08
        assert_eq!(percent_to_duty(3), 1966);
        // 99% = 64880.64
        assert_eq!(percent_to_duty(99), 64881);
    }

    #[test]
    fn duty_matches_formula_for_all_speeds() {
        for s in -150..=150 {
            let expected = ((s.clamp(-100, 100) as f64).abs() * 65536.0 / 100.0).round() as u32;
            assert_eq!(percent_to_duty(s), expected, "speed {}", s);
        }
    }

    #[test]
    fn channel_duty_exactly_one_side_nonzero() {
        for s in -100..=100 {
            let duty = ChannelDuty::for_speed(s, Polarity::Normal);
            match s.signum() {
                1 => {
                    assert!(duty.forward > 0);
                    assert_eq!(duty.reverse, 0);
                }
                -1 => {
                    assert_eq!(duty.forward, 0);
                    assert!(duty.reverse > 0);
                }
                _ => assert_eq!(duty, ChannelDuty::default()),
            }
        }
    }

    #[test]
    fn inverted_polarity_swaps_channels() {
        let duty = ChannelDuty::for_speed(40, Polarity::Inverted);
        assert_eq!(duty.forward, 0);
        assert_eq!(duty.reverse, percent_to_duty(40));
    }

    // =========================================================================
    // H-bridge stage
    // =========================================================================

    #[test]
    fn stage_clamps_before_write() {
        let mut stage = stage(Polarity::Normal, Polarity::Normal);
        let applied = stage.set_wheel_speed(Wheel::Right, 180, 0).unwrap();
        assert_eq!(applied, 100);
        // Saturated to the channel maximum
        assert_eq!(
            stage.right().forward_channel().duty,
            MockPwm::new().max_duty()
        );
        assert_eq!(stage.right().reverse_channel().duty, 0);
    }

    #[test]
    fn stage_negative_drives_reverse() {
        let mut stage = stage(Polarity::Normal, Polarity::Normal);
        stage.set_wheel_speed(Wheel::Left, -25, 0).unwrap();
        assert_eq!(stage.left().forward_channel().duty, 0);
        assert_eq!(stage.left().reverse_channel().duty, 16384);
    }

    #[test]
    fn stage_zero_coasts() {
        let mut stage = stage(Polarity::Normal, Polarity::Normal);
        stage.set_wheel_speed(Wheel::Left, 60, 0).unwrap();
        stage.set_wheel_speed(Wheel::Left, 0, 0).unwrap();
        assert_eq!(stage.left().forward_channel().duty, 0);
        assert_eq!(stage.left().reverse_channel().duty, 0);
    }

    #[test]
    fn stage_inverted_left_still_means_forward() {
        let mut stage = stage(Polarity::Inverted, Polarity::Normal);
        stage
            .apply(WheelSpeed::new(50, 50), (0, 0))
            .unwrap();
        // Left wired backwards: its reverse input moves the rover forward
        assert_eq!(stage.left().reverse_channel().duty, 32768);
        assert_eq!(stage.left().forward_channel().duty, 0);
        assert_eq!(stage.right().forward_channel().duty, 32768);
        assert_eq!(stage.right().reverse_channel().duty, 0);
    }

    #[test]
    fn stage_never_drives_both_inputs() {
        let mut stage = stage(Polarity::Normal, Polarity::Normal);
        for s in [100, -100, 30, 0, -5, 77] {
            stage.set_wheel_speed(Wheel::Left, s, 0).unwrap();
            let wheel = stage.left();
            assert!(wheel.forward_channel().duty == 0 || wheel.reverse_channel().duty == 0);
        }
    }

    #[test]
    fn stage_zeroes_idle_side_first() {
        let mut stage = stage(Polarity::Normal, Polarity::Normal);
        stage.set_wheel_speed(Wheel::Left, 50, 0).unwrap();
        stage.set_wheel_speed(Wheel::Left, -50, 0).unwrap();
        let fwd = stage.left().forward_channel();
        assert_eq!(fwd.history, vec![32768, 0]);
        // Reverse was zeroed before forward went high, then driven
        let rev = stage.left().reverse_channel();
        assert_eq!(rev.history, vec![0, 32768]);
    }

    #[test]
    fn stage_stop() {
        let mut stage = stage(Polarity::Normal, Polarity::Inverted);
        stage.apply(WheelSpeed::new(90, -90), (0, 0)).unwrap();
        stage.stop().unwrap();
        for wheel in [stage.left(), stage.right()] {
            assert_eq!(wheel.forward_channel().duty, 0);
            assert_eq!(wheel.reverse_channel().duty, 0);
        }
    }

    #[test]
    fn stage_propagates_pwm_error() {
        let mut stage = MotorOutputStage::new(
            HBridgeWheel::new(MockPwm::failing(), MockPwm::new(), Polarity::Normal),
            HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
        );
        assert!(stage.set_wheel_speed(Wheel::Left, 10, 0).is_err());
    }

    #[test]
    fn stage_halts_both_wheels_when_one_write_fails() {
        let mut stage = MotorOutputStage::new(
            HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
            HBridgeWheel::new(MockPwm::new(), MockPwm::failing(), Polarity::Normal),
        );
        let err = stage.apply(WheelSpeed::new(60, -60), (0, 0));
        assert!(err.is_err());

        let left = stage.left();
        assert_eq!(left.forward_channel().history, vec![39322, 0]);
        assert_eq!(left.reverse_channel().duty, 0);
        // The healthy input on the failing wheel was still zeroed
        assert_eq!(stage.right().forward_channel().duty, 0);
    }

    // =========================================================================
    // Servo wheel
    // =========================================================================

    #[test]
    fn servo_stopped_sends_no_pulse() {
        let servo = ServoWheel::new(MockPwm::new(), Polarity::Normal);
        assert_eq!(servo.duty_for(0, 0), 0);
    }

    #[test]
    fn servo_full_speed_offsets() {
        let servo = ServoWheel::new(MockPwm::new(), Polarity::Normal);
        assert_eq!(servo.duty_for(100, 0), SERVO_NEUTRAL_DUTY + SERVO_SPAN_DUTY);
        assert_eq!(servo.duty_for(-100, 0), SERVO_NEUTRAL_DUTY - SERVO_SPAN_DUTY);
        assert_eq!(servo.duty_for(50, 0), SERVO_NEUTRAL_DUTY + SERVO_SPAN_DUTY / 2);
    }

    #[test]
    fn servo_trim_shifts_neutral() {
        let servo = ServoWheel::new(MockPwm::new(), Polarity::Normal);
        assert_eq!(servo.duty_for(100, 20), SERVO_NEUTRAL_DUTY + SERVO_SPAN_DUTY + 20);
        // Trim alone holds the servo at the trimmed neutral
        assert_eq!(servo.duty_for(0, -30), SERVO_NEUTRAL_DUTY - 30);
    }

    #[test]
    fn servo_inverted_mirrors_speed_and_trim() {
        let servo = ServoWheel::new(MockPwm::new(), Polarity::Inverted);
        assert_eq!(
            servo.duty_for(100, 20),
            SERVO_NEUTRAL_DUTY - SERVO_SPAN_DUTY - 20
        );
    }

    #[test]
    fn servo_stage_writes_channel() {
        let mut stage = MotorOutputStage::new(
            ServoWheel::new(MockPwm::new(), Polarity::Normal),
            ServoWheel::new(MockPwm::new(), Polarity::Inverted),
        );
        stage.apply(WheelSpeed::new(100, 100), (0, 0)).unwrap();
        assert_eq!(
            stage.left().channel().duty,
            SERVO_NEUTRAL_DUTY + SERVO_SPAN_DUTY
        );
        assert_eq!(
            stage.right().channel().duty,
            SERVO_NEUTRAL_DUTY - SERVO_SPAN_DUTY
        );
    }

    #[test]
    fn servo_custom_neutral_and_span() {
        let servo = ServoWheel::new(MockPwm::new(), Polarity::Normal)
            .with_neutral(5000)
            .with_span(1000);
        assert_eq!(servo.duty_for(100, 0), 6000);
        assert_eq!(servo.duty_for(-50, 0), 4500);
    }
}
