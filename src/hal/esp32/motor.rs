//! Wheel PWM outputs using ESP32 LEDC.
//!
//! H-bridge wiring uses four channels on one timer (500 Hz, 16-bit):
//! - LEFT_1 (GPIO2) / RIGHT_1 (GPIO14): reverse inputs
//! - LEFT_2 (GPIO4) / RIGHT_2 (GPIO15): forward inputs
//!
//! Servo wiring uses two channels on a 50 Hz timer.

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

use crate::config::DriveConfig;
use crate::motor::{HBridgeWheel, MotorOutputStage, Polarity, ServoWheel};
use crate::traits::PwmChannel;

/// One LEDC channel as a [`PwmChannel`].
pub struct Esp32Pwm<'d> {
    driver: LedcDriver<'d>,
}

impl<'d> Esp32Pwm<'d> {
    /// Wrap a configured LEDC driver, starting at zero duty.
    pub fn new(mut driver: LedcDriver<'d>) -> Result<Self, EspError> {
        driver.set_duty(0)?;
        Ok(Self { driver })
    }
}

impl PwmChannel for Esp32Pwm<'_> {
    type Error = EspError;

    fn set_duty(&mut self, duty: u32) -> Result<(), EspError> {
        self.driver.set_duty(duty)
    }

    fn max_duty(&self) -> u32 {
        self.driver.get_max_duty()
    }
}

fn resolution(bits: u8) -> Resolution {
    match bits {
        0..=8 => Resolution::Bits8,
        9 => Resolution::Bits9,
        10 => Resolution::Bits10,
        11 => Resolution::Bits11,
        12 => Resolution::Bits12,
        13 => Resolution::Bits13,
        14 => Resolution::Bits14,
        15 => Resolution::Bits15,
        _ => Resolution::Bits16,
    }
}

/// Build the H-bridge output stage on four LEDC channels sharing `timer`.
///
/// Channel order is left reverse, left forward, right reverse, right
/// forward, matching `pins::{LEFT_1, LEFT_2, RIGHT_1, RIGHT_2}`.
#[allow(clippy::too_many_arguments)]
pub fn hbridge_stage<'d, T, TI, C0, C0I, C1, C1I, C2, C2I, C3, C3I>(
    timer: T,
    channels: (C0, C1, C2, C3),
    left_1: impl Peripheral<P = impl OutputPin> + 'd,
    left_2: impl Peripheral<P = impl OutputPin> + 'd,
    right_1: impl Peripheral<P = impl OutputPin> + 'd,
    right_2: impl Peripheral<P = impl OutputPin> + 'd,
    config: &DriveConfig,
) -> Result<MotorOutputStage<HBridgeWheel<Esp32Pwm<'d>>>, EspError>
where
    TI: LedcTimer + 'd,
    T: Peripheral<P = TI> + 'd,
    C0I: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    C0: Peripheral<P = C0I> + 'd,
    C1I: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    C1: Peripheral<P = C1I> + 'd,
    C2I: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    C2: Peripheral<P = C2I> + 'd,
    C3I: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    C3: Peripheral<P = C3I> + 'd,
{
    let timer_config = TimerConfig::default()
        .frequency(config.pwm_frequency_hz.Hz())
        .resolution(resolution(config.resolution_bits));
    let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

    let (c0, c1, c2, c3) = channels;
    let left_reverse = Esp32Pwm::new(LedcDriver::new(c0, &timer_driver, left_1)?)?;
    let left_forward = Esp32Pwm::new(LedcDriver::new(c1, &timer_driver, left_2)?)?;
    let right_reverse = Esp32Pwm::new(LedcDriver::new(c2, &timer_driver, right_1)?)?;
    let right_forward = Esp32Pwm::new(LedcDriver::new(c3, &timer_driver, right_2)?)?;

    log::info!(
        "H-bridge PWM: {} Hz, {}-bit",
        config.pwm_frequency_hz,
        config.resolution_bits
    );

    Ok(MotorOutputStage::new(
        HBridgeWheel::new(left_forward, left_reverse, config.left_polarity),
        HBridgeWheel::new(right_forward, right_reverse, config.right_polarity),
    ))
}

/// Build the servo output stage on two LEDC channels sharing `timer`.
pub fn servo_stage<'d, T, TI, CL, CLI, CR, CRI>(
    timer: T,
    left_channel: CL,
    right_channel: CR,
    left_pin: impl Peripheral<P = impl OutputPin> + 'd,
    right_pin: impl Peripheral<P = impl OutputPin> + 'd,
    config: &DriveConfig,
) -> Result<MotorOutputStage<ServoWheel<Esp32Pwm<'d>>>, EspError>
where
    TI: LedcTimer + 'd,
    T: Peripheral<P = TI> + 'd,
    CLI: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    CL: Peripheral<P = CLI> + 'd,
    CRI: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
    CR: Peripheral<P = CRI> + 'd,
{
    let timer_config = TimerConfig::default()
        .frequency(config.servo.frequency_hz.Hz())
        .resolution(resolution(config.resolution_bits));
    let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

    let left = Esp32Pwm::new(LedcDriver::new(left_channel, &timer_driver, left_pin)?)?;
    let right = Esp32Pwm::new(LedcDriver::new(right_channel, &timer_driver, right_pin)?)?;

    log::info!(
        "Servo PWM: {} Hz, neutral {}, span {}",
        config.servo.frequency_hz,
        config.servo.neutral_duty,
        config.servo.span_duty
    );

    let servo = |pwm: Esp32Pwm<'d>, polarity: Polarity| {
        ServoWheel::new(pwm, polarity)
            .with_neutral(config.servo.neutral_duty)
            .with_span(config.servo.span_duty)
    };
    Ok(MotorOutputStage::new(
        servo(left, config.left_polarity),
        servo(right, config.right_polarity),
    ))
}
