//! Rover device state and endpoint logic.
//!
//! [`Rover`] owns the motor output stage, the camera settings driver, the
//! light, and all mutable device state (trims, speed level, car state).
//! Every HTTP handler goes through one `Rover`, so there are no shared
//! globals and exactly one writer at a time.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::{DriveCommand, Rover, WheelSpeed};
//! use rs_rover::hal::{mock_stage, MockCamera, MockLight};
//!
//! let mut rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
//!
//! let applied = rover.drive(DriveCommand::new(100, 100)).unwrap();
//! assert_eq!(applied, WheelSpeed::new(100, 0));
//! ```

use core::fmt::Debug;

use thiserror::Error;

use crate::camera::CameraParam;
use crate::drive::{DriveCommand, WheelSpeed};
use crate::motor::{MotorOutputStage, WheelOutput};
use crate::query::{ControlVar, QueryError};
use crate::traits::{CameraControl, CameraStatus, LightControl};

/// Largest servo trim magnitude accepted by `/control?var=ltrim|rtrim`.
pub const MAX_TRIM: i32 = 192;

/// Highest speed level on the button UI.
pub const MAX_SPEED_LEVEL: u8 = 8;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a device operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RoverError {
    /// The request could not be decoded.
    #[error("bad request: {0}")]
    Query(#[from] QueryError),

    /// A PWM write failed. Both wheels were halted before this was returned.
    #[error("motor write failed: {0}")]
    Motor(String),

    /// The camera or light driver rejected a setting.
    #[error("camera driver rejected setting: {0}")]
    Camera(String),

    /// No frame could be captured.
    #[error("frame capture failed: {0}")]
    Capture(String),
}

impl RoverError {
    /// HTTP status code for this error.
    ///
    /// ```
    /// use rs_rover::RoverError;
    /// use rs_rover::query::QueryError;
    ///
    /// assert_eq!(RoverError::from(QueryError::Empty).status_code(), 404);
    /// assert_eq!(RoverError::Capture("no frame".into()).status_code(), 500);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            RoverError::Query(_) => 404,
            RoverError::Motor(_) | RoverError::Camera(_) | RoverError::Capture(_) => 500,
        }
    }

    fn motor(err: impl Debug) -> Self {
        RoverError::Motor(format!("{:?}", err))
    }

    fn camera(err: impl Debug) -> Self {
        RoverError::Camera(format!("{:?}", err))
    }
}

// ============================================================================
// State
// ============================================================================

/// Button-UI speed level, `0..=8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    /// Creates a level, clamped to `0..=8`.
    pub fn new(level: i32) -> Self {
        Self(level.clamp(0, MAX_SPEED_LEVEL as i32) as u8)
    }

    /// Raw level.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Wheel speed percentage for this level.
    pub fn percent(&self) -> i32 {
        i32::from(self.0) * 100 / i32::from(MAX_SPEED_LEVEL)
    }
}

impl Default for SpeedLevel {
    fn default() -> Self {
        Self(MAX_SPEED_LEVEL)
    }
}

/// Last straight-line movement from the button UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CarState {
    /// Not moving. Also set by a trim change.
    #[default]
    Stopped,
    /// Driving forward.
    Forward,
    /// Driving backward.
    Backward,
}

/// Movement requested by `/control?var=car&val=N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarCommand {
    /// Both wheels forward.
    Forward,
    /// Both wheels backward.
    Backward,
    /// Spin left in place.
    TurnLeft,
    /// Spin right in place.
    TurnRight,
    /// Both wheels stopped.
    Stop,
}

impl CarCommand {
    /// Decode the button code. Anything unrecognised is a stop.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => CarCommand::Forward,
            2 => CarCommand::Backward,
            3 => CarCommand::TurnLeft,
            4 => CarCommand::TurnRight,
            _ => CarCommand::Stop,
        }
    }

    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CarCommand::Forward => "Forward",
            CarCommand::Backward => "Backward",
            CarCommand::TurnLeft => "TurnLeft",
            CarCommand::TurnRight => "TurnRight",
            CarCommand::Stop => "Stop",
        }
    }

    /// Wheel speeds for this command at `percent`.
    pub fn wheel_speed(&self, percent: i32) -> WheelSpeed {
        match self {
            CarCommand::Forward => WheelSpeed::new(percent, percent),
            CarCommand::Backward => WheelSpeed::new(-percent, -percent),
            CarCommand::TurnLeft => WheelSpeed::new(-percent, percent),
            CarCommand::TurnRight => WheelSpeed::new(percent, -percent),
            CarCommand::Stop => WheelSpeed::STOPPED,
        }
    }
}

/// All mutable device state. Reset to defaults at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    /// Left servo neutral trim, `-192..=192`.
    pub left_trim: i16,
    /// Right servo neutral trim, `-192..=192`.
    pub right_trim: i16,
    /// Button-UI speed level.
    pub speed_level: SpeedLevel,
    /// Last straight-line button command.
    pub car: CarState,
    /// Wheel speeds last written, after clamping.
    pub last_drive: Option<WheelSpeed>,
}

impl DeviceState {
    /// `(left, right)` servo trims.
    pub fn trims(&self) -> (i16, i16) {
        (self.left_trim, self.right_trim)
    }
}

fn clamp_trim(value: i32) -> i16 {
    value.clamp(-MAX_TRIM, MAX_TRIM) as i16
}

// ============================================================================
// Rover
// ============================================================================

/// The rover: motors, camera settings, light, and device state.
pub struct Rover<O, C, L> {
    motors: MotorOutputStage<O>,
    camera: C,
    light: L,
    state: DeviceState,
}

impl<O, C, L> Rover<O, C, L>
where
    O: WheelOutput,
    O::Error: Debug,
    C: CameraControl,
    C::Error: Debug,
    L: LightControl,
    L::Error: Debug,
{
    /// Creates a rover with boot-time default state.
    pub fn new(motors: MotorOutputStage<O>, camera: C, light: L) -> Self {
        Self {
            motors,
            camera,
            light,
            state: DeviceState::default(),
        }
    }

    /// Mix a drive command and write both wheels.
    ///
    /// Returns the wheel speeds actually applied, which are clamped to
    /// `[-100, 100]` even when the mix exceeds it.
    pub fn drive(&mut self, cmd: DriveCommand) -> Result<WheelSpeed, RoverError> {
        let mixed = WheelSpeed::mix(cmd);
        let applied = self.write_wheels(mixed)?;
        log::debug!(
            "drive {} -> left={} right={}",
            cmd,
            applied.left,
            applied.right
        );
        Ok(applied)
    }

    /// Forward one camera or light setting to its driver.
    pub fn configure(&mut self, param: CameraParam) -> Result<(), RoverError> {
        log::info!("{}", param);
        match param {
            CameraParam::FrameSize(v) => self.camera.set_frame_size(v).map_err(RoverError::camera),
            CameraParam::Quality(v) => self.camera.set_quality(v).map_err(RoverError::camera),
            CameraParam::Flash(v) => self.light.set_brightness(v).map_err(RoverError::camera),
        }
    }

    /// Apply a `/control` button-UI request.
    pub fn control(&mut self, var: ControlVar) -> Result<(), RoverError> {
        match var {
            ControlVar::Camera(param) => self.configure(param),
            ControlVar::Speed(level) => {
                self.state.speed_level = SpeedLevel::new(level);
                log::info!(
                    "speed level {} ({}%)",
                    self.state.speed_level.level(),
                    self.state.speed_level.percent()
                );
                Ok(())
            }
            ControlVar::LeftTrim(value) => {
                self.state.left_trim = clamp_trim(value);
                log::info!("left trim {}", self.state.left_trim);
                self.halt()
            }
            ControlVar::RightTrim(value) => {
                self.state.right_trim = clamp_trim(value);
                log::info!("right trim {}", self.state.right_trim);
                self.halt()
            }
            ControlVar::Car(code) => self.car(CarCommand::from_code(code)),
        }
    }

    /// Execute a button-UI movement at the current speed level.
    pub fn car(&mut self, cmd: CarCommand) -> Result<(), RoverError> {
        log::info!("{}", cmd.as_str());
        let speed = cmd.wheel_speed(self.state.speed_level.percent());
        self.write_wheels(speed)?;
        match cmd {
            CarCommand::Forward => self.state.car = CarState::Forward,
            CarCommand::Backward => self.state.car = CarState::Backward,
            CarCommand::Stop => self.state.car = CarState::Stopped,
            CarCommand::TurnLeft | CarCommand::TurnRight => {}
        }
        Ok(())
    }

    /// Driver-reported camera settings.
    pub fn status(&self) -> CameraStatus {
        self.camera.status()
    }

    /// Stop both wheels.
    pub fn stop(&mut self) -> Result<(), RoverError> {
        self.write_wheels(WheelSpeed::STOPPED).map(|_| ())
    }

    /// Current device state.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// The motor output stage.
    pub fn motors(&self) -> &MotorOutputStage<O> {
        &self.motors
    }

    /// The camera settings driver.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// The flash light driver.
    pub fn light(&self) -> &L {
        &self.light
    }

    fn halt(&mut self) -> Result<(), RoverError> {
        self.state.car = CarState::Stopped;
        self.stop()
    }

    fn write_wheels(&mut self, speed: WheelSpeed) -> Result<WheelSpeed, RoverError> {
        let applied = self
            .motors
            .apply(speed, self.state.trims())
            .map_err(RoverError::motor)?;
        self.state.last_drive = Some(applied);
        Ok(applied)
    }
}
