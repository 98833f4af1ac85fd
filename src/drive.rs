//! Drive commands and differential ("tank") mixing.
//!
//! A [`DriveCommand`] carries the two control axes as integer percentages.
//! [`WheelSpeed::mix`] turns them into per-wheel speeds by addition and
//! subtraction. The mix is deliberately not normalised: a full-forward,
//! full-right command yields `left = 200`, and the motor output stage is
//! the one place that clamps.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::{DriveCommand, WheelSpeed};
//!
//! let cmd = DriveCommand::new(60, 20);
//! let speed = WheelSpeed::mix(cmd);
//! assert_eq!(speed, WheelSpeed { left: 80, right: 40 });
//!
//! let hard_turn = WheelSpeed::mix(DriveCommand::new(100, 100));
//! assert_eq!(hard_turn.left, 200);
//! assert_eq!(hard_turn.clamped().left, 100);
//! ```

use core::fmt;

/// Lowest valid wheel speed percentage.
pub const SPEED_MIN: i32 = -100;

/// Highest valid wheel speed percentage.
pub const SPEED_MAX: i32 = 100;

/// One drive request from a client.
///
/// `forward` and `steer` are percentages, conventionally in `[-100, 100]`.
/// Positive `forward` drives the rover ahead, positive `steer` turns right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveCommand {
    /// Forward/backward axis percentage.
    pub forward: i32,
    /// Left/right axis percentage.
    pub steer: i32,
}

impl DriveCommand {
    /// Creates a command from the two axis percentages.
    pub const fn new(forward: i32, steer: i32) -> Self {
        Self { forward, steer }
    }

    /// The all-stop command.
    pub const fn stop() -> Self {
        Self::new(0, 0)
    }

    /// Returns true if both axes are zero.
    pub const fn is_stop(&self) -> bool {
        self.forward == 0 && self.steer == 0
    }

    /// Query string for the `/drive` endpoint.
    ///
    /// ```
    /// use rs_rover::DriveCommand;
    ///
    /// assert_eq!(DriveCommand::new(50, -25).to_query(), "forward=50&steer=-25");
    /// ```
    pub fn to_query(&self) -> String {
        format!("forward={}&steer={}", self.forward, self.steer)
    }

    /// Request path, including query, for the `/drive` endpoint.
    pub fn path(&self) -> String {
        format!("/drive?{}", self.to_query())
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "forward={} steer={}", self.forward, self.steer)
    }
}

/// Per-wheel signed speed percentages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelSpeed {
    /// Left wheel speed.
    pub left: i32,
    /// Right wheel speed.
    pub right: i32,
}

impl WheelSpeed {
    /// Both wheels stopped.
    pub const STOPPED: Self = Self { left: 0, right: 0 };

    /// Creates a wheel speed pair.
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Differential mix: `left = forward + steer`, `right = forward - steer`.
    ///
    /// The result is not clamped. Saturating arithmetic keeps absurd query
    /// values from overflowing.
    pub const fn mix(cmd: DriveCommand) -> Self {
        Self {
            left: cmd.forward.saturating_add(cmd.steer),
            right: cmd.forward.saturating_sub(cmd.steer),
        }
    }

    /// Each component clamped to `[SPEED_MIN, SPEED_MAX]`.
    pub fn clamped(&self) -> Self {
        Self {
            left: clamp_speed(self.left),
            right: clamp_speed(self.right),
        }
    }

    /// Returns true if both components are within the valid range.
    pub fn in_range(&self) -> bool {
        (SPEED_MIN..=SPEED_MAX).contains(&self.left) && (SPEED_MIN..=SPEED_MAX).contains(&self.right)
    }
}

/// Clamp a speed percentage to `[SPEED_MIN, SPEED_MAX]`.
#[inline]
pub fn clamp_speed(speed: i32) -> i32 {
    speed.clamp(SPEED_MIN, SPEED_MAX)
}
