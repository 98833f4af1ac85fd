//! Shared rover state for the HTTP services.
//!
//! `SharedRover` wraps the single [`Rover`] behind a `Mutex`, so every
//! request handler (on any server thread) goes through the same device
//! state and at most one of them writes to the motors at a time.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rs_rover::{DriveCommand, Rover};
//! use rs_rover::hal::{mock_stage, MockCamera, MockLight};
//! use rs_rover::services::{RoverProvider, SharedRover};
//!
//! let rover = Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
//! let shared = Arc::new(SharedRover::new(rover));
//!
//! shared.drive(DriveCommand::new(50, 0)).unwrap();
//! let last = shared.with_rover(|rover| rover.state().last_drive);
//! assert!(last.is_some());
//! ```

use core::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::camera::CameraParam;
use crate::device::{Rover, RoverError};
use crate::drive::{DriveCommand, WheelSpeed};
use crate::motor::WheelOutput;
use crate::query::ControlVar;
use crate::traits::{CameraControl, CameraStatus, LightControl};

// ============================================================================
// Rover Provider Trait
// ============================================================================

/// Device operations the HTTP handlers need.
///
/// Lets the handler core run against a locked rover on the device or the
/// simulator without knowing the concrete motor, camera, or light types.
pub trait RoverProvider: Send + Sync {
    /// Mix and apply a drive command.
    fn drive(&self, cmd: DriveCommand) -> Result<WheelSpeed, RoverError>;

    /// Forward one camera or light setting.
    fn configure(&self, param: CameraParam) -> Result<(), RoverError>;

    /// Apply a legacy button-UI request.
    fn control(&self, var: ControlVar) -> Result<(), RoverError>;

    /// Driver-reported camera settings.
    fn status(&self) -> CameraStatus;
}

// ============================================================================
// Shared Rover
// ============================================================================

/// The rover behind a lock, plus a common time base.
pub struct SharedRover<O, C, L> {
    rover: Mutex<Rover<O, C, L>>,
    start_time: Instant,
}

impl<O, C, L> SharedRover<O, C, L>
where
    O: WheelOutput,
    O::Error: Debug,
    C: CameraControl,
    C::Error: Debug,
    L: LightControl,
    L::Error: Debug,
{
    /// Takes ownership of the rover.
    pub fn new(rover: Rover<O, C, L>) -> Self {
        Self {
            rover: Mutex::new(rover),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since this state was created.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Run `f` with exclusive access to the rover.
    ///
    /// The closure form keeps the lock from being held across an await
    /// point in the async simulator.
    pub fn with_rover<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Rover<O, C, L>) -> R,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Stop both wheels. Used on shutdown and when a client goes away.
    pub fn stop(&self) -> Result<(), RoverError> {
        self.with_rover(|rover| rover.stop())
    }

    // A panic inside one handler must not wedge every later request.
    fn lock(&self) -> MutexGuard<'_, Rover<O, C, L>> {
        self.rover
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// RoverProvider Implementation
// ============================================================================

impl<O, C, L> RoverProvider for SharedRover<O, C, L>
where
    O: WheelOutput + Send,
    O::Error: Debug,
    C: CameraControl + Send,
    C::Error: Debug,
    L: LightControl + Send,
    L::Error: Debug,
{
    fn drive(&self, cmd: DriveCommand) -> Result<WheelSpeed, RoverError> {
        self.with_rover(|rover| rover.drive(cmd))
    }

    fn configure(&self, param: CameraParam) -> Result<(), RoverError> {
        self.with_rover(|rover| rover.configure(param))
    }

    fn control(&self, var: ControlVar) -> Result<(), RoverError> {
        self.with_rover(|rover| rover.control(var))
    }

    fn status(&self) -> CameraStatus {
        self.with_rover(|rover| rover.status())
    }
}

impl<T: RoverProvider + ?Sized> RoverProvider for Arc<T> {
    fn drive(&self, cmd: DriveCommand) -> Result<WheelSpeed, RoverError> {
        (**self).drive(cmd)
    }

    fn configure(&self, param: CameraParam) -> Result<(), RoverError> {
        (**self).configure(param)
    }

    fn control(&self, var: ControlVar) -> Result<(), RoverError> {
        (**self).control(var)
    }

    fn status(&self) -> CameraStatus {
        (**self).status()
    }
}
