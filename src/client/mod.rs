//! Client-side drive logic: input sampling and command debouncing.
//!
//! The web page (`www/control.js`) and the `teleop` terminal binary both run
//! the same pipeline:
//!
//! ```text
//! input events -> InputSampler -> AxisState -> CommandDebouncer (every 50 ms)
//!     -> DriveCommand -> GET /drive?forward=&steer=   (fire and forget)
//! ```
//!
//! Everything here is single-threaded. Event handlers and the tick never
//! run concurrently, so the axis state needs no synchronization.

pub mod debounce;
pub mod sampler;

pub use debounce::{indicator_position, to_command, CommandDebouncer, DebounceConfig};
pub use sampler::{
    ArrowKey, AxisState, InputEvent, InputSampler, PadBounds, PadGeometry, DEFAULT_PAD_SCALE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DriveCommand;

    const PAD: PadBounds = PadBounds::new(0.0, 0.0, 224.0, 224.0);

    #[test]
    fn drag_then_release_sends_stop() {
        let mut sampler = InputSampler::default();
        let mut debouncer = CommandDebouncer::new(DebounceConfig::default());

        sampler.handle(InputEvent::MouseDown { x: 112.0, y: 0.0 }, &PAD);
        let cmd = debouncer.tick(sampler.axes_mut(), 50);
        assert_eq!(cmd, Some(DriveCommand::new(100, 0)));

        sampler.handle(InputEvent::MouseUp, &PAD);
        let cmd = debouncer.tick(sampler.axes_mut(), 100);
        assert_eq!(cmd, Some(DriveCommand::stop()));
    }

    #[test]
    fn jitter_near_center_is_silent() {
        let mut sampler = InputSampler::default();
        let mut debouncer = CommandDebouncer::new(DebounceConfig::default());

        for (i, x) in [110.0, 113.0, 111.0, 114.0].into_iter().enumerate() {
            sampler.handle(InputEvent::TouchMove { x, y: 112.0 }, &PAD);
            let now = 50 * (i as u64 + 1);
            assert_eq!(debouncer.tick(sampler.axes_mut(), now), None);
        }
        assert_eq!(sampler.axes(), AxisState::ZERO);
    }
}
