//! Command debouncing and rate limiting.
//!
//! The debouncer runs on a fixed tick. Each tick it applies a dead zone,
//! clamps the axes, and decides whether the current vector is different
//! enough from the last one sent, or old enough, to be worth sending again.
//! This bounds both chatter (at most one command per tick, nothing for
//! sub-threshold jitter) and staleness (a heartbeat at least every
//! `max_send_delay_ms`).
//!
//! # Example
//!
//! ```rust
//! use rs_rover::client::{AxisState, CommandDebouncer, DebounceConfig};
//! use rs_rover::DriveCommand;
//!
//! let mut debouncer = CommandDebouncer::new(DebounceConfig::default());
//! let mut axes = AxisState::new(1.0, 0.0);
//!
//! assert_eq!(debouncer.tick(&mut axes, 50), Some(DriveCommand::new(100, 0)));
//! // Nothing changed and the heartbeat is not due yet
//! assert_eq!(debouncer.tick(&mut axes, 100), None);
//! ```

use crate::drive::DriveCommand;

use super::sampler::AxisState;

/// Debouncer thresholds and timing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebounceConfig {
    /// Per-axis change that counts as a new command.
    ///
    /// Kept below `min_threshold`, so leaving the dead zone always counts
    /// as a change.
    pub change_threshold: f32,
    /// Dead-zone radius.
    pub min_threshold: f32,
    /// Tick interval.
    pub tick_ms: u64,
    /// Heartbeat interval.
    pub max_send_delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            change_threshold: 0.1,
            min_threshold: 0.15,
            tick_ms: 50,
            max_send_delay_ms: 500,
        }
    }
}

impl DebounceConfig {
    /// Set the per-axis change threshold.
    pub fn with_change_threshold(mut self, threshold: f32) -> Self {
        self.change_threshold = threshold;
        self
    }

    /// Set the dead-zone radius.
    pub fn with_min_threshold(mut self, threshold: f32) -> Self {
        self.min_threshold = threshold;
        self
    }

    /// Set the tick interval.
    pub fn with_tick_ms(mut self, ms: u64) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Set the heartbeat interval.
    pub fn with_max_send_delay_ms(mut self, ms: u64) -> Self {
        self.max_send_delay_ms = ms;
        self
    }
}

/// Decides when to send a drive command.
#[derive(Clone, Debug)]
pub struct CommandDebouncer {
    config: DebounceConfig,
    last_sent: AxisState,
    last_sent_ms: u64,
}

impl CommandDebouncer {
    /// Creates a debouncer whose last send was `(0, 0)` at time 0.
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            last_sent: AxisState::ZERO,
            last_sent_ms: 0,
        }
    }

    /// Run one tick.
    ///
    /// Writes the dead zone and clamp back into `axes`, then returns the
    /// command to send, if any.
    pub fn tick(&mut self, axes: &mut AxisState, now_ms: u64) -> Option<DriveCommand> {
        let min = self.config.min_threshold;
        if axes.magnitude_squared() < min * min {
            *axes = AxisState::ZERO;
        }
        axes.forward = axes.forward.clamp(-1.0, 1.0);
        axes.steer = axes.steer.clamp(-1.0, 1.0);

        let threshold = self.config.change_threshold;
        let changed = (axes.forward - self.last_sent.forward).abs() > threshold
            || (axes.steer - self.last_sent.steer).abs() > threshold;
        let stale = now_ms.saturating_sub(self.last_sent_ms) > self.config.max_send_delay_ms;

        if !(changed || stale) {
            return None;
        }

        self.last_sent = *axes;
        self.last_sent_ms = now_ms;
        Some(to_command(*axes))
    }

    /// Axis values last sent.
    pub fn last_sent(&self) -> AxisState {
        self.last_sent
    }

    /// Time of the last send.
    pub fn last_sent_ms(&self) -> u64 {
        self.last_sent_ms
    }

    /// Thresholds and timing in use.
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }
}

/// Scale axes ×100 and round half-up, as browsers do with `Math.round`.
pub fn to_command(axes: AxisState) -> DriveCommand {
    DriveCommand::new(round_percent(axes.forward), round_percent(axes.steer))
}

fn round_percent(value: f32) -> i32 {
    (f64::from(value) * 100.0 + 0.5).floor() as i32
}

/// Pad indicator centre for the given axes: `(steer * 100, -forward * 100)`.
pub fn indicator_position(axes: AxisState) -> (f32, f32) {
    (axes.steer * 100.0, -axes.forward * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> CommandDebouncer {
        CommandDebouncer::new(DebounceConfig::default())
    }

    #[test]
    fn dead_zone_snaps_to_zero() {
        let mut d = debouncer();
        // 0.1² + 0.1² = 0.02 < 0.0225
        let mut axes = AxisState::new(0.1, 0.1);
        d.tick(&mut axes, 50);
        assert_eq!(axes, AxisState::ZERO);
    }

    #[test]
    fn just_outside_dead_zone_keeps_value() {
        let mut d = debouncer();
        let mut axes = AxisState::new(0.16, 0.0);
        assert_eq!(d.tick(&mut axes, 50), Some(DriveCommand::new(16, 0)));
        assert_eq!(axes.forward, 0.16);
    }

    #[test]
    fn small_change_suppressed() {
        let mut d = debouncer();
        let mut axes = AxisState::new(0.05, 0.05);
        assert_eq!(d.tick(&mut axes, 100), None);
    }

    #[test]
    fn heartbeat_after_max_delay() {
        let mut d = debouncer();
        let mut axes = AxisState::new(0.5, 0.0);
        assert!(d.tick(&mut axes, 50).is_some());
        assert_eq!(d.tick(&mut axes, 300), None);
        assert_eq!(d.tick(&mut axes, 550), None);
        assert_eq!(d.tick(&mut axes, 551), Some(DriveCommand::new(50, 0)));
        assert_eq!(d.last_sent_ms(), 551);
    }

    #[test]
    fn heartbeat_while_idle() {
        let mut d = debouncer();
        let mut axes = AxisState::ZERO;
        assert_eq!(d.tick(&mut axes, 400), None);
        assert_eq!(d.tick(&mut axes, 501), Some(DriveCommand::stop()));
    }

    #[test]
    fn change_above_threshold_sends_immediately() {
        let mut d = debouncer();
        let mut axes = AxisState::new(0.5, 0.0);
        d.tick(&mut axes, 50);
        axes.steer = 0.2;
        assert_eq!(d.tick(&mut axes, 100), Some(DriveCommand::new(50, 20)));
    }

    #[test]
    fn clamps_overscaled_pointer() {
        let mut d = debouncer();
        let mut axes = AxisState::new(1.12, -1.12);
        assert_eq!(d.tick(&mut axes, 50), Some(DriveCommand::new(100, -100)));
        assert_eq!(axes, AxisState::new(1.0, -1.0));
    }

    #[test]
    fn release_sends_stop() {
        let mut d = debouncer();
        let mut axes = AxisState::new(1.0, 0.0);
        d.tick(&mut axes, 50);
        axes = AxisState::ZERO;
        assert_eq!(d.tick(&mut axes, 100), Some(DriveCommand::stop()));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_percent(0.125), 13);
        assert_eq!(round_percent(-0.125), -12);
        assert_eq!(round_percent(0.334), 33);
        assert_eq!(round_percent(-1.0), -100);
    }

    #[test]
    fn indicator_inverts_forward() {
        assert_eq!(indicator_position(AxisState::new(0.5, -0.25)), (-25.0, -50.0));
    }
}
