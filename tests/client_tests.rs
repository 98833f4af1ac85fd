//! Integration tests for the client pipeline: events through the sampler,
//! ticks through the debouncer, and the resulting commands applied to a
//! mock rover.

use rs_rover::client::{indicator_position, ArrowKey, PadBounds};
use rs_rover::hal::{mock_stage, MockCamera, MockLight, MockPwm};
use rs_rover::{
    AxisState, CommandDebouncer, DebounceConfig, DriveCommand, HBridgeWheel, InputEvent,
    InputSampler, Rover, WheelSpeed,
};

/// 224 px square, so with the default 1.12 scale one pixel is 0.01.
const PAD: PadBounds = PadBounds::new(0.0, 0.0, 224.0, 224.0);

struct Session {
    sampler: InputSampler,
    debouncer: CommandDebouncer,
    sent: Vec<(u64, DriveCommand)>,
}

impl Session {
    fn new() -> Self {
        Self {
            sampler: InputSampler::default(),
            debouncer: CommandDebouncer::new(DebounceConfig::default()),
            sent: Vec::new(),
        }
    }

    fn event(&mut self, event: InputEvent) {
        self.sampler.handle(event, &PAD);
    }

    fn tick(&mut self, now_ms: u64) -> Option<DriveCommand> {
        let cmd = self.debouncer.tick(self.sampler.axes_mut(), now_ms);
        if let Some(cmd) = cmd {
            self.sent.push((now_ms, cmd));
        }
        cmd
    }

    /// Tick every 50 ms over `(from, to]`.
    fn run(&mut self, from: u64, to: u64) {
        let mut now = from + 50;
        while now <= to {
            self.tick(now);
            now += 50;
        }
    }
}

#[test]
fn held_key_sends_once_then_heartbeats() {
    let mut s = Session::new();
    s.event(InputEvent::KeyDown(ArrowKey::Up));
    s.run(0, 1200);

    let times: Vec<u64> = s.sent.iter().map(|(t, _)| *t).collect();
    assert_eq!(times, vec![50, 600, 1150]);
    assert!(s.sent.iter().all(|(_, c)| *c == DriveCommand::new(100, 0)));
}

#[test]
fn key_release_sends_stop_on_next_tick() {
    let mut s = Session::new();
    s.event(InputEvent::KeyDown(ArrowKey::Up));
    assert_eq!(s.tick(50), Some(DriveCommand::new(100, 0)));

    s.event(InputEvent::KeyUp(ArrowKey::Up));
    assert_eq!(s.tick(100), Some(DriveCommand::stop()));
    assert_eq!(s.tick(150), None);
}

#[test]
fn slow_drag_is_sent_only_past_change_threshold() {
    let mut s = Session::new();
    s.event(InputEvent::MouseDown { x: 112.0, y: 62.0 });
    assert_eq!(s.tick(50), Some(DriveCommand::new(50, 0)));

    s.event(InputEvent::MouseMove { x: 112.0, y: 57.0 });
    assert_eq!(s.tick(100), None);

    s.event(InputEvent::MouseMove { x: 112.0, y: 50.0 });
    assert_eq!(s.tick(150), Some(DriveCommand::new(62, 0)));
}

#[test]
fn dead_zone_wobble_sends_nothing() {
    let mut s = Session::new();
    s.event(InputEvent::TouchStart { x: 122.0, y: 102.0 });
    s.run(0, 400);
    s.event(InputEvent::TouchMove { x: 104.0, y: 118.0 });
    s.run(400, 500);

    assert!(s.sent.is_empty());
    assert_eq!(s.sampler.axes(), AxisState::ZERO);
}

#[test]
fn mouse_up_anywhere_stops() {
    let mut s = Session::new();
    s.event(InputEvent::MouseDown { x: 224.0, y: 0.0 });
    assert_eq!(s.tick(50), Some(DriveCommand::new(100, 100)));

    // Released off-pad; later moves without a button are ignored.
    s.event(InputEvent::MouseUp);
    s.event(InputEvent::MouseMove { x: 0.0, y: 0.0 });
    assert_eq!(s.tick(100), Some(DriveCommand::stop()));
    assert_eq!(s.sampler.axes(), AxisState::ZERO);
}

#[test]
fn indicator_tracks_clamped_axes() {
    let mut s = Session::new();
    s.event(InputEvent::TouchStart { x: 224.0, y: 224.0 });
    s.tick(50);

    let (cx, cy) = indicator_position(s.sampler.axes());
    assert_eq!((cx, cy), (100.0, 100.0));
}

#[test]
fn commands_drive_the_rover() {
    let mut rover: Rover<HBridgeWheel<MockPwm>, _, _> =
        Rover::new(mock_stage(), MockCamera::new(), MockLight::new());
    let mut s = Session::new();

    s.event(InputEvent::KeyDown(ArrowKey::Up));
    s.event(InputEvent::KeyDown(ArrowKey::Right));
    let cmd = s.tick(50).unwrap();
    assert_eq!(rover.drive(cmd).unwrap(), WheelSpeed::new(100, 0));

    s.event(InputEvent::KeyUp(ArrowKey::Up));
    let cmd = s.tick(100).unwrap();
    assert_eq!(rover.drive(cmd).unwrap(), WheelSpeed::new(100, -100));

    s.event(InputEvent::KeyUp(ArrowKey::Right));
    let cmd = s.tick(150).unwrap();
    assert_eq!(rover.drive(cmd).unwrap(), WheelSpeed::STOPPED);
}
