//! Input sampling: keyboard and pointer events into a 2-axis vector.
//!
//! Three modalities write the same [`AxisState`]:
//!
//! | Input | Effect |
//! |-------|--------|
//! | Arrow key down | Sets its axis to ±1.0 |
//! | Arrow key up | Sets its axis back to 0.0 |
//! | Mouse press/drag, touch | Both axes from position on the pad |
//! | Mouse up, touch end | Both axes to exactly 0.0 |
//!
//! The last event to write an axis wins. Keyboard and pointer values are
//! never blended.

/// Default pad scale: the drawn pad is `1 + 0.1 + 0.02` times the unit
/// circle, so the rim of the pad maps to slightly past full speed.
pub const DEFAULT_PAD_SCALE: f32 = 1.12;

/// Desired motion, each axis nominally in `[-1, 1]`.
///
/// Pointer input can push an axis past ±1.0; the debouncer clamps.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct AxisState {
    /// Positive is ahead.
    pub forward: f32,
    /// Positive is right.
    pub steer: f32,
}

impl AxisState {
    /// Both axes at rest.
    pub const ZERO: Self = Self {
        forward: 0.0,
        steer: 0.0,
    };

    /// Creates an axis state.
    pub const fn new(forward: f32, steer: f32) -> Self {
        Self { forward, steer }
    }

    /// `forward² + steer²`.
    pub fn magnitude_squared(&self) -> f32 {
        self.forward * self.forward + self.steer * self.steer
    }
}

/// One of the four arrow keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowKey {
    /// Ahead.
    Up,
    /// Back.
    Down,
    /// Steer left.
    Left,
    /// Steer right.
    Right,
}

/// An input event in client (viewport) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Arrow key pressed or auto-repeated.
    KeyDown(ArrowKey),
    /// Arrow key released.
    KeyUp(ArrowKey),
    /// Mouse button pressed on the pad.
    MouseDown { x: f32, y: f32 },
    /// Pointer moved. Ignored unless the button is held.
    MouseMove { x: f32, y: f32 },
    /// Mouse button released, anywhere on the page.
    MouseUp,
    /// Finger down.
    TouchStart { x: f32, y: f32 },
    /// Finger dragged.
    TouchMove { x: f32, y: f32 },
    /// Finger lifted.
    TouchEnd,
}

/// On-screen rectangle of the control pad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PadBounds {
    /// Left edge in client pixels.
    pub left: f32,
    /// Top edge in client pixels.
    pub top: f32,
    /// Width in client pixels.
    pub width: f32,
    /// Height in client pixels.
    pub height: f32,
}

impl PadBounds {
    /// Creates bounds from the pad's client rectangle.
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Centre point of the pad.
    pub fn center(&self) -> (f32, f32) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Mapping from pad position to axis values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PadGeometry {
    /// Axis value at the pad edge.
    pub scale: f32,
}

impl Default for PadGeometry {
    fn default() -> Self {
        Self {
            scale: DEFAULT_PAD_SCALE,
        }
    }
}

impl PadGeometry {
    /// Axis values for a pointer at `(x, y)`.
    ///
    /// The vertical axis is inverted: screen-down is backward.
    ///
    /// ```
    /// use rs_rover::client::{PadBounds, PadGeometry};
    ///
    /// let pad = PadBounds::new(0.0, 0.0, 200.0, 200.0);
    /// let axes = PadGeometry { scale: 1.0 }.axes_at(&pad, 100.0, 0.0);
    /// assert_eq!(axes.forward, 1.0);
    /// assert_eq!(axes.steer, 0.0);
    /// ```
    pub fn axes_at(&self, bounds: &PadBounds, x: f32, y: f32) -> AxisState {
        let steer = 2.0 * ((x - bounds.left) / bounds.width - 0.5) * self.scale;
        let forward = -2.0 * ((y - bounds.top) / bounds.height - 0.5) * self.scale;
        AxisState { forward, steer }
    }
}

/// Folds input events into the current [`AxisState`].
#[derive(Clone, Debug, Default)]
pub struct InputSampler {
    axes: AxisState,
    mouse_down: bool,
    geometry: PadGeometry,
}

impl InputSampler {
    /// Creates a sampler with a non-default pad geometry.
    pub fn new(geometry: PadGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    /// Apply one event. `bounds` is the pad's current on-screen rectangle.
    pub fn handle(&mut self, event: InputEvent, bounds: &PadBounds) {
        match event {
            InputEvent::KeyDown(key) => match key {
                ArrowKey::Up => self.axes.forward = 1.0,
                ArrowKey::Down => self.axes.forward = -1.0,
                ArrowKey::Left => self.axes.steer = -1.0,
                ArrowKey::Right => self.axes.steer = 1.0,
            },
            InputEvent::KeyUp(ArrowKey::Up | ArrowKey::Down) => self.axes.forward = 0.0,
            InputEvent::KeyUp(ArrowKey::Left | ArrowKey::Right) => self.axes.steer = 0.0,
            InputEvent::MouseDown { x, y } => {
                self.axes = self.geometry.axes_at(bounds, x, y);
                self.mouse_down = true;
            }
            InputEvent::MouseMove { x, y } => {
                if self.mouse_down {
                    self.axes = self.geometry.axes_at(bounds, x, y);
                }
            }
            InputEvent::MouseUp => {
                self.axes = AxisState::ZERO;
                self.mouse_down = false;
            }
            InputEvent::TouchStart { x, y } | InputEvent::TouchMove { x, y } => {
                self.axes = self.geometry.axes_at(bounds, x, y);
            }
            InputEvent::TouchEnd => self.axes = AxisState::ZERO,
        }
    }

    /// Current axis values.
    pub fn axes(&self) -> AxisState {
        self.axes
    }

    /// Mutable access for the debouncer, which writes back the dead zone.
    pub fn axes_mut(&mut self) -> &mut AxisState {
        &mut self.axes
    }

    /// Whether a mouse drag is in progress.
    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD: PadBounds = PadBounds::new(100.0, 50.0, 200.0, 200.0);

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn arrow_keys_set_and_release_axes() {
        let mut s = InputSampler::default();
        s.handle(InputEvent::KeyDown(ArrowKey::Up), &PAD);
        s.handle(InputEvent::KeyDown(ArrowKey::Left), &PAD);
        assert_eq!(s.axes(), AxisState::new(1.0, -1.0));

        s.handle(InputEvent::KeyUp(ArrowKey::Left), &PAD);
        assert_eq!(s.axes(), AxisState::new(1.0, 0.0));

        s.handle(InputEvent::KeyDown(ArrowKey::Down), &PAD);
        assert_eq!(s.axes().forward, -1.0);

        // Releasing Up clears the forward axis even though Down set it
        s.handle(InputEvent::KeyUp(ArrowKey::Up), &PAD);
        assert_eq!(s.axes(), AxisState::ZERO);
    }

    #[test]
    fn pad_center_is_zero() {
        let mut s = InputSampler::default();
        let (cx, cy) = PAD.center();
        s.handle(InputEvent::TouchStart { x: cx, y: cy }, &PAD);
        assert!(approx(s.axes().forward, 0.0));
        assert!(approx(s.axes().steer, 0.0));
    }

    #[test]
    fn pad_edges_scale() {
        let mut s = InputSampler::default();
        // Top-right corner
        s.handle(InputEvent::TouchStart { x: 300.0, y: 50.0 }, &PAD);
        assert!(approx(s.axes().forward, DEFAULT_PAD_SCALE));
        assert!(approx(s.axes().steer, DEFAULT_PAD_SCALE));
        // Bottom edge, centre column: screen-down is backward
        s.handle(InputEvent::TouchMove { x: 200.0, y: 250.0 }, &PAD);
        assert!(approx(s.axes().forward, -DEFAULT_PAD_SCALE));
        assert!(approx(s.axes().steer, 0.0));
    }

    #[test]
    fn mouse_move_needs_button() {
        let mut s = InputSampler::default();
        s.handle(InputEvent::MouseMove { x: 300.0, y: 50.0 }, &PAD);
        assert_eq!(s.axes(), AxisState::ZERO);

        s.handle(InputEvent::MouseDown { x: 200.0, y: 100.0 }, &PAD);
        assert!(s.is_mouse_down());
        assert!(approx(s.axes().forward, 0.5 * DEFAULT_PAD_SCALE));

        s.handle(InputEvent::MouseMove { x: 250.0, y: 150.0 }, &PAD);
        assert!(approx(s.axes().steer, 0.5 * DEFAULT_PAD_SCALE));
        assert!(approx(s.axes().forward, 0.0));
    }

    #[test]
    fn release_is_fail_safe() {
        let mut s = InputSampler::default();
        s.handle(InputEvent::MouseDown { x: 300.0, y: 50.0 }, &PAD);
        s.handle(InputEvent::MouseUp, &PAD);
        assert_eq!(s.axes(), AxisState::ZERO);
        assert!(!s.is_mouse_down());

        s.handle(InputEvent::TouchStart { x: 120.0, y: 60.0 }, &PAD);
        s.handle(InputEvent::TouchEnd, &PAD);
        assert_eq!(s.axes(), AxisState::ZERO);
    }

    #[test]
    fn last_writer_wins() {
        let mut s = InputSampler::default();
        s.handle(InputEvent::TouchStart { x: 300.0, y: 250.0 }, &PAD);
        s.handle(InputEvent::KeyDown(ArrowKey::Up), &PAD);
        // Key only replaced forward; steer keeps the pointer value
        assert_eq!(s.axes().forward, 1.0);
        assert!(approx(s.axes().steer, DEFAULT_PAD_SCALE));
    }
}
