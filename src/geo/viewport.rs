//! Pan/zoom/drag viewport state machine.
//!
//! The transform composes on top of the projection: the drawing host applies
//! translate+scale exactly once to already-projected coordinates, so no shape
//! does its own transform math.

/// Zoom bounds and step sizes shared by wheel and key zoom.
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 4.0;
pub const WHEEL_STEP: f64 = 0.1;
pub const KEY_STEP: f64 = 0.2;

/// Pan offset and zoom scale applied to projected coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform { x: 0.0, y: 0.0, scale: 1.0 };

    /// Compose translate+scale onto a projected point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x + x * self.scale, self.y + y * self.scale)
    }

    /// Undo the transform (screen coordinates back to projected space).
    pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.x) / self.scale, (sy - self.y) / self.scale)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Idle,
    /// Grab offset = pointer position minus translation at press time.
    Dragging { grab: (f64, f64) },
}

/// Interaction state machine owning the transform. All mutations happen
/// through discrete input-event methods on the UI thread.
pub struct Viewport {
    transform: ViewTransform,
    drag: Drag,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            transform: ViewTransform::IDENTITY,
            drag: Drag::Idle,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, Drag::Dragging { .. })
    }

    /// Primary button pressed over the canvas: record the grab offset.
    pub fn press(&mut self, px: f64, py: f64) {
        self.drag = Drag::Dragging {
            grab: (px - self.transform.x, py - self.transform.y),
        };
    }

    /// Pointer moved while dragging: translation follows the pointer.
    pub fn drag_to(&mut self, px: f64, py: f64) {
        if let Drag::Dragging { grab } = self.drag {
            if px.is_finite() && py.is_finite() {
                self.transform.x = px - grab.0;
                self.transform.y = py - grab.1;
            }
        }
    }

    /// Button released, anywhere. Safe to call when idle.
    pub fn release(&mut self) {
        self.drag = Drag::Idle;
    }

    /// Wheel zoom by `notches` (positive = in), keeping the point under the
    /// cursor visually fixed.
    pub fn wheel(&mut self, notches: i32, cursor: (f64, f64)) {
        let old = self.transform.scale;
        let new = (old + WHEEL_STEP * notches as f64).clamp(MIN_SCALE, MAX_SCALE);
        if (new - old).abs() < f64::EPSILON {
            return;
        }
        let ratio = new / old;
        self.transform.x = cursor.0 - (cursor.0 - self.transform.x) * ratio;
        self.transform.y = cursor.1 - (cursor.1 - self.transform.y) * ratio;
        self.transform.scale = new;
    }

    /// Discrete zoom (buttons / `+` `-` keys), centered on the viewport middle.
    pub fn zoom_step(&mut self, direction: i32, viewport_center: (f64, f64)) {
        let old = self.transform.scale;
        let new = (old + KEY_STEP * direction as f64).clamp(MIN_SCALE, MAX_SCALE);
        if (new - old).abs() < f64::EPSILON {
            return;
        }
        let ratio = new / old;
        self.transform.x = viewport_center.0 - (viewport_center.0 - self.transform.x) * ratio;
        self.transform.y = viewport_center.1 - (viewport_center.1 - self.transform.y) * ratio;
        self.transform.scale = new;
    }

    /// Reset to `{x: 0, y: 0, scale: 1}`.
    pub fn reset(&mut self) {
        self.transform = ViewTransform::IDENTITY;
        self.drag = Drag::Idle;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_moves_translation_by_pointer_delta() {
        let mut vp = Viewport::new();
        vp.press(100.0, 100.0);
        vp.drag_to(150.0, 130.0);
        vp.release();
        let t = vp.transform();
        assert!((t.x - 50.0).abs() < 1e-9);
        assert!((t.y - 30.0).abs() < 1e-9);
        assert!((t.scale - 1.0).abs() < 1e-9);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut vp = Viewport::new();
        vp.drag_to(500.0, 500.0);
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn release_ends_drag_even_when_idle() {
        let mut vp = Viewport::new();
        vp.release();
        vp.press(10.0, 10.0);
        vp.release();
        vp.drag_to(90.0, 90.0);
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn non_finite_drag_positions_are_ignored() {
        let mut vp = Viewport::new();
        vp.press(0.0, 0.0);
        vp.drag_to(f64::NAN, 10.0);
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn scale_stays_clamped_under_any_wheel_sequence() {
        let mut vp = Viewport::new();
        for _ in 0..100 {
            vp.wheel(1, (40.0, 20.0));
        }
        assert!((vp.transform().scale - MAX_SCALE).abs() < 1e-9);
        for _ in 0..200 {
            vp.wheel(-1, (3.0, 97.0));
        }
        assert!((vp.transform().scale - MIN_SCALE).abs() < 1e-9);
        assert!(vp.transform().x.is_finite() && vp.transform().y.is_finite());
    }

    #[test]
    fn wheel_zoom_keeps_cursor_point_fixed() {
        let mut vp = Viewport::new();
        vp.press(0.0, 0.0);
        vp.drag_to(13.0, -7.0);
        vp.release();

        let cursor = (120.0, 45.0);
        // Projected-space point currently under the cursor.
        let fixed = vp.transform().invert(cursor.0, cursor.1);

        vp.wheel(1, cursor);
        let after = vp.transform().apply(fixed.0, fixed.1);
        assert!((after.0 - cursor.0).abs() < 1e-9);
        assert!((after.1 - cursor.1).abs() < 1e-9);

        vp.wheel(-1, cursor);
        vp.wheel(-1, cursor);
        let after = vp.transform().apply(fixed.0, fixed.1);
        assert!((after.0 - cursor.0).abs() < 1e-9);
        assert!((after.1 - cursor.1).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_identity() {
        let mut vp = Viewport::new();
        vp.wheel(3, (10.0, 10.0));
        vp.press(0.0, 0.0);
        vp.drag_to(25.0, 25.0);
        vp.reset();
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
        assert!(!vp.is_dragging());
    }

    #[test]
    fn zoom_step_uses_larger_increment_and_clamps() {
        let mut vp = Viewport::new();
        vp.zoom_step(1, (50.0, 50.0));
        assert!((vp.transform().scale - 1.2).abs() < 1e-9);
        for _ in 0..50 {
            vp.zoom_step(-1, (50.0, 50.0));
        }
        assert!((vp.transform().scale - MIN_SCALE).abs() < 1e-9);
    }
}
