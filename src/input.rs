//! Input events handed from the surface to the render loop
//!
//! Replaces callback-owned globals: the surface accumulates everything that
//! happened during one pump into an [`InputEvents`] value, and the loop owner
//! applies it to the camera it holds.

/// Keyboard keys the application reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Escape,
}

/// Events gathered during one `poll_events` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputEvents {
    /// Cursor movement, x to the right, y upward.
    pub cursor_delta: (f32, f32),
    /// Vertical scroll amount.
    pub scroll_delta: f32,
    /// Latest framebuffer size if the surface was resized.
    pub resized: Option<(u32, u32)>,
    pub close_requested: bool,
}

impl InputEvents {
    /// Fold another batch into this one.
    pub fn merge(&mut self, other: InputEvents) {
        self.cursor_delta.0 += other.cursor_delta.0;
        self.cursor_delta.1 += other.cursor_delta.1;
        self.scroll_delta += other.scroll_delta;
        if other.resized.is_some() {
            self.resized = other.resized;
        }
        self.close_requested |= other.close_requested;
    }

    pub fn is_empty(&self) -> bool {
        *self == InputEvents::default()
    }
}

/// Turns absolute cursor positions into deltas.
///
/// The first position only primes the latch. Window y grows downward, so the
/// delta's y is inverted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorTracker {
    last: Option<(f64, f64)>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved_to(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let delta = self
            .last
            .map(|(last_x, last_y)| ((x - last_x) as f32, (last_y - y) as f32));
        self.last = Some((x, y));
        delta
    }

    /// Forget the last position, e.g. when the cursor leaves the window.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_position_only_primes() {
        let mut tracker = CursorTracker::new();
        assert_eq!(tracker.moved_to(400.0, 300.0), None);
        assert_eq!(tracker.moved_to(410.0, 295.0), Some((10.0, 5.0)));
    }

    #[test]
    fn test_reset_reprimes() {
        let mut tracker = CursorTracker::new();
        tracker.moved_to(0.0, 0.0);
        tracker.reset();
        assert_eq!(tracker.moved_to(50.0, 50.0), None);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut events = InputEvents {
            cursor_delta: (1.0, 2.0),
            scroll_delta: 1.0,
            ..Default::default()
        };
        events.merge(InputEvents {
            cursor_delta: (3.0, -1.0),
            scroll_delta: -2.0,
            resized: Some((800, 600)),
            close_requested: true,
        });

        assert_eq!(events.cursor_delta, (4.0, 1.0));
        assert_eq!(events.scroll_delta, -1.0);
        assert_eq!(events.resized, Some((800, 600)));
        assert!(events.close_requested);
        assert!(!events.is_empty());
    }
}
