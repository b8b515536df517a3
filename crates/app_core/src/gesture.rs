//! Touch gesture classification for the single-item viewer

use crate::config::GestureConfig;

/// What a touch ended on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchTarget {
    /// The displayed image or video element
    Media,
    /// Anything else (overlay background, margins)
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Classified touch sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap { target: TouchTarget },
    Swipe(SwipeDirection),
    /// Diagonal or too short to mean anything
    Ignore,
}

/// Effect of a gesture on the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    Dismiss,
    Next,
    Previous,
}

impl Gesture {
    pub fn action(self) -> Option<GestureAction> {
        match self {
            Gesture::Tap { target: TouchTarget::Other } => Some(GestureAction::Dismiss),
            Gesture::Tap { target: TouchTarget::Media } => None,
            // Swiping left pulls in the next item
            Gesture::Swipe(SwipeDirection::Left) => Some(GestureAction::Next),
            Gesture::Swipe(SwipeDirection::Right) => Some(GestureAction::Previous),
            Gesture::Ignore => None,
        }
    }
}

/// Tracks one start/move*/end touch sequence
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    start: Option<(f64, f64)>,
    last: Option<(f64, f64)>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            start: None,
            last: None,
        }
    }

    pub fn start(&mut self, x: f64, y: f64) {
        self.start = Some((x, y));
        self.last = None;
    }

    /// Record movement. Returns true when default scrolling should be suppressed.
    pub fn move_to(&mut self, x: f64, y: f64) -> bool {
        let Some((sx, sy)) = self.start else {
            return false;
        };
        self.last = Some((x, y));

        let dx = (x - sx).abs();
        let dy = (y - sy).abs();
        dx > self.config.scroll_lock_px || dy > self.config.scroll_lock_px
    }

    /// Finish the sequence. `None` if no touch was started.
    pub fn end(&mut self, x: f64, y: f64, target: TouchTarget) -> Option<Gesture> {
        let start = self.start.take();
        let moved = self.last.take();
        let (sx, sy) = start?;

        // A sequence without moves is a tap where it began
        let (ex, ey) = match moved {
            Some(_) => (x, y),
            None => (sx, sy),
        };

        let gesture = self.classify(ex - sx, (ey - sy).abs(), target);
        tracing::debug!("Touch ({}, {}) -> ({}, {}): {:?}", sx, sy, ex, ey, gesture);
        Some(gesture)
    }

    pub fn cancel(&mut self) {
        self.start = None;
        self.last = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }

    fn classify(&self, dx: f64, dy: f64, target: TouchTarget) -> Gesture {
        let total = dx.abs() + dy;

        if total < self.config.tap_max_px {
            Gesture::Tap { target }
        } else if dx.abs() >= self.config.min_swipe_px && dy <= self.config.max_vertical_px {
            if dx > 0.0 {
                Gesture::Swipe(SwipeDirection::Right)
            } else {
                Gesture::Swipe(SwipeDirection::Left)
            }
        } else {
            Gesture::Ignore
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
