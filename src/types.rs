use std::time::Instant;

pub const NUM_LANDMARKS: usize = 21;

/// MediaPipe hand-landmark vocabulary. Only the two tips participate in
/// pointer control; the rest are drawn by the skeleton overlay.
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

/// One decoded camera frame. The control loop owns it for exactly one tick:
/// the overlay renderer mutates `rgba` in place, everything else reads it.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture instant, used to skip re-detection on an unchanged frame.
    pub timestamp: Instant,
}

/// A landmark normalized to [0, 1] relative to the frame. Depth comes from
/// the model but nothing downstream consumes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A single detected hand for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct HandPose {
    pub landmarks: [Landmark; NUM_LANDMARKS],
}

impl HandPose {
    pub fn index_tip(&self) -> Landmark {
        self.landmarks[INDEX_TIP]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[THUMB_TIP]
    }
}

/// Screen-pixel cursor state. Persists across ticks; only a tick with a
/// detected pose may change it, so detection gaps never snap the cursor
/// back to a default position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub is_pinching: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        CursorState {
            x: 0.0,
            y: 0.0,
            is_pinching: false,
        }
    }
}
