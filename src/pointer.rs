use crate::types::{CursorState, HandPose};

/// Normalized-space distance between index tip and thumb tip below which the
/// hand counts as pinching. Landmarks are pre-normalized, so the threshold is
/// resolution-independent.
pub const PINCH_DISTANCE: f32 = 0.05;

/// A synthetic click request, in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEvent {
    pub x: f32,
    pub y: f32,
}

/// Turns one detected pose into the next cursor state, firing a click only on
/// the rising edge of the pinch. The mapping is deliberately un-mirrored:
/// hand motion to the right moves the cursor to the right.
pub fn interpret(
    pose: &HandPose,
    previous: CursorState,
    display: (f32, f32),
) -> (CursorState, Option<ClickEvent>) {
    let index = pose.index_tip();
    let thumb = pose.thumb_tip();

    let screen_x = index.x * display.0;
    let screen_y = index.y * display.1;

    let distance = ((index.x - thumb.x).powi(2) + (index.y - thumb.y).powi(2)).sqrt();
    let is_pinching = distance < PINCH_DISTANCE;

    let click = if is_pinching && !previous.is_pinching {
        Some(ClickEvent {
            x: screen_x,
            y: screen_y,
        })
    } else {
        None
    };

    (
        CursorState {
            x: screen_x,
            y: screen_y,
            is_pinching,
        },
        click,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, NUM_LANDMARKS, INDEX_TIP, THUMB_TIP};

    fn pose(index: (f32, f32), thumb: (f32, f32)) -> HandPose {
        let mut landmarks = [Landmark {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }; NUM_LANDMARKS];
        landmarks[INDEX_TIP] = Landmark {
            x: index.0,
            y: index.1,
            z: 0.0,
        };
        landmarks[THUMB_TIP] = Landmark {
            x: thumb.0,
            y: thumb.1,
            z: 0.0,
        };
        HandPose { landmarks }
    }

    const DISPLAY: (f32, f32) = (1920.0, 1080.0);

    #[test]
    fn maps_index_tip_to_screen_pixels() {
        let (cursor, _) = interpret(&pose((0.5, 0.4), (0.49, 0.43)), CursorState::default(), DISPLAY);
        assert_eq!(cursor.x, 960.0);
        assert_eq!(cursor.y, 432.0);
        assert!(cursor.is_pinching);
    }

    #[test]
    fn pinch_threshold_is_strict() {
        // Distance exactly 0.05 is not a pinch.
        let (cursor, click) = interpret(&pose((0.5, 0.5), (0.55, 0.5)), CursorState::default(), DISPLAY);
        assert!(!cursor.is_pinching);
        assert!(click.is_none());

        let (cursor, _) = interpret(&pose((0.5, 0.5), (0.549, 0.5)), CursorState::default(), DISPLAY);
        assert!(cursor.is_pinching);
    }

    #[test]
    fn click_fires_only_on_rising_edge() {
        let apart = pose((0.5, 0.5), (0.8, 0.8));
        let together = pose((0.5, 0.5), (0.51, 0.5));

        let mut cursor = CursorState::default();
        let mut clicks = 0;
        for p in [&apart, &together, &together, &together, &apart] {
            let (next, click) = interpret(p, cursor, DISPLAY);
            cursor = next;
            if click.is_some() {
                clicks += 1;
            }
        }
        assert_eq!(clicks, 1, "sustained pinch must click exactly once");
    }

    #[test]
    fn oscillating_pinch_clicks_each_rising_edge() {
        let apart = pose((0.5, 0.5), (0.8, 0.8));
        let together = pose((0.5, 0.5), (0.51, 0.5));

        let mut cursor = CursorState::default();
        let mut clicks = Vec::new();
        for p in [&together, &apart, &together] {
            let (next, click) = interpret(p, cursor, DISPLAY);
            cursor = next;
            if let Some(c) = click {
                clicks.push(c);
            }
        }
        assert_eq!(clicks.len(), 2);
    }

    #[test]
    fn click_lands_at_cursor_position() {
        let previous = CursorState {
            x: 12.0,
            y: 34.0,
            is_pinching: false,
        };
        let (_, click) = interpret(&pose((0.25, 0.75), (0.26, 0.75)), previous, DISPLAY);
        let click = click.expect("rising edge must click");
        assert_eq!(click.x, 480.0);
        assert_eq!(click.y, 810.0);
    }
}
