use crate::types::HandPose;

/// Anatomical skeleton edges over the 21-point hand vocabulary: four joints
/// per finger chained from the wrist, plus the knuckle bridge.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const LINE_COLOR: [u8; 4] = [56, 189, 248, 255];
const JOINT_COLOR: [u8; 4] = [248, 113, 113, 255];
const LINE_THICKNESS: i32 = 3;
const JOINT_RADIUS: i32 = 4;

/// Draws the hand skeleton into the frame buffer in place. Landmarks are
/// normalized, so they scale to whatever resolution the frame carries.
/// Pure function of its inputs; nothing persists between calls.
pub fn draw_skeleton(buffer: &mut [u8], width: u32, height: u32, pose: &HandPose) {
    let to_px = |idx: usize| {
        let lm = pose.landmarks[idx];
        (lm.x * width as f32, lm.y * height as f32)
    };

    for &(a, b) in CONNECTIONS {
        draw_line(buffer, width, height, to_px(a), to_px(b), LINE_COLOR, LINE_THICKNESS);
    }

    for idx in 0..pose.landmarks.len() {
        let (x, y) = to_px(idx);
        draw_disc(buffer, width, height, (x as i32, y as i32), JOINT_RADIUS, JOINT_COLOR);
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: (f32, f32),
    p1: (f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        if radius > 0 {
            draw_disc(buffer, width, height, (x0, y0), radius, color);
        } else {
            put_pixel(buffer, width, height, x0, y0, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_disc(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: [u8; 4],
) {
    let (cx, cy) = center;
    for oy in -radius..=radius {
        for ox in -radius..=radius {
            if ox * ox + oy * oy <= radius * radius {
                put_pixel(buffer, width, height, cx + ox, cy + oy, color);
            }
        }
    }
}

fn put_pixel(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, NUM_LANDMARKS};

    fn uniform_pose(x: f32, y: f32) -> HandPose {
        HandPose {
            landmarks: [Landmark { x, y, z: 0.0 }; NUM_LANDMARKS],
        }
    }

    #[test]
    fn draws_within_bounds_for_edge_landmarks() {
        let (w, h) = (32u32, 24u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        // Landmarks at the far corner must clip, not panic or scribble.
        draw_skeleton(&mut buffer, w, h, &uniform_pose(1.0, 1.0));
        draw_skeleton(&mut buffer, w, h, &uniform_pose(0.0, 0.0));
        assert_eq!(buffer.len(), (w * h * 4) as usize);
    }

    #[test]
    fn marks_pixels_at_landmark_positions() {
        let (w, h) = (64u32, 64u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        draw_skeleton(&mut buffer, w, h, &uniform_pose(0.5, 0.5));

        let idx = ((32 * w + 32) as usize) * 4;
        assert_ne!(&buffer[idx..idx + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn topology_stays_inside_vocabulary() {
        for &(a, b) in CONNECTIONS {
            assert!(a < NUM_LANDMARKS && b < NUM_LANDMARKS);
        }
    }
}
