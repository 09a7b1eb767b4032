use std::path::Path;

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use rayon::prelude::*;

use super::HandLandmarker;
use crate::types::{Frame, HandPose, Landmark, NUM_LANDMARKS};

const INPUT_SIZE: u32 = 224;
const MIN_CONFIDENCE: f32 = 0.2;

/// ONNX Runtime adapter over the MediaPipe handpose-estimation model. The
/// model sees a letterboxed 224x224 crop of the whole frame and reports 21
/// landmarks in crop pixels, which we project back and normalize.
pub struct OrtLandmarker {
    session: Session,
}

impl OrtLandmarker {
    pub fn new(model_path: &Path) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ORT session from {}", model_path.display()))?;

        Ok(Self { session })
    }
}

impl HandLandmarker for OrtLandmarker {
    fn detect(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<Option<HandPose>> {
        let (input, letterbox) = prepare_input(frame)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        if confidence < MIN_CONFIDENCE {
            log::trace!("no hand at {timestamp_ms}ms (confidence {confidence:.2})");
            return Ok(None);
        }

        let pose = decode_pose(&flattened, &letterbox)?;
        Ok(Some(pose))
    }
}

#[derive(Clone, Debug)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    frame_w: u32,
    frame_h: u32,
}

/// Letterboxes the frame into a normalized NHWC tensor of INPUT_SIZE square.
fn prepare_input(frame: &Frame) -> Result<(Array4<f32>, Letterbox)> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!("zero-sized frame"));
    }

    let scale = INPUT_SIZE as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let pad_x = ((INPUT_SIZE as i64 - new_w as i64) / 2).max(0) as usize;
    let pad_y = ((INPUT_SIZE as i64 - new_h as i64) / 2).max(0) as usize;
    let mut canvas = vec![0u8; (INPUT_SIZE as usize) * (INPUT_SIZE as usize) * 4];
    for px in canvas.chunks_mut(4) {
        px[3] = 255;
    }
    let dst_stride = INPUT_SIZE as usize * 4;
    let src_stride = new_w as usize * 4;
    for row in 0..(new_h as usize) {
        let dst_offset = (pad_y + row) * dst_stride + pad_x * 4;
        canvas[dst_offset..dst_offset + src_stride]
            .copy_from_slice(&resized[row * src_stride..(row + 1) * src_stride]);
    }

    let normalized: Vec<f32> = canvas
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ]
        })
        .collect();
    let input = Array4::<f32>::from_shape_vec(
        (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
        normalized,
    )
    .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    Ok((
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            frame_w: frame.width,
            frame_h: frame.height,
        },
    ))
}

/// Unprojects model-space landmarks through the letterbox and normalizes them
/// to [0, 1] relative to the frame.
fn decode_pose(flat: &[f32], letterbox: &Letterbox) -> Result<HandPose> {
    if flat.len() < NUM_LANDMARKS * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * 3
        ));
    }

    let mut landmarks = [Landmark {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    }; NUM_LANDMARKS];
    for (idx, chunk) in flat.chunks_exact(3).take(NUM_LANDMARKS).enumerate() {
        let px = (chunk[0] - letterbox.pad_x) / letterbox.scale;
        let py = (chunk[1] - letterbox.pad_y) / letterbox.scale;
        landmarks[idx] = Landmark {
            x: (px / letterbox.frame_w as f32).clamp(0.0, 1.0),
            y: (py / letterbox.frame_h as f32).clamp(0.0, 1.0),
            z: chunk[2],
        };
    }

    Ok(HandPose { landmarks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn decode_rejects_short_output() {
        let letterbox = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            frame_w: 224,
            frame_h: 224,
        };
        assert!(decode_pose(&[0.0; 10], &letterbox).is_err());
    }

    #[test]
    fn decode_normalizes_through_letterbox() {
        // A 448x224 frame letterboxed into 224: scale 0.5, vertical pad 56.
        let letterbox = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 56.0,
            frame_w: 448,
            frame_h: 224,
        };
        let mut flat = vec![0.0f32; NUM_LANDMARKS * 3];
        // Model-space (112, 112) is the frame center.
        flat[0] = 112.0;
        flat[1] = 112.0;

        let pose = decode_pose(&flat, &letterbox).expect("decode");
        assert!((pose.landmarks[0].x - 0.5).abs() < 1e-5);
        assert!((pose.landmarks[0].y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn decode_clamps_out_of_frame_landmarks() {
        let letterbox = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            frame_w: 224,
            frame_h: 224,
        };
        let mut flat = vec![0.0f32; NUM_LANDMARKS * 3];
        flat[0] = -50.0;
        flat[1] = 500.0;

        let pose = decode_pose(&flat, &letterbox).expect("decode");
        assert_eq!(pose.landmarks[0].x, 0.0);
        assert_eq!(pose.landmarks[0].y, 1.0);
    }

    #[test]
    fn prepare_input_validates_buffer_size() {
        let frame = Frame {
            rgba: vec![0u8; 8],
            width: 16,
            height: 16,
            timestamp: Instant::now(),
        };
        assert!(prepare_input(&frame).is_err());
    }

    #[test]
    fn prepare_input_letterboxes_wide_frames() {
        let frame = Frame {
            rgba: vec![255u8; 64 * 32 * 4],
            width: 64,
            height: 32,
            timestamp: Instant::now(),
        };
        let (input, letterbox) = prepare_input(&frame).expect("prepare");
        assert_eq!(input.shape(), &[1, 224, 224, 3]);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 56.0);
        assert!((letterbox.scale - 3.5).abs() < 1e-5);
    }
}
