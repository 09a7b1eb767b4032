use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::{Result, anyhow};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    },
};

use super::rgba_converter;
use crate::control_loop::FrameFeed;
use crate::types::Frame;

/// The source counts as ready once this many frames have decoded; the first
/// frame out of a cold camera is often garbage or zero-sized.
const MIN_DECODED_FRAMES: u64 = 2;

// Prefer pixel formats that are widely supported on macOS (the built-in
// cameras often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        // Fall back to any format Nokhwa can decode, but prefer higher FPS to
        // avoid very low default rates that some drivers reject.
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info: CameraInfo| CameraDevice {
            index: info.index().clone(),
            label: info.human_name(),
        })
        .collect())
}

#[derive(Debug, Default)]
struct SharedSlot {
    latest: Option<Frame>,
    decoded: u64,
}

/// Owns the camera and a capture thread that keeps a latest-frame slot fresh.
/// `start` fails loudly when the device cannot be opened (permission denied,
/// busy), so the caller can surface a status message instead of crashing.
#[derive(Debug)]
pub struct FrameSource {
    stop: Arc<AtomicBool>,
    slot: Arc<Mutex<SharedSlot>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameSource {
    pub fn start(index: CameraIndex) -> Result<Self> {
        // Fail fast before spawning the capture thread.
        build_camera(index.clone())?;

        let stop = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(Mutex::new(SharedSlot::default()));
        let stop_flag = stop.clone();
        let slot_writer = slot.clone();

        let handle = thread::spawn(move || {
            let mut camera = match build_camera(index) {
                Ok(cam) => cam,
                Err(err) => {
                    log::error!("failed to open camera: {err:?}");
                    return;
                }
            };

            while !stop_flag.load(Ordering::Relaxed) {
                let frame_start = Instant::now();
                let raw = match camera.frame() {
                    Ok(raw) => raw,
                    Err(err) => {
                        log::warn!(
                            "camera frame read failed (after {:?}): {err:?}",
                            frame_start.elapsed()
                        );
                        continue;
                    }
                };

                let converted = match rgba_converter::decode_to_rgba(&raw) {
                    Ok(rgba) => rgba,
                    Err(err) => {
                        log::warn!("failed to decode camera frame {err:?}");
                        continue;
                    }
                };

                let frame = Frame {
                    rgba: converted.rgba,
                    width: converted.width,
                    height: converted.height,
                    timestamp: Instant::now(),
                };

                let mut slot = slot_writer
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                slot.latest = Some(frame);
                slot.decoded += 1;
            }
        });

        Ok(Self {
            stop,
            slot,
            handle: Some(handle),
        })
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl FrameFeed for FrameSource {
    fn current_frame(&mut self) -> Option<Frame> {
        let slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.decoded < MIN_DECODED_FRAMES {
            return None;
        }
        slot.latest
            .as_ref()
            .filter(|frame| frame.width > 0 && frame.height > 0)
            .cloned()
    }

    fn stop(&mut self) {
        self.shutdown();
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_camera(index: CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}
