use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::detector::HandLandmarker;
use crate::dispatch::{FrameDispatcher, OutboundEvent};
use crate::overlay;
use crate::pointer;
use crate::types::{CursorState, Frame, HandPose};

const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Supplies frames to the loop. Backed by the camera in production; tests
/// script their own feeds.
pub trait FrameFeed {
    /// The most recent decoded frame, or `None` while the source is warming
    /// up (fewer than two decoded frames, or zero-sized output).
    fn current_frame(&mut self) -> Option<Frame>;

    /// Releases the underlying capture resource synchronously.
    fn stop(&mut self);
}

/// Receives synthetic clicks produced by a rising pinch edge. The UI layer
/// routes them to whatever it has hit-testable at those coordinates.
pub trait ClickSink {
    fn click(&mut self, x: f32, y: f32);
}

/// Per-session counters. Rebuilt on every Stopped→Running transition.
#[derive(Debug)]
struct LoopControl {
    last_processed: Option<Instant>,
    frame_counter: u64,
    fps_window_start: Instant,
    fps: u32,
}

impl LoopControl {
    fn new(now: Instant) -> Self {
        Self {
            last_processed: None,
            frame_counter: 0,
            fps_window_start: now,
            fps: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// The loop observed the disabled flag; the caller must not reschedule.
    Disabled,
    /// No usable frame yet; reschedule without advancing any counters.
    NotReady,
    Completed,
}

pub struct TickOutcome {
    pub status: TickStatus,
    /// The frame with the skeleton baked in, ready for display.
    pub display_frame: Option<Frame>,
    /// Whether detection ran this tick and found a hand.
    pub detected: bool,
}

impl TickOutcome {
    fn bare(status: TickStatus) -> Self {
        Self {
            status,
            display_frame: None,
            detected: false,
        }
    }
}

/// The per-frame video-to-cursor pipeline, driven one tick at a time by the
/// UI's refresh cycle. Everything runs on the interface thread; a tick always
/// completes before the next one is requested, so none of this state needs
/// locking. Cancellation is cooperative and one-tick-latent: `stop()` flips
/// the flag and releases the camera, and the next scheduled tick exits at the
/// top without doing work.
pub struct ControlLoop {
    enabled: bool,
    control: LoopControl,
    frames: Option<Box<dyn FrameFeed>>,
    detector: Option<Box<dyn HandLandmarker>>,
    clicks: Box<dyn ClickSink>,
    dispatcher: FrameDispatcher,
    session_active: bool,
    cursor: CursorState,
    last_pose: Option<HandPose>,
    /// Fixed for the process lifetime so detector timestamps stay monotonic
    /// across video off/on cycles.
    epoch: Instant,
}

impl ControlLoop {
    pub fn new(clicks: Box<dyn ClickSink>, events_tx: Sender<OutboundEvent>, now: Instant) -> Self {
        Self {
            enabled: false,
            control: LoopControl::new(now),
            frames: None,
            detector: None,
            clicks,
            dispatcher: FrameDispatcher::new(events_tx),
            session_active: false,
            cursor: CursorState::default(),
            last_pose: None,
            epoch: now,
        }
    }

    /// Stopped→Running: takes ownership of an already-acquired frame feed and
    /// resets the per-session counters.
    pub fn start(&mut self, frames: Box<dyn FrameFeed>, now: Instant) {
        self.control = LoopControl::new(now);
        self.last_pose = None;
        self.frames = Some(frames);
        self.enabled = true;
        log::info!("pointer loop started");
    }

    /// Running→Stopped: the camera is released right here, synchronously; the
    /// loop itself winds down on its next scheduled tick.
    pub fn stop(&mut self) {
        self.enabled = false;
        if let Some(mut frames) = self.frames.take() {
            frames.stop();
        }
        log::info!("pointer loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.enabled
    }

    pub fn install_detector(&mut self, detector: Box<dyn HandLandmarker>) {
        self.detector = Some(detector);
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn set_session_active(&mut self, active: bool) {
        self.session_active = active;
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn fps(&self) -> u32 {
        self.control.fps
    }

    /// One iteration of the control loop. Order per tick: frame pull,
    /// throttled dispatch of the unadorned frame, detection + interpretation
    /// (only for a frame not seen before), skeleton overlay, FPS accounting.
    pub fn tick(&mut self, now: Instant, display: (f32, f32)) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::bare(TickStatus::Disabled);
        }
        let Some(frames) = self.frames.as_mut() else {
            return TickOutcome::bare(TickStatus::Disabled);
        };
        let Some(mut frame) = frames.current_frame() else {
            return TickOutcome::bare(TickStatus::NotReady);
        };

        // The remote collaborator gets the raw frame, before the skeleton is
        // baked in for local display.
        self.dispatcher
            .maybe_forward(&frame, self.control.frame_counter, self.session_active);

        // The refresh rate can outrun the camera; re-detecting an unchanged
        // frame wastes CPU and could re-fire a click off stale pinch state.
        let is_new_frame = self.control.last_processed != Some(frame.timestamp);
        let mut detected = false;
        if is_new_frame {
            if let Some(detector) = self.detector.as_mut() {
                let timestamp_ms = frame
                    .timestamp
                    .saturating_duration_since(self.epoch)
                    .as_millis() as u64;
                let pose = match detector.detect(&frame, timestamp_ms) {
                    Ok(pose) => pose,
                    Err(err) => {
                        // A bad tick is "no hand", never a dead loop.
                        log::warn!("hand detection failed: {err:?}");
                        None
                    }
                };
                self.control.last_processed = Some(frame.timestamp);

                if let Some(pose) = &pose {
                    let (cursor, click) = pointer::interpret(pose, self.cursor, display);
                    self.cursor = cursor;
                    if let Some(click) = click {
                        log::debug!("synthetic click at ({:.0}, {:.0})", click.x, click.y);
                        self.clicks.click(click.x, click.y);
                    }
                    detected = true;
                }
                self.last_pose = pose;
            }
        }

        // On a dedupe-skipped tick the frame is bit-identical to the one that
        // produced `last_pose`, so reusing it keeps the skeleton from
        // flickering. A new frame with no detection clears it above.
        if let Some(pose) = &self.last_pose {
            overlay::draw_skeleton(&mut frame.rgba, frame.width, frame.height, pose);
        }

        self.control.frame_counter += 1;
        if now.duration_since(self.control.fps_window_start) >= FPS_WINDOW {
            self.control.fps = self.control.frame_counter as u32;
            self.control.frame_counter = 0;
            self.control.fps_window_start = now;
        }

        TickOutcome {
            status: TickStatus::Completed,
            display_frame: Some(frame),
            detected,
        }
    }
}
