use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use crossbeam_channel::Sender;
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};

use crate::types::Frame;

/// Forward every Nth frame. Full-rate forwarding would saturate the channel
/// and the remote consumer does not need pointer-rate stills.
pub const FORWARD_EVERY: u64 = 5;

/// JPEG quality factor, matching the channel's expected ~0.5 encoder setting.
pub const JPEG_QUALITY: u8 = 50;

/// Outbound traffic on the realtime voice-session channel. Fire-and-forget;
/// no reply is ever awaited.
#[derive(Clone, Debug)]
pub enum OutboundEvent {
    VideoFrame { image: String },
}

pub fn should_forward(frame_counter: u64, session_active: bool) -> bool {
    session_active && frame_counter % FORWARD_EVERY == 0
}

pub struct FrameDispatcher {
    events_tx: Sender<OutboundEvent>,
}

impl FrameDispatcher {
    pub fn new(events_tx: Sender<OutboundEvent>) -> Self {
        Self { events_tx }
    }

    /// Emits a compressed snapshot of the frame when the duty cycle and the
    /// session flag both allow it. Send failures (full or disconnected
    /// channel) are dropped; the loop never blocks on the network side.
    pub fn maybe_forward(&self, frame: &Frame, frame_counter: u64, session_active: bool) {
        if !should_forward(frame_counter, session_active) {
            return;
        }

        match encode_data_uri(frame) {
            Ok(image) => {
                let _ = self.events_tx.try_send(OutboundEvent::VideoFrame { image });
            }
            Err(err) => {
                log::warn!("failed to encode outbound frame: {err:?}");
            }
        }
    }
}

fn encode_data_uri(frame: &Frame) -> Result<String> {
    let mut rgb = Vec::with_capacity((frame.width * frame.height * 3) as usize);
    for px in frame.rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .context("JPEG encoding failed")?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(jpeg.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Instant;

    fn frame(width: u32, height: u32) -> Frame {
        Frame {
            rgba: vec![128u8; (width * height * 4) as usize],
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn forwards_on_divisor_counters_only() {
        for counter in 0..20u64 {
            assert_eq!(should_forward(counter, true), counter % 5 == 0);
        }
    }

    #[test]
    fn inactive_session_never_forwards() {
        for counter in 0..20u64 {
            assert!(!should_forward(counter, false));
        }
    }

    #[test]
    fn dispatcher_respects_duty_cycle() {
        let (tx, rx) = bounded(16);
        let dispatcher = FrameDispatcher::new(tx);
        let frame = frame(4, 4);

        for counter in 0..12u64 {
            dispatcher.maybe_forward(&frame, counter, true);
        }

        // Counters 0, 5 and 10 pass the gate.
        assert_eq!(rx.try_iter().count(), 3);
    }

    #[test]
    fn deactivating_session_stops_forwarding_immediately() {
        let (tx, rx) = bounded(16);
        let dispatcher = FrameDispatcher::new(tx);
        let frame = frame(4, 4);

        dispatcher.maybe_forward(&frame, 0, true);
        dispatcher.maybe_forward(&frame, 5, false);
        dispatcher.maybe_forward(&frame, 10, false);

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn encodes_jpeg_data_uri() {
        let uri = encode_data_uri(&frame(8, 6)).expect("encode");
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.len() > "data:image/jpeg;base64,".len());
    }
}
