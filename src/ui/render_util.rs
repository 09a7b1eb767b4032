use std::sync::Arc;

use gpui::RenderImage;
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::types::Frame;

/// Wraps a display-ready frame (overlay already baked in) for GPUI.
pub(super) fn frame_to_image(frame: Frame) -> Option<Arc<RenderImage>> {
    let Frame {
        mut rgba,
        width,
        height,
        ..
    } = frame;

    // GPUI expects BGRA; convert in place to avoid the async asset pipeline
    // and flicker.
    for px in rgba.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, rgba)?;
    Some(Arc::new(RenderImage::new(vec![ImageFrame::new(buffer)])))
}
