use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

#[derive(Debug)]
pub struct RgbaFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes whatever pixel format the camera negotiated into plain RGBA.
pub fn decode_to_rgba(frame: &Buffer) -> Result<RgbaFrame> {
    let resolution = frame.resolution();
    let width = resolution.width_x;
    let height = resolution.height_y;
    let data = frame.buffer();

    let rgba = match frame.source_frame_format() {
        FrameFormat::NV12 => nv12_to_rgba(data, width, height)?,
        FrameFormat::YUYV => yuyv_to_rgba(data, width, height)?,
        FrameFormat::MJPEG => return mjpeg_to_rgba(data),
        FrameFormat::RAWRGB => expand_channels(data, width, height, 3, [0, 1, 2])?,
        FrameFormat::RAWBGR => expand_channels(data, width, height, 3, [2, 1, 0])?,
        FrameFormat::GRAY => expand_channels(data, width, height, 1, [0, 0, 0])?,
    };

    Ok(RgbaFrame {
        rgba,
        width,
        height,
    })
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_plane_len = width as usize * height as usize;
    let uv_plane_len = y_plane_len / 2;

    if data.len() < y_plane_len + uv_plane_len {
        return Err(anyhow!(
            "NV12 buffer too small: got {}, expected {}",
            data.len(),
            y_plane_len + uv_plane_len
        ));
    }

    let mut rgba = vec![0u8; y_plane_len * 4];
    let image = YuvBiPlanarImage {
        y_plane: &data[..y_plane_len],
        y_stride: width,
        uv_plane: &data[y_plane_len..y_plane_len + uv_plane_len],
        uv_stride: width,
        width,
        height,
    };

    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 2;
    if data.len() < expected {
        return Err(anyhow!(
            "YUYV buffer too small: got {}, expected {}",
            data.len(),
            expected
        ));
    }

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    let packed = YuvPackedImage {
        yuy: &data[..expected],
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8]) -> Result<RgbaFrame> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;
    let info = decoder
        .info()
        .ok_or_else(|| anyhow!("MJPEG stream missing dimensions"))?;

    let expected_len = info.width as usize * info.height as usize * 4;
    if rgba.len() < expected_len {
        return Err(anyhow!(
            "MJPEG decode produced too few bytes: got {}, expected {}",
            rgba.len(),
            expected_len
        ));
    }

    Ok(RgbaFrame {
        rgba,
        width: info.width as u32,
        height: info.height as u32,
    })
}

/// Widens an interleaved `channels`-per-pixel buffer to RGBA, picking source
/// channels via `map` (identity for RGB, swapped for BGR, broadcast for gray).
fn expand_channels(
    data: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    map: [usize; 3],
) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    let expected = pixels * channels;
    if data.len() < expected {
        return Err(anyhow!(
            "raw buffer too small: got {}, expected {}",
            data.len(),
            expected
        ));
    }

    let rgba: Vec<u8> = data[..expected]
        .par_chunks_exact(channels)
        .flat_map_iter(|px| [px[map[0]], px[map[1]], px[map[2]], 255u8])
        .collect();

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_rgb_to_rgba() {
        let data = [10u8, 20, 30, 40, 50, 60];
        let rgba = expand_channels(&data, 2, 1, 3, [0, 1, 2]).expect("expand");
        assert_eq!(rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn expands_bgr_with_swapped_channels() {
        let data = [10u8, 20, 30];
        let rgba = expand_channels(&data, 1, 1, 3, [2, 1, 0]).expect("expand");
        assert_eq!(rgba, vec![30, 20, 10, 255]);
    }

    #[test]
    fn expands_gray_by_broadcast() {
        let data = [77u8, 200];
        let rgba = expand_channels(&data, 2, 1, 1, [0, 0, 0]).expect("expand");
        assert_eq!(rgba, vec![77, 77, 77, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn rejects_short_buffers() {
        assert!(expand_channels(&[0u8; 5], 2, 1, 3, [0, 1, 2]).is_err());
        assert!(nv12_to_rgba(&[0u8; 4], 4, 4).is_err());
        assert!(yuyv_to_rgba(&[0u8; 4], 4, 4).is_err());
    }
}
