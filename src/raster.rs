//! Thin adapter over the `image` and `imageproc` crates: decoding, pre-quantization
//! filters, PNG encoding and checked construction of pixel buffers.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::config::ImageFilters;
use crate::layer::OriginalMetadata;
use crate::{LayertraceError, LayertraceResult};

/// Decode image bytes into RGBA pixels plus the source metadata.
pub fn decode(bytes: &[u8]) -> LayertraceResult<(RgbaImage, OriginalMetadata)> {
    let format = image::guess_format(bytes)
        .ok()
        .map(|f| f.to_mime_type().to_string());
    let decoded = image::load_from_memory(bytes).map_err(LayertraceError::Decode)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    tracing::debug!(width, height, format = ?format, "Decoded input image");

    Ok((
        rgba,
        OriginalMetadata {
            width,
            height,
            format,
        },
    ))
}

/// Apply the configured brightness, blur and contrast filters, in that order.
pub fn apply_filters(image: &RgbaImage, filters: &ImageFilters) -> RgbaImage {
    let mut current = image.clone();
    if let Some(factor) = filters.brightness {
        current = scale_brightness(&current, factor);
    }
    if let Some(sigma) = filters.blur.filter(|s| *s > 0.0) {
        current = gaussian_blur_f32(&current, sigma);
    }
    if let Some(contrast) = filters.contrast {
        current = image::imageops::contrast(&current, contrast);
    }
    current
}

/// Multiply the color channels by `factor`, leaving alpha alone.
pub fn scale_brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    let factor = factor.max(0.0);
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        let scale = |c: u8| (f32::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        *px = Rgba([scale(r), scale(g), scale(b), a]);
    }
    out
}

/// Encode any image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> LayertraceResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Wrap a single-channel buffer, refusing buffers of the wrong length.
pub fn gray_from_raw(width: u32, height: u32, raw: Vec<u8>) -> LayertraceResult<GrayImage> {
    let found = raw.len();
    check_len(width, height, 1, found)?;
    GrayImage::from_raw(width, height, raw).ok_or(LayertraceError::DimensionMismatch {
        width,
        height,
        channels: 1,
        found,
    })
}

/// Wrap an interleaved RGBA buffer, refusing buffers of the wrong length.
pub fn rgba_from_raw(width: u32, height: u32, raw: Vec<u8>) -> LayertraceResult<RgbaImage> {
    let found = raw.len();
    check_len(width, height, 4, found)?;
    RgbaImage::from_raw(width, height, raw).ok_or(LayertraceError::DimensionMismatch {
        width,
        height,
        channels: 4,
        found,
    })
}

/// `DimensionMismatch` unless `found == width * height * channels`.
fn check_len(width: u32, height: u32, channels: u8, found: usize) -> LayertraceResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(usize::from(channels)));
    if expected == Some(found) {
        Ok(())
    } else {
        Err(LayertraceError::DimensionMismatch {
            width,
            height,
            channels,
            found,
        })
    }
}
