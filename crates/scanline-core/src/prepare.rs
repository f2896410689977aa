//! Image preparation before inference.
//!
//! Engines are fed 3-channel RGB images no larger than a configured side
//! length. Larger scans are downscaled with a triangle filter.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::{Error, Result, TRACING_TARGET_DOCUMENT};

/// Default upper bound for the longest image side, in pixels.
pub const DEFAULT_MAX_SIDE: u32 = 1280;

/// Side length of the blank image used to warm up an engine.
const WARMUP_SIDE: u32 = 64;

/// An RGB image re-encoded as PNG, ready for submission to an engine.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// PNG-encoded pixels.
    pub bytes: Bytes,
    /// Width after preparation.
    pub width: u32,
    /// Height after preparation.
    pub height: u32,
    /// Width of the uploaded image.
    pub original_width: u32,
    /// Height of the uploaded image.
    pub original_height: u32,
}

impl PreparedImage {
    /// Returns true if the image was shrunk during preparation.
    pub fn was_downscaled(&self) -> bool {
        self.width != self.original_width || self.height != self.original_height
    }
}

/// Computes target dimensions so that the longest side is at most `max_side`.
fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_side == 0 || longest <= max_side {
        return (width, height);
    }

    let scale = f64::from(max_side) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale) as u32).max(1);
    (scaled(width), scaled(height))
}

/// Converts to RGB, downscales to `max_side`, and re-encodes as PNG.
///
/// This is CPU bound; async callers should run it on a blocking thread.
pub fn prepare_image(image: DynamicImage, max_side: u32) -> Result<PreparedImage> {
    let (original_width, original_height) = (image.width(), image.height());
    let mut rgb = image.into_rgb8();

    let (width, height) = fit_within(original_width, original_height, max_side);
    if (width, height) != (original_width, original_height) {
        tracing::debug!(
            target: TRACING_TARGET_DOCUMENT,
            from = %format!("{original_width}x{original_height}"),
            to = %format!("{width}x{height}"),
            "Downscaling image before inference"
        );
        rgb = image::imageops::resize(&rgb, width, height, FilterType::Triangle);
    }

    Ok(PreparedImage {
        bytes: encode_png(&rgb)?,
        width,
        height,
        original_width,
        original_height,
    })
}

/// Returns a small blank PNG used to warm up a freshly created engine.
pub fn warmup_image() -> Result<PreparedImage> {
    let blank = RgbImage::from_pixel(WARMUP_SIDE, WARMUP_SIDE, Rgb([255, 255, 255]));
    Ok(PreparedImage {
        bytes: encode_png(&blank)?,
        width: WARMUP_SIDE,
        height: WARMUP_SIDE,
        original_width: WARMUP_SIDE,
        original_height: WARMUP_SIDE,
    })
}

fn encode_png(image: &RgbImage) -> Result<Bytes> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).map_err(|err| {
        Error::internal_error()
            .with_message(format!("Failed to encode image: {err}"))
            .with_source(err)
    })?;
    Ok(Bytes::from(buffer.into_inner()))
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, LumaA};

    use super::*;

    #[test]
    fn small_images_keep_their_size() {
        assert_eq!(fit_within(640, 480, 1280), (640, 480));
        assert_eq!(fit_within(1280, 1280, 1280), (1280, 1280));
    }

    #[test]
    fn longest_side_is_clamped() {
        assert_eq!(fit_within(2560, 1280, 1280), (1280, 640));
        assert_eq!(fit_within(1000, 4000, 1280), (320, 1280));
        assert_eq!(fit_within(10_000, 3, 1280), (1280, 1));
    }

    #[test]
    fn zero_max_side_disables_downscaling() {
        assert_eq!(fit_within(5000, 5000, 0), (5000, 5000));
    }

    #[test]
    fn prepare_converts_and_downscales() {
        let gray = image::GrayAlphaImage::from_pixel(3000, 1500, LumaA([10, 255]));
        let prepared = prepare_image(DynamicImage::ImageLumaA8(gray), 1280).unwrap();

        assert!(prepared.was_downscaled());
        assert_eq!((prepared.width, prepared.height), (1280, 640));
        assert_eq!((prepared.original_width, prepared.original_height), (3000, 1500));

        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (1280, 640));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn warmup_image_is_blank_square() {
        let warmup = warmup_image().unwrap();
        assert!(!warmup.was_downscaled());
        let decoded = image::load_from_memory(&warmup.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert!(decoded.pixels().all(|pixel| pixel.0 == [255, 255, 255]));
    }
}
