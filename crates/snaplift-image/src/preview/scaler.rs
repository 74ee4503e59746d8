// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview scaler: reads a captured photo's header for its dimensions, picks
// an integer downsample factor against the preview surface, and decodes a
// subsampled bitmap for display. Nothing is written back to disk.
//
// JPEG input is decoded with IDCT scaling (1/2, 1/4, 1/8), so the decoder
// never materialises the full-resolution bitmap. Other formats go through a
// full decode followed by a resize.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, ImageReader, Luma, RgbImage};
use jpeg_decoder::PixelFormat;
use snaplift_core::error::{Result, SnapliftError};
use snaplift_core::types::PreviewSize;
use tracing::{debug, info, instrument};

/// Integer downsample factor for fitting a `bitmap_width` x `bitmap_height`
/// image into `preview`: `min(bw / pw, bh / ph)` with integer division.
///
/// Zero when the image is smaller than the surface in either dimension. A
/// surface that has not been laid out yet (zero width or height) is rejected
/// instead of dividing by zero.
pub fn downsample_factor(bitmap_width: u32, bitmap_height: u32, preview: PreviewSize) -> Result<u32> {
    if !preview.is_laid_out() {
        return Err(SnapliftError::InvalidPreviewSurface {
            width: preview.width,
            height: preview.height,
        });
    }
    Ok((bitmap_width / preview.width).min(bitmap_height / preview.height))
}

/// Sample size the decoder actually applies for a requested factor: the
/// largest power of two not above it. Factors of 0 and 1 mean no subsampling.
pub fn sample_size(factor: u32) -> u32 {
    if factor <= 1 {
        1
    } else {
        1 << (u32::BITS - 1 - factor.leading_zeros())
    }
}

/// A decoded, subsampled preview ready for display.
#[derive(Debug, Clone)]
pub struct ScaledPreview {
    image: DynamicImage,
    /// Power-of-two subsampling that was applied (1 = none).
    pub sample_size: u32,
    /// Dimensions of the file on disk.
    pub source_width: u32,
    pub source_height: u32,
    /// Bitmap size the decoder produced, before any remaining reduction.
    pub decoded_width: u32,
    pub decoded_height: u32,
}

impl ScaledPreview {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the preview and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Encode the preview as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| SnapliftError::ImageError(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// PNG `data:` URI for embedding in the UI.
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(data_uri(&self.to_png_bytes()?))
    }
}

/// Build a `data:` URI for already-encoded image bytes, sniffing the MIME
/// type from the content. Unknown formats fall back to
/// `application/octet-stream`.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Scales captured photos down to a fixed preview surface.
#[derive(Debug, Clone, Copy)]
pub struct PreviewScaler {
    preview: PreviewSize,
}

impl PreviewScaler {
    pub fn new(preview: PreviewSize) -> Self {
        Self { preview }
    }

    pub fn preview(&self) -> PreviewSize {
        self.preview
    }

    /// Read only the image header for its pixel dimensions.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
        let (_, dimensions) = read_header(path)?;
        Ok(dimensions)
    }

    /// Decode `path` subsampled to roughly the preview surface size.
    ///
    /// The output never exceeds the source dimensions and keeps its aspect
    /// ratio up to one pixel of rounding.
    #[instrument(skip(self, path), fields(path = %path.display(), preview_w = self.preview.width, preview_h = self.preview.height))]
    pub fn scale(&self, path: &Path) -> Result<ScaledPreview> {
        let (format, (source_width, source_height)) = read_header(path)?;
        let factor = downsample_factor(source_width, source_height, self.preview)?;
        let sample = sample_size(factor);
        let width = source_width.div_ceil(sample).max(1);
        let height = source_height.div_ceil(sample).max(1);

        let scaled = match format {
            Some(ImageFormat::Jpeg) => decode_jpeg_scaled(path, width, height)?,
            _ => None,
        };
        let decoded = match scaled {
            Some(image) => image,
            None => decode_full(path)?,
        };
        let (decoded_width, decoded_height) = (decoded.width(), decoded.height());

        // IDCT scaling stops at 1/8; larger samples finish on the reduced bitmap.
        let image = if (decoded_width, decoded_height) != (width, height) {
            decoded.resize_exact(width, height, image::imageops::FilterType::Triangle)
        } else {
            decoded
        };

        info!(
            source_width,
            source_height,
            factor,
            sample,
            decoded_width,
            decoded_height,
            width = image.width(),
            height = image.height(),
            "preview scaled"
        );

        Ok(ScaledPreview {
            image,
            sample_size: sample,
            source_width,
            source_height,
            decoded_width,
            decoded_height,
        })
    }
}

/// Sniffed format and pixel dimensions, without decoding any pixels.
fn read_header(path: &Path) -> Result<(Option<ImageFormat>, (u32, u32))> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let dimensions = reader.into_dimensions().map_err(|err| {
        SnapliftError::ImageError(format!(
            "failed to read dimensions of {}: {err}",
            path.display()
        ))
    })?;
    debug!(?format, width = dimensions.0, height = dimensions.1, "header decoded");
    Ok((format, dimensions))
}

fn decode_full(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|err| SnapliftError::ImageError(format!("failed to decode {}: {err}", path.display())))
}

/// Decode a JPEG at the smallest IDCT scale covering `width` x `height`.
///
/// Returns `None` for pixel layouts without a direct `DynamicImage` mapping.
fn decode_jpeg_scaled(path: &Path, width: u32, height: u32) -> Result<Option<DynamicImage>> {
    let jpeg_err = |err: jpeg_decoder::Error| {
        SnapliftError::ImageError(format!("failed to decode {}: {err}", path.display()))
    };

    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(File::open(path)?));
    let requested_w = u16::try_from(width).unwrap_or(u16::MAX);
    let requested_h = u16::try_from(height).unwrap_or(u16::MAX);
    let (out_w, out_h) = decoder.scale(requested_w, requested_h).map_err(jpeg_err)?;
    let pixels = decoder.decode().map_err(jpeg_err)?;
    let format = decoder
        .info()
        .map(|info| info.pixel_format)
        .ok_or_else(|| SnapliftError::ImageError(format!("no JPEG frame in {}", path.display())))?;

    let (w, h) = (u32::from(out_w), u32::from(out_h));
    debug!(width = w, height = h, ?format, "jpeg decoded with idct scaling");

    let image = match format {
        PixelFormat::RGB24 => RgbImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8),
        PixelFormat::L8 => GrayImage::from_raw(w, h, pixels).map(DynamicImage::ImageLuma8),
        PixelFormat::L16 => {
            let samples = pixels
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, samples).map(DynamicImage::ImageLuma16)
        }
        _ => return Ok(None),
    };
    image
        .map(Some)
        .ok_or_else(|| SnapliftError::ImageError(format!("short JPEG pixel buffer in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_jpeg(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(format!("JPEG_{width}x{height}.jpg"));
        RgbImage::from_pixel(width, height, Rgb([200, 120, 40]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();
        path
    }

    #[test]
    fn factor_matches_integer_division() {
        let preview = PreviewSize::new(1080, 600);
        assert_eq!(downsample_factor(4000, 3000, preview).unwrap(), 3);
    }

    #[test]
    fn factor_is_min_of_both_axes() {
        for (bw, bh, pw, ph) in [
            (4000, 3000, 1000, 1000),
            (3000, 4000, 1000, 500),
            (640, 480, 1080, 600),
            (1, 1, 1, 1),
            (12_000, 9_000, 7, 13),
        ] {
            let expected = (bw / pw).min(bh / ph);
            assert_eq!(
                downsample_factor(bw, bh, PreviewSize::new(pw, ph)).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn small_image_gets_zero_factor() {
        assert_eq!(downsample_factor(640, 480, PreviewSize::new(1080, 600)).unwrap(), 0);
        assert_eq!(sample_size(0), 1);
    }

    #[test]
    fn unlaid_surface_is_rejected() {
        let err = downsample_factor(4000, 3000, PreviewSize::new(0, 600)).unwrap_err();
        assert!(matches!(
            err,
            SnapliftError::InvalidPreviewSurface { width: 0, height: 600 }
        ));
    }

    #[test]
    fn sample_size_rounds_down_to_power_of_two() {
        assert_eq!(sample_size(1), 1);
        assert_eq!(sample_size(2), 2);
        assert_eq!(sample_size(3), 2);
        assert_eq!(sample_size(4), 4);
        assert_eq!(sample_size(7), 4);
        assert_eq!(sample_size(8), 8);
        assert_eq!(sample_size(1000), 512);
    }

    #[test]
    fn reads_dimensions_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 320, 240);
        assert_eq!(PreviewScaler::read_dimensions(&path).unwrap(), (320, 240));
    }

    #[test]
    fn scales_capture_down_keeping_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 400, 300);

        let scaled = PreviewScaler::new(PreviewSize::new(100, 60)).scale(&path).unwrap();

        // factor = min(4, 5) = 4
        assert_eq!(scaled.sample_size, 4);
        assert_eq!((scaled.width(), scaled.height()), (100, 75));
        assert_eq!((scaled.source_width, scaled.source_height), (400, 300));
        assert!(scaled.width() <= 400 && scaled.height() <= 300);
    }

    #[test]
    fn jpeg_is_decoded_at_preview_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 3200, 2400);

        let scaled = PreviewScaler::new(PreviewSize::new(400, 300)).scale(&path).unwrap();

        assert_eq!(scaled.sample_size, 8);
        // The decoder itself emitted the 1/8 bitmap; no full-size buffer existed.
        assert_eq!((scaled.decoded_width, scaled.decoded_height), (400, 300));
        assert_eq!((scaled.width(), scaled.height()), (400, 300));
        assert!(
            u64::from(scaled.decoded_width) * u64::from(scaled.decoded_height)
                < u64::from(scaled.source_width) * u64::from(scaled.source_height) / 4
        );
    }

    #[test]
    fn sample_beyond_idct_range_finishes_on_reduced_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 1600, 1200);

        // factor = 32: the decoder stops at 1/8, the rest is a resize.
        let scaled = PreviewScaler::new(PreviewSize::new(50, 37)).scale(&path).unwrap();
        assert_eq!(scaled.sample_size, 32);
        assert_eq!((scaled.decoded_width, scaled.decoded_height), (200, 150));
        assert_eq!((scaled.width(), scaled.height()), (50, 38));
    }

    #[test]
    fn non_jpeg_input_uses_full_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        RgbImage::from_pixel(40, 20, Rgb([1, 2, 3]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let scaled = PreviewScaler::new(PreviewSize::new(10, 5)).scale(&path).unwrap();
        assert_eq!(scaled.sample_size, 4);
        assert_eq!((scaled.decoded_width, scaled.decoded_height), (40, 20));
        assert_eq!((scaled.width(), scaled.height()), (10, 5));
    }

    #[test]
    fn non_power_of_two_factor_is_rounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 300, 300);

        // factor = 3, applied as 2
        let scaled = PreviewScaler::new(PreviewSize::new(100, 100)).scale(&path).unwrap();
        assert_eq!(scaled.sample_size, 2);
        assert_eq!((scaled.width(), scaled.height()), (150, 150));
    }

    #[test]
    fn image_smaller_than_surface_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 64, 48);

        let scaled = PreviewScaler::new(PreviewSize::new(1080, 600)).scale(&path).unwrap();
        assert_eq!(scaled.sample_size, 1);
        assert_eq!((scaled.width(), scaled.height()), (64, 48));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PreviewScaler::new(PreviewSize::new(10, 10)).scale(&dir.path().join("nope.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn data_uri_sniffs_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), 8, 8);
        let bytes = std::fs::read(&path).unwrap();
        assert!(data_uri(&bytes).starts_with("data:image/jpeg;base64,"));

        let scaled = PreviewScaler::new(PreviewSize::new(4, 4)).scale(&path).unwrap();
        assert!(scaled.to_data_uri().unwrap().starts_with("data:image/png;base64,"));
    }
}
