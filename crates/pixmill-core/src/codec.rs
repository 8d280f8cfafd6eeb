//! The imaging seam: decode, resize, crop, and encode primitives.
//!
//! Pipeline stages talk to an [`ImageCodec`] rather than to the `image`
//! crate directly, so pixel-level behavior stays the codec's concern and
//! tests can substitute a failing codec. [`RasterCodec`] is the production
//! implementation.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, RgbImage};
use thiserror::Error;

use crate::layout::{ArtifactFormat, Quality};

/// Errors surfaced by codec primitives. Stages wrap these with the source
/// path before they reach the log.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("cannot open image: {0}")]
    Open(#[source] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(
        "extract region {width}x{height}+{left}+{top} exceeds source bounds {src_width}x{src_height}"
    )]
    ExtractBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        src_width: u32,
        src_height: u32,
    },
}

/// Decode/resize/crop/encode capability the pipeline is built against.
pub trait ImageCodec: Send + Sync {
    /// Open and fully decode an image file.
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError>;

    /// Scale to fit within `width`x`height` preserving aspect ratio, then
    /// letterbox onto a canvas of exactly that size.
    fn resize_contain(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Extract a region. The region must lie entirely within the source.
    fn extract(
        &self,
        image: &DynamicImage,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError>;

    /// Encode to the given format at the given quality.
    fn encode(
        &self,
        image: &DynamicImage,
        format: ArtifactFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;

    /// Read an image's pixel dimensions without a full decode.
    fn dimensions_of(&self, path: &Path) -> Result<(u32, u32), CodecError>;
}

/// Production codec backed by the `image` crate.
///
/// WebP and PNG output is lossless; the quality value participates in
/// artifact naming for every format but only drives the JPEG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        let reader = image::ImageReader::open(path)
            .map_err(CodecError::Open)?
            .with_guessed_format()
            .map_err(CodecError::Open)?;
        Ok(reader.decode()?)
    }

    fn resize_contain(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let scaled = image.resize(width, height, FilterType::Lanczos3).to_rgb8();
        let mut canvas = RgbImage::new(width, height);
        let x = i64::from((width - scaled.width()) / 2);
        let y = i64::from((height - scaled.height()) / 2);
        imageops::overlay(&mut canvas, &scaled, x, y);
        DynamicImage::ImageRgb8(canvas)
    }

    fn extract(
        &self,
        image: &DynamicImage,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        let (src_width, src_height) = image.dimensions();
        let fits_horizontally = left.checked_add(width).is_some_and(|r| r <= src_width);
        let fits_vertically = top.checked_add(height).is_some_and(|r| r <= src_height);
        if !fits_horizontally || !fits_vertically {
            return Err(CodecError::ExtractBounds {
                left,
                top,
                width,
                height,
                src_width,
                src_height,
            });
        }
        Ok(image.crop_imm(left, top, width, height))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ArtifactFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Cursor::new(Vec::new());
        match format {
            ArtifactFormat::Jpeg => {
                // JPEG carries no alpha channel.
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut buffer,
                    quality.value(),
                );
                rgb.write_with_encoder(encoder)?;
            }
            ArtifactFormat::Webp => image.write_to(&mut buffer, ImageFormat::WebP)?,
            ArtifactFormat::Png => image.write_to(&mut buffer, ImageFormat::Png)?,
        }
        Ok(buffer.into_inner())
    }

    fn dimensions_of(&self, path: &Path) -> Result<(u32, u32), CodecError> {
        let reader = image::ImageReader::open(path)
            .map_err(CodecError::Open)?
            .with_guessed_format()
            .map_err(CodecError::Open)?;
        Ok(reader.into_dimensions()?)
    }
}
