//! Resampling and encoding primitives.
//!
//! [`ResizeEncodePipeline`] is the seam between the orchestration code and
//! the pixel work. The production [`ImagePipeline`] runs Lanczos3 resampling
//! and the `image` crate's encoders on tokio's blocking pool, so a caller on
//! an async task never stalls while a large image is processed.
//!
//! For the quality search to make sense, `encode` must be deterministic for
//! the same input and its output size should not shrink as quality rises.

use crate::error::{AppError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::future::Future;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

/// Output encodings offered by the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    /// Lossy AVIF; the encoder is available with the `avif` feature.
    Avif,
    Png,
    /// WebP through the `image` crate, whose encoder is lossless.
    WebP,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Jpeg, Self::Avif, Self::Png, Self::WebP];

    /// Whether quality has no effect on the encoded size.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png | Self::WebP)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Avif => "avif",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Avif => "image/avif",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Avif => "AVIF",
            Self::Png => "PNG",
            Self::WebP => "WebP",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "image/jpeg" => Ok(Self::Jpeg),
            "avif" | "image/avif" => Ok(Self::Avif),
            "png" | "image/png" => Ok(Self::Png),
            "webp" | "image/webp" => Ok(Self::WebP),
            other => Err(AppError::config(format!("unknown output format '{other}'"))),
        }
    }
}

/// Converts a `[0, 1]` quality into the encoders' `1..=100` scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Async resample + encode primitives.
pub trait ResizeEncodePipeline: Send + Sync {
    /// High-quality resample to exactly `width` x `height`.
    fn resample(
        &self,
        image: Arc<DynamicImage>,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<Arc<DynamicImage>>> + Send;

    /// Encodes `image` at `quality` in `[0, 1]`. Lossless formats ignore quality.
    fn encode(
        &self,
        image: Arc<DynamicImage>,
        format: OutputFormat,
        quality: f32,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Production pipeline backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePipeline;

impl ResizeEncodePipeline for ImagePipeline {
    async fn resample(
        &self,
        image: Arc<DynamicImage>,
        width: u32,
        height: u32,
    ) -> Result<Arc<DynamicImage>> {
        tokio::task::spawn_blocking(move || Arc::new(resample_image(&image, width, height)))
            .await
            .map_err(|e| AppError::encode(format!("resample task failed: {e}")))
    }

    async fn encode(
        &self,
        image: Arc<DynamicImage>,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking(move || encode_image(&image, format, quality))
            .await
            .map_err(|e| AppError::encode(format!("encode task failed: {e}")))?
    }
}

/// Lanczos3 resample to an exact size. Returns a copy when the size already matches.
pub fn resample_image(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encodes `image` in `format` synchronously.
///
/// # Errors
///
/// Returns [`AppError::EncodeFailure`] if the encoder rejects the image or the
/// format's encoder is not compiled in.
pub fn encode_image(image: &DynamicImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, quality_percent(quality))
                .encode_image(&rgb)
                .map_err(|e| AppError::encode(format!("JPEG: {e}")))?;
        }
        OutputFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(|e| AppError::encode(format!("PNG: {e}")))?;
        }
        OutputFormat::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::WebP)
                .map_err(|e| AppError::encode(format!("WebP: {e}")))?;
        }
        OutputFormat::Avif => encode_avif(image, quality, &mut buffer)?,
    }
    Ok(buffer)
}

#[cfg(feature = "avif")]
fn encode_avif(image: &DynamicImage, quality: f32, buffer: &mut Vec<u8>) -> Result<()> {
    use image::ImageEncoder;
    use image::codecs::avif::AvifEncoder;

    let rgba = image.to_rgba8();
    AvifEncoder::new_with_speed_quality(buffer, 8, quality_percent(quality))
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| AppError::encode(format!("AVIF: {e}")))
}

#[cfg(not(feature = "avif"))]
fn encode_avif(_image: &DynamicImage, _quality: f32, _buffer: &mut Vec<u8>) -> Result<()> {
    Err(AppError::encode(
        "AVIF support is not compiled in (enable the `avif` feature)",
    ))
}
