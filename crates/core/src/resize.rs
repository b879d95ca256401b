//! Resize stage: resample once, then encode directly or search for a size.
//!
//! [`resize_and_encode`] is the single entry point both the editor and the
//! command line use. [`ResizeStage`] holds the last good result and refuses
//! to start a second job while one is running.

use crate::error::{AppError, Result};
use crate::pipeline::{OutputFormat, ResizeEncodePipeline};
use crate::search::QualitySearchEngine;
use crate::stats::format_file_size;
use image::DynamicImage;
use std::sync::Arc;

/// Largest width or height the resize stage accepts.
pub const MAX_DIMENSION: u32 = 10_000;

/// What to produce from the (cropped) source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Quality used when no target size is given, in `[0, 1]`.
    pub quality: f32,
    pub target_bytes: Option<u64>,
}

impl ResizeRequest {
    /// Checks the output dimensions are within `1..=MAX_DIMENSION`.
    pub fn validate(&self) -> Result<()> {
        let valid = |d: u32| (1..=MAX_DIMENSION).contains(&d);
        if !valid(self.width) || !valid(self.height) {
            return Err(AppError::InvalidDimensions {
                width: self.width,
                height: self.height,
                max: MAX_DIMENSION,
            });
        }
        Ok(())
    }
}

/// How the requested target size was handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeTargeting {
    /// No target size was given; encoded once at the requested quality.
    NotRequested,
    /// The search produced a result within budget (or within 10% of it).
    Met { target_bytes: u64 },
    /// Even the lowest quality overshoots the budget by more than 10%.
    ClosestAchievable { target_bytes: u64 },
    /// The format is lossless; encoded once at the requested quality.
    Unsupported { target_bytes: u64 },
}

/// A finished resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: f32,
    pub targeting: SizeTargeting,
}

impl ResizeResult {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// User-facing summary of the outcome.
    pub fn status_message(&self) -> String {
        let size = format_file_size(self.size());
        match self.targeting {
            SizeTargeting::NotRequested => "Done! Resized with Lanczos3 resampling.".to_string(),
            SizeTargeting::Met { target_bytes } => format!(
                "Done via Lanczos3! Size: {} (target: {}, quality: {}%)",
                size,
                format_file_size(target_bytes),
                (self.quality * 100.0).round() as u32
            ),
            SizeTargeting::ClosestAchievable { target_bytes } => format!(
                "Done! Closest achievable: {} (target was {}). Min quality reached.",
                size,
                format_file_size(target_bytes)
            ),
            SizeTargeting::Unsupported { .. } => format!(
                "Done! {} is lossless, target size ignored. Size: {}",
                self.format, size
            ),
        }
    }
}

/// Resamples `source` to the requested size and encodes it.
///
/// With a target size on a lossy format the encoder quality is searched;
/// on a lossless format the target is reported as unsupported and the image
/// is encoded once at `request.quality`.
///
/// # Errors
///
/// Returns [`AppError::InvalidDimensions`] for out-of-range sizes and
/// propagates resample/encode failures.
pub async fn resize_and_encode<P: ResizeEncodePipeline>(
    pipeline: &P,
    source: Arc<DynamicImage>,
    request: &ResizeRequest,
    search: &QualitySearchEngine,
) -> Result<ResizeResult> {
    request.validate()?;
    let resampled = pipeline
        .resample(source, request.width, request.height)
        .await?;

    let format = request.format;
    let (bytes, quality, targeting) = match request.target_bytes {
        None => {
            let bytes = pipeline
                .encode(resampled, format, request.quality)
                .await?;
            (bytes, request.quality, SizeTargeting::NotRequested)
        }
        Some(target_bytes) => match QualitySearchEngine::check_format(format) {
            Err(err) => {
                log::warn!("{err}; encoding once at the requested quality");
                let bytes = pipeline
                    .encode(resampled, format, request.quality)
                    .await?;
                (bytes, request.quality, SizeTargeting::Unsupported { target_bytes })
            }
            Ok(()) => {
                let outcome = search
                    .search(
                        |q| pipeline.encode(Arc::clone(&resampled), format, q),
                        target_bytes,
                    )
                    .await?;
                let targeting = if outcome.target_unreachable() {
                    SizeTargeting::ClosestAchievable { target_bytes }
                } else {
                    SizeTargeting::Met { target_bytes }
                };
                (outcome.blob, outcome.quality, targeting)
            }
        },
    };

    log::info!(
        "resized to {}x{} {} ({} bytes, q={:.2})",
        request.width,
        request.height,
        format,
        bytes.len(),
        quality
    );

    Ok(ResizeResult {
        bytes,
        width: request.width,
        height: request.height,
        format,
        quality,
        targeting,
    })
}

/// Holds the last successful resize and guards against overlapping jobs.
#[derive(Debug, Default)]
pub struct ResizeStage {
    last: Option<ResizeResult>,
    in_flight: bool,
}

impl ResizeStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn last_result(&self) -> Option<&ResizeResult> {
        self.last.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ResizeResult> {
        self.last.take()
    }

    /// Marks a job as started.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Busy`] if a job is already running.
    pub fn begin(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(AppError::Busy);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Records a finished job. A failure leaves the previous result in place.
    pub fn finish(&mut self, outcome: Result<ResizeResult>) -> Result<&ResizeResult> {
        self.in_flight = false;
        let result = outcome?;
        // Release the old encoding before holding the new one.
        self.last = None;
        Ok(self.last.insert(result))
    }

    /// Drops any result, e.g. when a new image is loaded.
    pub fn clear(&mut self) {
        self.last = None;
        self.in_flight = false;
    }
}
