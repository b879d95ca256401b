//! UI state types and event definitions.
//!
//! This module contains the editor's stage machine, the resize form model and
//! the events the background resize worker sends back to the UI thread.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::OutputFormat;
use crate::resize::{MAX_DIMENSION, ResizeRequest, ResizeResult};
use crate::session::CropSession;
use crate::stats::{self, ResizePreset, TargetHint};
use image::DynamicImage;
use std::sync::Arc;

/// Current stage of the editor.
///
/// `Cropping` -> `Resizing` (on Apply or Skip) -> `Closed` (on Done).
pub enum Stage {
    Cropping(Box<CropSession>),
    Resizing {
        source: Arc<DynamicImage>,
        form: ResizeForm,
    },
    Closed,
}

/// Events received from the background resize worker.
pub(crate) enum WorkerEvent {
    Finished(Result<ResizeResult>),
}

/// Editable resize settings with aspect-locked dimension coupling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeForm {
    /// Dimensions of the image being resized.
    pub source: (u32, u32),
    pub width: u32,
    pub height: u32,
    pub aspect_locked: bool,
    pub format: OutputFormat,
    pub quality: f32,
    /// Raw target size text, e.g. `200KB`. Empty means no target.
    pub target_input: String,
}

impl ResizeForm {
    pub fn new(source: (u32, u32), target: (u32, u32), config: &Config) -> Self {
        Self {
            source,
            width: target.0.clamp(1, MAX_DIMENSION),
            height: target.1.clamp(1, MAX_DIMENSION),
            aspect_locked: true,
            format: config.default_format,
            quality: config.default_quality,
            target_input: String::new(),
        }
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width.clamp(1, MAX_DIMENSION);
        if self.aspect_locked {
            self.height = stats::height_for_width(self.width, self.source).min(MAX_DIMENSION);
        }
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height.clamp(1, MAX_DIMENSION);
        if self.aspect_locked {
            self.width = stats::width_for_height(self.height, self.source).min(MAX_DIMENSION);
        }
    }

    /// Locking re-derives the height from the current width.
    pub fn set_aspect_locked(&mut self, locked: bool) {
        self.aspect_locked = locked;
        if locked {
            self.set_width(self.width);
        }
    }

    pub fn apply_preset(&mut self, preset: ResizePreset) {
        let (w, h) = preset.apply(self.source, self.aspect_locked);
        self.width = w.clamp(1, MAX_DIMENSION);
        self.height = h.clamp(1, MAX_DIMENSION);
    }

    /// The parsed target size, `None` when the field is empty.
    pub fn target_bytes(&self) -> Result<Option<u64>> {
        if self.target_input.trim().is_empty() {
            return Ok(None);
        }
        stats::parse_target_size(&self.target_input).map(Some)
    }

    /// Hint line shown under the target field.
    pub fn target_hint(&self, source_bytes: Option<u64>) -> Option<String> {
        let target = self.target_bytes().ok().flatten()?;
        let message = match source_bytes {
            Some(original) => TargetHint::new(target, self.format, original).message(self.format),
            None if self.format.is_lossless() => TargetHint::Lossless.message(self.format),
            None => format!(
                "Target: {}. Quality will auto-adjust.",
                stats::format_file_size(target)
            ),
        };
        Some(message)
    }

    /// Builds the request for the resize worker.
    pub fn request(&self) -> Result<ResizeRequest> {
        let request = ResizeRequest {
            width: self.width,
            height: self.height,
            format: self.format,
            quality: self.quality,
            target_bytes: self.target_bytes()?,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Message shown in the status line for a failed job.
pub(crate) fn failure_message(error: &AppError) -> String {
    if error.is_retryable() {
        format!("Resize failed, try again: {error}")
    } else {
        format!("Error: {error}")
    }
}
