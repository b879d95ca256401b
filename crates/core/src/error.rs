//! Error types for the snapfit-core library.
//!
//! This module provides granular error variants for the crop, resize and
//! encode stages so callers can tell a retryable failure from a bad request.

use crate::pipeline::OutputFormat;
use thiserror::Error;

/// Errors that can occur within the snapfit-core library.
///
/// An unreachable size target is deliberately absent: it is a degraded
/// success reported through [`SizeTargeting`](crate::resize::SizeTargeting).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (unparseable or out-of-range values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The crop selection has zero area or lies outside the image.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Requested output dimensions are zero or too large.
    #[error("Invalid dimensions {width}x{height} (allowed 1..={max} per side)")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    /// The requested target byte budget is not usable.
    #[error("Invalid target size: {0}")]
    InvalidTarget(String),

    /// Size targeting was requested for a format whose size ignores quality.
    #[error("{0} is lossless, quality has no effect on size so a target size cannot be reached")]
    UnsupportedTargetForFormat(OutputFormat),

    /// The encoder or resampler rejected the input.
    #[error("Encoding failed: {0}")]
    EncodeFailure(String),

    /// A resize is already running for this stage.
    #[error("A resize is already in progress")]
    Busy,

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the `image` crate.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An unclassified error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid selection error with the given message.
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    /// Creates an encode failure with the given message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeFailure(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }

    /// Whether the caller may simply try the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EncodeFailure(_) | Self::Busy | Self::Io(_))
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
