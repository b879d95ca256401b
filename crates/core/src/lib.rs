//! SnapFit Core Library
//!
//! This library provides the core functionality for the SnapFit image tool:
//! interactive cropping, high-quality resizing and encoding to a target file
//! size.
//!
//! # Overview
//!
//! An image goes through two stages. The crop stage lets the user drag a
//! selection over a scaled-down surface, optionally locked to an aspect
//! ratio or a fixed output size. The resize stage resamples the cropped
//! image and encodes it, searching the encoder quality when a byte budget is
//! given. The library handles:
//!
//! - **Crop Geometry**: Hit-testing and drag state machine via [`geometry`]
//! - **Crop Sessions**: Committing a selection to pixels via [`session`]
//! - **Encoding**: Resampling and format encoders via [`pipeline`]
//! - **Size Targeting**: Quality bisection via [`search`] and [`resize`]
//! - **User Interface**: The two-stage editor window via [`ui`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`SnapFit`] facade:
//!
//! ```ignore
//! use snapfit_core::{ResizeRequest, SnapFit, OutputFormat};
//!
//! let app = SnapFit::new()?;
//! let source = app.open("photo.png")?;
//! let request = ResizeRequest {
//!     width: 800,
//!     height: 600,
//!     format: OutputFormat::Jpeg,
//!     quality: 0.9,
//!     target_bytes: Some(200 * 1024),
//! };
//! let result = app.resize(source.image.into(), &request).await?;
//! println!("{}", result.status_message());
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`geometry`]: Surface geometry, handles and the crop engine
//! - [`pipeline`]: Output formats and the resample/encode seam
//! - [`resize`]: Resize orchestration and the resize stage
//! - [`search`]: Target-size quality search
//! - [`session`]: Crop sessions and presets
//! - [`stats`]: Display formatting and sizing helpers
//! - [`ui`]: User interface components

pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod resize;
pub mod search;
pub mod session;
pub mod stats;
pub mod ui;

// Re-export primary types for convenience
pub use config::{Config, ConfigBuilder};
pub use error::{AppError, Result};
pub use geometry::{
    AspectConstraint, CoordinateMapper, CropGeometryEngine, ImageRegion, Point, PointerEvent,
    Rect, SurfaceSize,
};
pub use pipeline::{ImagePipeline, OutputFormat, ResizeEncodePipeline};
pub use resize::{ResizeRequest, ResizeResult, ResizeStage, SizeTargeting};
pub use search::{QualitySearchEngine, SearchOutcome};
pub use session::{CROP_PRESETS, CropOutcome, CropPreset, CropSession};

use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// A decoded image together with the size of the file it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    pub file_size: u64,
}

/// Main entry point for the SnapFit application.
///
/// This struct provides a facade over the various subsystems,
/// handling initialization and orchestration. It's the recommended
/// way to use the library for most use cases.
pub struct SnapFit {
    config: Config,
    pipeline: ImagePipeline,
}

impl SnapFit {
    /// Creates a new instance with configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an invalid value.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            pipeline: ImagePipeline,
        }
    }

    /// Decodes an image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<SourceImage> {
        let path = path.as_ref();
        let file_size = std::fs::metadata(path)?.len();
        let image = image::open(path)?;
        log::debug!(
            "opened {} ({}x{}, {} bytes)",
            path.display(),
            image.width(),
            image.height(),
            file_size
        );
        Ok(SourceImage { image, file_size })
    }

    /// Starts a crop session sized to the configured surface bounds.
    pub fn begin_crop(&self, image: DynamicImage) -> CropSession {
        CropSession::begin(image, self.config.max_surface())
    }

    /// Resamples and encodes `source`, searching quality if a target is set.
    ///
    /// # Errors
    ///
    /// See [`resize::resize_and_encode`].
    pub async fn resize(
        &self,
        source: Arc<DynamicImage>,
        request: &ResizeRequest,
    ) -> Result<ResizeResult> {
        resize::resize_and_encode(&self.pipeline, source, request, &self.config.search_engine())
            .await
    }

    /// Opens the editor window on `image`.
    ///
    /// Returns the last successful resize, or `None` if the window was
    /// closed without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the UI cannot be started.
    pub fn run_interactive(&self, source: SourceImage) -> Result<Option<ResizeResult>> {
        ui::run_editor_ui(source.image, Some(source.file_size), self.config.clone())
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup. This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
