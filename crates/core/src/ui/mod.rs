//! User interface components for snapfit.
//!
//! This module provides the two-stage editor window: crop the image with
//! drag handles and presets, then resize and encode it with an optional
//! target file size.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Stage machine, resize form and worker events
//! - [`input`]: Pointer events and widget/surface coordinate mapping
//! - [`rendering`]: Drawing utilities for the crop overlay and cursors
//! - [`editor`]: Main application logic
//!
//! # Usage
//!
//! ```ignore
//! use snapfit_core::{ui, Config};
//!
//! let config = Config::load()?;
//! let image = image::open("photo.jpg")?;
//!
//! if let Some(result) = ui::run_editor_ui(image, None, config)? {
//!     std::fs::write("photo_resized.jpg", &result.bytes)?;
//! }
//! ```

mod editor;
mod input;
mod rendering;
mod state;

pub use editor::SnapFitEditor;
pub use state::{ResizeForm, Stage};

use crate::config::Config;
use crate::error::Result;
use crate::resize::ResizeResult;
use image::DynamicImage;

/// Launches the editor and returns the last successful resize.
///
/// # Arguments
/// * `image` - The image to crop and resize
/// * `source_bytes` - Size of the file it came from, used for target-size hints
/// * `config` - Application configuration
///
/// # Returns
/// - `Ok(Some(result))` - At least one resize succeeded before the window closed
/// - `Ok(None)` - The window closed without a resize
/// - `Err(e)` - The window could not be created
pub fn run_editor_ui(
    image: DynamicImage,
    source_bytes: Option<u64>,
    config: Config,
) -> Result<Option<ResizeResult>> {
    editor::run(image, source_bytes, config)
}
