use crate::error::{AppError, Result};
use crate::geometry::SurfaceSize;
use crate::pipeline::OutputFormat;
use crate::search::{MAX_ITERATIONS, QualitySearchEngine};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

pub const DEFAULT_MAX_SURFACE_WIDTH: f32 = 800.0;
pub const DEFAULT_MAX_SURFACE_HEIGHT: f32 = 460.0;
pub const DEFAULT_QUALITY: f32 = 0.9;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Largest on-screen crop surface; bigger images are scaled down to fit.
    pub max_surface_width: f32,
    pub max_surface_height: f32,
    /// Quality used when no target size is requested.
    pub default_quality: f32,
    pub default_format: OutputFormat,
    pub search_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_surface_width: DEFAULT_MAX_SURFACE_WIDTH,
            max_surface_height: DEFAULT_MAX_SURFACE_HEIGHT,
            default_quality: DEFAULT_QUALITY,
            default_format: OutputFormat::Jpeg,
            search_iterations: MAX_ITERATIONS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigBuilder::new();
        if let Some(v) = parse_var::<f32>(&lookup, "SNAPFIT_MAX_SURFACE_WIDTH")? {
            builder = builder.max_surface_width(v);
        }
        if let Some(v) = parse_var::<f32>(&lookup, "SNAPFIT_MAX_SURFACE_HEIGHT")? {
            builder = builder.max_surface_height(v);
        }
        if let Some(v) = parse_var::<f32>(&lookup, "SNAPFIT_DEFAULT_QUALITY")? {
            builder = builder.default_quality(v);
        }
        if let Some(v) = parse_var::<OutputFormat>(&lookup, "SNAPFIT_DEFAULT_FORMAT")? {
            builder = builder.default_format(v);
        }
        if let Some(v) = parse_var::<u32>(&lookup, "SNAPFIT_SEARCH_ITERATIONS")? {
            builder = builder.search_iterations(v);
        }
        builder.build()
    }

    pub fn max_surface(&self) -> SurfaceSize {
        SurfaceSize::new(self.max_surface_width, self.max_surface_height)
    }

    /// Quality search tuned by this config.
    pub fn search_engine(&self) -> QualitySearchEngine {
        QualitySearchEngine::default().with_max_iterations(self.search_iterations)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::config(format!("{key} has invalid value '{raw}'"))),
    }
}

/// Programmatic construction with validation.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_surface_width(mut self, width: f32) -> Self {
        self.config.max_surface_width = width;
        self
    }

    pub fn max_surface_height(mut self, height: f32) -> Self {
        self.config.max_surface_height = height;
        self
    }

    pub fn default_quality(mut self, quality: f32) -> Self {
        self.config.default_quality = quality;
        self
    }

    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.config.default_format = format;
        self
    }

    pub fn search_iterations(mut self, iterations: u32) -> Self {
        self.config.search_iterations = iterations;
        self
    }

    pub fn build(self) -> Result<Config> {
        let c = self.config;
        let valid_side = |v: f32| v.is_finite() && v >= 1.0;
        if !valid_side(c.max_surface_width) || !valid_side(c.max_surface_height) {
            return Err(AppError::config(format!(
                "surface bounds must be at least 1x1, got {}x{}",
                c.max_surface_width, c.max_surface_height
            )));
        }
        if !(c.default_quality > 0.0 && c.default_quality <= 1.0) {
            return Err(AppError::config(format!(
                "default quality must be in (0, 1], got {}",
                c.default_quality
            )));
        }
        if c.search_iterations == 0 {
            return Err(AppError::config("search iterations must be at least 1"));
        }
        Ok(c)
    }
}
