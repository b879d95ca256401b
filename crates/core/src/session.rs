//! Crop session: one loaded image, one geometry engine, one outcome.
//!
//! A session starts with a full-frame selection and free aspect. It ends
//! either with [`commit`](CropSession::commit), which materialises the
//! selected sub-region, or [`skip`](CropSession::skip), which passes the
//! original through. Both consume the session.

use crate::error::{AppError, Result};
use crate::geometry::{
    AspectConstraint, CoordinateMapper, CropGeometryEngine, FixedOutputSize, HitTarget,
    ImageRegion, Point, PointerEvent, Rect, SurfaceSize,
};
use image::DynamicImage;

/// A named crop shape offered to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPreset {
    pub label: &'static str,
    pub constraint: AspectConstraint,
    pub fixed_output: Option<FixedOutputSize>,
}

impl CropPreset {
    const fn ratio(label: &'static str, w: f32, h: f32) -> Self {
        Self {
            label,
            constraint: AspectConstraint::Ratio(w / h),
            fixed_output: None,
        }
    }
}

/// Crop shapes in display order. The first entry is the free preset.
pub const CROP_PRESETS: &[CropPreset] = &[
    CropPreset {
        label: "Free",
        constraint: AspectConstraint::Free,
        fixed_output: None,
    },
    CropPreset::ratio("1:1", 1.0, 1.0),
    CropPreset::ratio("4:3", 4.0, 3.0),
    CropPreset::ratio("3:2", 3.0, 2.0),
    CropPreset::ratio("16:9", 16.0, 9.0),
    CropPreset::ratio("9:16", 9.0, 16.0),
    CropPreset {
        label: "56×56",
        constraint: AspectConstraint::Ratio(1.0),
        fixed_output: Some(FixedOutputSize {
            width: 56,
            height: 56,
        }),
    },
];

/// What a finished session hands to the resize stage.
#[derive(Debug, Clone)]
pub struct CropOutcome {
    pub image: DynamicImage,
    /// The committed region, or `None` when the crop was skipped.
    pub region: Option<ImageRegion>,
    /// Default output size for the next stage.
    pub target_width: u32,
    pub target_height: u32,
}

/// Interactive crop over one image.
pub struct CropSession {
    image: DynamicImage,
    mapper: CoordinateMapper,
    engine: CropGeometryEngine,
    fixed_output: Option<FixedOutputSize>,
}

impl CropSession {
    /// Starts a session fitting `image` into a surface of at most `max_surface`.
    pub fn begin(image: DynamicImage, max_surface: SurfaceSize) -> Self {
        let mapper = CoordinateMapper::fit(image.width(), image.height(), max_surface);
        let engine = CropGeometryEngine::new(mapper.surface_size());
        log::debug!(
            "crop session for {}x{} image, scale {:.4}",
            image.width(),
            image.height(),
            mapper.scale()
        );
        Self {
            image,
            mapper,
            engine,
            fixed_output: None,
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn engine(&self) -> &CropGeometryEngine {
        &self.engine
    }

    pub fn surface(&self) -> SurfaceSize {
        self.engine.surface()
    }

    pub fn rect(&self) -> Rect {
        self.engine.rect()
    }

    pub fn fixed_output(&self) -> Option<FixedOutputSize> {
        self.fixed_output
    }

    /// The current selection in image pixels, as it would be committed.
    pub fn selection_in_image(&self) -> ImageRegion {
        self.mapper.rect_to_image(self.engine.rect())
    }

    /// Feeds one surface-space pointer event to the engine.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.engine.apply(event);
    }

    /// Hover feedback for the pointer at `p`; never changes the selection.
    pub fn hover(&self, p: Point) -> Option<HitTarget> {
        match self.engine.hit_test(p) {
            HitTarget::Outside => None,
            target => Some(target),
        }
    }

    /// Applies a crop shape to the current selection.
    pub fn apply_preset(&mut self, preset: &CropPreset) {
        self.set_constraint(preset.constraint, preset.fixed_output);
    }

    pub fn set_constraint(
        &mut self,
        constraint: AspectConstraint,
        fixed_output: Option<FixedOutputSize>,
    ) {
        self.engine.set_constraint(constraint);
        self.fixed_output = fixed_output;
    }

    /// Back to a full-frame selection with free aspect.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.fixed_output = None;
    }

    /// Materialises the selected region as a new image.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidSelection`] if the selection has no area
    /// (which the minimum-size rule on drag end normally prevents).
    pub fn commit(self) -> Result<CropOutcome> {
        let rect = self.engine.rect();
        if rect.w < 1.0 || rect.h < 1.0 {
            return Err(AppError::selection(format!(
                "selection {:.1}x{:.1} is too small to crop",
                rect.w, rect.h
            )));
        }

        let region = self.mapper.rect_to_image(rect);
        let image = crop_region(&self.image, region)?;
        let (target_width, target_height) = match self.fixed_output {
            Some(size) => (size.width, size.height),
            None => (image.width(), image.height()),
        };
        log::info!(
            "cropped {}x{} at ({}, {}) -> default output {}x{}",
            region.width,
            region.height,
            region.x,
            region.y,
            target_width,
            target_height
        );

        Ok(CropOutcome {
            image,
            region: Some(region),
            target_width,
            target_height,
        })
    }

    /// Ends the session without cropping.
    pub fn skip(self) -> CropOutcome {
        let (target_width, target_height) = (self.image.width(), self.image.height());
        CropOutcome {
            image: self.image,
            region: None,
            target_width,
            target_height,
        }
    }
}

/// Copies `region` out of `image` pixel-for-pixel, without resampling.
///
/// # Errors
///
/// Returns [`AppError::InvalidSelection`] if the region is empty or does not
/// fit inside the image.
pub fn crop_region(image: &DynamicImage, region: ImageRegion) -> Result<DynamicImage> {
    region.validate(image.width(), image.height())?;
    Ok(image.crop_imm(region.x, region.y, region.width, region.height))
}
