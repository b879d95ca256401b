//! Coordinate mapping between the crop surface and the source image.
//!
//! The surface shows the image scaled by a single uniform factor (never
//! enlarged). Dragging happens entirely in surface space; the mapping back to
//! image pixels happens once, on commit, with rounding on each axis.

use super::{Point, Rect, SurfaceSize};
use crate::error::{AppError, Result};

/// Integer crop region in source image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageRegion {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Checks the region is non-empty and fits inside an image of the given size.
    pub fn validate(&self, image_width: u32, image_height: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::selection("crop region has zero width or height"));
        }
        let fits_x = self.x.checked_add(self.width).is_some_and(|r| r <= image_width);
        let fits_y = self.y.checked_add(self.height).is_some_and(|b| b <= image_height);
        if !fits_x || !fits_y {
            return Err(AppError::selection(format!(
                "crop region ({},{},{},{}) exceeds image bounds ({}x{})",
                self.x, self.y, self.width, self.height, image_width, image_height
            )));
        }
        Ok(())
    }
}

/// Uniform scale between surface pixels and image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: f32,
    image_width: u32,
    image_height: u32,
}

impl CoordinateMapper {
    /// Fits an image into a surface of at most `max` pixels without enlarging it.
    ///
    /// `scale = min(max.width / image_width, max.height / image_height, 1)`.
    pub fn fit(image_width: u32, image_height: u32, max: SurfaceSize) -> Self {
        let iw = image_width.max(1) as f32;
        let ih = image_height.max(1) as f32;
        let scale = (max.width / iw).min(max.height / ih).min(1.0);
        // A zero-sized container still needs a usable, positive scale.
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            scale,
            image_width,
            image_height,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Size of the backing surface: the image size times scale, rounded.
    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(
            (self.image_width as f32 * self.scale).round().max(1.0),
            (self.image_height as f32 * self.scale).round().max(1.0),
        )
    }

    pub fn to_surface(&self, image_point: Point) -> Point {
        Point::new(image_point.x * self.scale, image_point.y * self.scale)
    }

    pub fn to_image(&self, surface_point: Point) -> Point {
        Point::new(surface_point.x / self.scale, surface_point.y / self.scale)
    }

    /// Converts a length in surface pixels to whole image pixels.
    pub fn length_to_image(&self, surface_len: f32) -> u32 {
        (surface_len / self.scale).round().max(0.0) as u32
    }

    /// Maps a surface rectangle to an integer image region.
    ///
    /// Each axis is rounded, width and height are at least 1, and the result
    /// is clamped inside the image so rounding can never step past an edge.
    pub fn rect_to_image(&self, rect: Rect) -> ImageRegion {
        let iw = self.image_width.max(1);
        let ih = self.image_height.max(1);

        let x = self.length_to_image(rect.x).min(iw - 1);
        let y = self.length_to_image(rect.y).min(ih - 1);
        let width = self.length_to_image(rect.w).max(1).min(iw - x);
        let height = self.length_to_image(rect.h).max(1).min(ih - y);

        ImageRegion::new(x, y, width, height)
    }
}
