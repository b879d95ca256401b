//! Crop geometry: rectangles, handles and the drag state machine.
//!
//! All interactive geometry is expressed in *surface* coordinates, the pixel
//! space of the scaled-down canvas the user drags on. The
//! [`CoordinateMapper`] converts to image coordinates once, when a crop is
//! committed.
//!
//! - [`engine`]: the [`CropGeometryEngine`] state machine
//! - [`mapper`]: surface/image coordinate conversion

pub mod engine;
pub mod mapper;

pub use engine::{CropGeometryEngine, DragSnapshot};
pub use mapper::{CoordinateMapper, ImageRegion};

use std::fmt;

/// Side length of a drawn corner handle, in surface pixels.
pub const HANDLE_SIZE: f32 = 10.0;

/// Distance from a handle anchor within which a press grabs that handle.
pub const HIT_TOLERANCE: f32 = HANDLE_SIZE + 4.0;

/// Smallest width or height a finished selection may have, in surface pixels.
pub const MIN_DIMENSION: f32 = 20.0;

/// A position in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle `{x, y, w, h}` in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Width over height, or `None` for a degenerate rectangle.
    pub fn aspect(&self) -> Option<f32> {
        (self.h > 0.0).then(|| self.w / self.h)
    }

    /// Whether `p` lies strictly inside the rectangle shrunk by `inset` on every side.
    pub fn contains_inset(&self, p: Point, inset: f32) -> bool {
        p.x > self.x + inset
            && p.x < self.right() - inset
            && p.y > self.y + inset
            && p.y < self.bottom() - inset
    }
}

/// Dimensions of the interactive surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The rectangle covering the whole surface.
    pub fn full_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Clamps a point onto the surface.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// One of the eight resize handles on the selection border.
///
/// A handle is the set of edges it moves. The fields are private so only the
/// eight compass constants can exist.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    north: bool,
    south: bool,
    east: bool,
    west: bool,
}

impl Handle {
    pub const N: Handle = Handle::edges(true, false, false, false);
    pub const S: Handle = Handle::edges(false, true, false, false);
    pub const E: Handle = Handle::edges(false, false, true, false);
    pub const W: Handle = Handle::edges(false, false, false, true);
    pub const NE: Handle = Handle::edges(true, false, true, false);
    pub const NW: Handle = Handle::edges(true, false, false, true);
    pub const SE: Handle = Handle::edges(false, true, true, false);
    pub const SW: Handle = Handle::edges(false, true, false, true);

    /// All handles in hit-test order, clockwise from the top-left corner.
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    const fn edges(north: bool, south: bool, east: bool, west: bool) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn moves_north(self) -> bool {
        self.north
    }

    pub fn moves_south(self) -> bool {
        self.south
    }

    pub fn moves_east(self) -> bool {
        self.east
    }

    pub fn moves_west(self) -> bool {
        self.west
    }

    /// Whether the handle moves a vertical edge (east or west).
    pub fn is_horizontal(self) -> bool {
        self.east || self.west
    }

    pub fn is_corner(self) -> bool {
        self.is_horizontal() && (self.north || self.south)
    }

    /// Where the handle sits on `rect`.
    pub fn anchor(self, rect: Rect) -> Point {
        let x = if self.west {
            rect.x
        } else if self.east {
            rect.right()
        } else {
            rect.x + rect.w / 2.0
        };
        let y = if self.north {
            rect.y
        } else if self.south {
            rect.bottom()
        } else {
            rect.y + rect.h / 2.0
        };
        Point::new(x, y)
    }

    /// Compass name of the handle (`"nw"`, `"e"`, ...).
    pub fn name(self) -> &'static str {
        match (self.north, self.south, self.east, self.west) {
            (true, _, true, _) => "ne",
            (true, _, _, true) => "nw",
            (_, true, true, _) => "se",
            (_, true, _, true) => "sw",
            (true, ..) => "n",
            (_, true, ..) => "s",
            (_, _, true, _) => "e",
            _ => "w",
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.name())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a pointer at a given position would grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle(Handle),
    /// Interior of the selection, away from the border band.
    Body,
    /// Anywhere else; pressing here starts a new selection.
    Outside,
}

/// The active drag interaction. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    None,
    Move,
    New,
    Resize(Handle),
}

impl DragMode {
    pub fn is_dragging(self) -> bool {
        self != DragMode::None
    }
}

/// Shape constraint applied to the selection after every drag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectConstraint {
    #[default]
    Free,
    /// Width divided by height.
    Ratio(f32),
}

impl AspectConstraint {
    /// Builds a ratio constraint from `w:h` terms.
    pub fn ratio(w: f32, h: f32) -> Self {
        Self::Ratio(w / h)
    }

    pub fn value(self) -> Option<f32> {
        match self {
            Self::Free => None,
            Self::Ratio(r) => Some(r),
        }
    }
}

/// Exact pixel size a crop commits to, independent of the live rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOutputSize {
    pub width: u32,
    pub height: u32,
}

/// Input to the geometry state machine, already in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}
