//! UI rendering helpers for the crop overlay.
//!
//! [`CropOverlay`] paints everything drawn on top of the image in the crop
//! stage: the shade outside the selection, the rule-of-thirds grid, the
//! border and the resize handles. The cursor for each hit-test result lives
//! here too.

use crate::geometry::{DragMode, HANDLE_SIZE, Handle, HitTarget};
use eframe::egui::{self, Color32, Pos2, Rect, Stroke};

/// Colours and strokes for the crop-stage overlay.
#[derive(Debug, Clone, Copy)]
pub struct CropOverlay {
    pub shade: Color32,
    pub grid: Color32,
    pub border: Stroke,
    pub handle_fill: Color32,
    pub handle_outline: Color32,
}

impl Default for CropOverlay {
    fn default() -> Self {
        Self {
            shade: Color32::from_black_alpha(150),
            grid: Color32::from_white_alpha(90),
            border: Stroke::new(2.0, Color32::WHITE),
            handle_fill: Color32::WHITE,
            handle_outline: Color32::BLACK,
        }
    }
}

impl CropOverlay {
    /// Paints the overlay for `selection` inside `surface`, both in screen space.
    pub fn paint(
        &self,
        painter: &egui::Painter,
        surface: Rect,
        selection: Rect,
        handles: impl IntoIterator<Item = (Handle, Pos2)>,
    ) {
        for band in shade_bands(surface, selection) {
            if band.is_positive() {
                painter.rect_filled(band, 0.0, self.shade);
            }
        }

        let grid = Stroke::new(1.0, self.grid);
        for segment in thirds_lines(selection) {
            painter.line_segment(segment, grid);
        }

        painter.rect_stroke(selection, 0.0, self.border, egui::StrokeKind::Middle);

        let outline = Stroke::new(1.0, self.handle_outline);
        for (handle, anchor) in handles {
            let rect = handle_rect(handle, anchor);
            painter.rect_filled(rect, 1.0, self.handle_fill);
            painter.rect_stroke(rect, 1.0, outline, egui::StrokeKind::Outside);
        }
    }
}

/// The four bands of `surface` outside `selection`: full-width strips above
/// and below, and the left and right pieces between them.
fn shade_bands(surface: Rect, selection: Rect) -> [Rect; 4] {
    let (top, bottom) = (selection.min.y, selection.max.y);
    [
        Rect::from_min_max(surface.min, egui::pos2(surface.max.x, top)),
        Rect::from_min_max(egui::pos2(surface.min.x, bottom), surface.max),
        Rect::from_min_max(egui::pos2(surface.min.x, top), egui::pos2(selection.min.x, bottom)),
        Rect::from_min_max(egui::pos2(selection.max.x, top), egui::pos2(surface.max.x, bottom)),
    ]
}

/// Two vertical then two horizontal segments splitting `selection` into thirds.
fn thirds_lines(selection: Rect) -> [[Pos2; 2]; 4] {
    let x = |t: f32| selection.min.x + selection.width() * t;
    let y = |t: f32| selection.min.y + selection.height() * t;
    let (x1, x2, y1, y2) = (x(1.0 / 3.0), x(2.0 / 3.0), y(1.0 / 3.0), y(2.0 / 3.0));
    [
        [egui::pos2(x1, selection.min.y), egui::pos2(x1, selection.max.y)],
        [egui::pos2(x2, selection.min.y), egui::pos2(x2, selection.max.y)],
        [egui::pos2(selection.min.x, y1), egui::pos2(selection.max.x, y1)],
        [egui::pos2(selection.min.x, y2), egui::pos2(selection.max.x, y2)],
    ]
}

/// On-screen square for a handle centred on `anchor`. Corners are drawn larger.
pub fn handle_rect(handle: Handle, anchor: Pos2) -> Rect {
    let side = if handle.is_corner() {
        HANDLE_SIZE
    } else {
        HANDLE_SIZE - 2.0
    };
    Rect::from_center_size(anchor, egui::vec2(side, side))
}

fn handle_cursor(handle: Handle) -> egui::CursorIcon {
    if handle.is_corner() {
        if handle.moves_north() == handle.moves_west() {
            egui::CursorIcon::ResizeNwSe
        } else {
            egui::CursorIcon::ResizeNeSw
        }
    } else if handle.is_horizontal() {
        egui::CursorIcon::ResizeHorizontal
    } else {
        egui::CursorIcon::ResizeVertical
    }
}

/// Cursor for a hovering pointer.
pub fn cursor_for(target: HitTarget) -> egui::CursorIcon {
    match target {
        HitTarget::Handle(handle) => handle_cursor(handle),
        HitTarget::Body => egui::CursorIcon::Move,
        HitTarget::Outside => egui::CursorIcon::Crosshair,
    }
}

/// Cursor while a drag is in progress, `None` when idle.
pub fn cursor_for_drag(mode: DragMode) -> Option<egui::CursorIcon> {
    match mode {
        DragMode::None => None,
        DragMode::Move => Some(egui::CursorIcon::Grabbing),
        DragMode::New => Some(egui::CursorIcon::Crosshair),
        DragMode::Resize(handle) => Some(handle_cursor(handle)),
    }
}
