//! Pointer handling and coordinate mapping.
//!
//! The crop surface is drawn into an egui widget whose on-screen rectangle
//! may not match the surface size exactly (e.g. on fractional scaling), so
//! positions are rescaled from widget space into surface space before they
//! reach the geometry engine.

use crate::geometry::{Point, PointerEvent, Rect, SurfaceSize};
use eframe::egui;

/// Converts a screen position into surface coordinates.
pub fn to_surface(pos: egui::Pos2, widget: egui::Rect, surface: SurfaceSize) -> Point {
    let sx = if widget.width() > 0.0 {
        surface.width / widget.width()
    } else {
        1.0
    };
    let sy = if widget.height() > 0.0 {
        surface.height / widget.height()
    } else {
        1.0
    };
    Point::new((pos.x - widget.min.x) * sx, (pos.y - widget.min.y) * sy)
}

/// Converts a surface rectangle into screen space for painting.
pub fn to_screen(rect: Rect, widget: egui::Rect, surface: SurfaceSize) -> egui::Rect {
    let sx = if surface.width > 0.0 {
        widget.width() / surface.width
    } else {
        1.0
    };
    let sy = if surface.height > 0.0 {
        widget.height() / surface.height
    } else {
        1.0
    };
    egui::Rect::from_min_size(
        egui::pos2(widget.min.x + rect.x * sx, widget.min.y + rect.y * sy),
        egui::vec2(rect.w * sx, rect.h * sy),
    )
}

/// Converts a surface point into a screen position.
pub fn to_screen_pos(p: Point, widget: egui::Rect, surface: SurfaceSize) -> egui::Pos2 {
    to_screen(Rect::new(p.x, p.y, 0.0, 0.0), widget, surface).min
}

/// Translates this frame's interaction on the surface widget into engine events.
///
/// A press without movement is reported as a down/up pair so a plain click
/// still reaches the engine.
pub fn pointer_events(
    response: &egui::Response,
    ctx: &egui::Context,
    surface: SurfaceSize,
) -> Vec<PointerEvent> {
    let widget = response.rect;
    let press_origin = ctx.input(|i| i.pointer.press_origin());
    let mut events = Vec::new();

    if response.drag_started() {
        if let Some(pos) = press_origin.or_else(|| response.interact_pointer_pos()) {
            events.push(PointerEvent::Down(to_surface(pos, widget, surface)));
        }
    }

    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(PointerEvent::Move(to_surface(pos, widget, surface)));
        }
    }

    if response.drag_stopped() {
        events.push(PointerEvent::Up);
    } else if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(PointerEvent::Down(to_surface(pos, widget, surface)));
            events.push(PointerEvent::Up);
        }
    }

    events
}
