//! The crop rectangle and its drag state machine.
//!
//! A drag always recomputes the rectangle from the [`DragSnapshot`] taken on
//! pointer-down rather than accumulating per-event deltas, so a long drag
//! never drifts.
//!
//! ```text
//!            Down (handle)   Down (body)   Down (outside)
//!   Idle ──────────────────────────────────────────────▶ Resize | Move | New
//!    ▲                                                        │
//!    └───────────────────────────── Up ◀──────── Move* ◀─────┘
//! ```

use super::{
    AspectConstraint, DragMode, HANDLE_SIZE, HIT_TOLERANCE, Handle, HitTarget, MIN_DIMENSION,
    Point, PointerEvent, Rect, SurfaceSize,
};

/// Rectangle and pointer position captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSnapshot {
    pub origin: Point,
    pub rect: Rect,
}

/// Owns the crop rectangle for one surface and applies pointer input to it.
///
/// The engine is a plain `Copy` value: [`step`](Self::step) is a pure
/// `(state, event) -> state` transition, and [`apply`](Self::apply) is the
/// in-place form used by the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropGeometryEngine {
    surface: SurfaceSize,
    rect: Rect,
    mode: DragMode,
    snapshot: Option<DragSnapshot>,
    constraint: AspectConstraint,
}

impl CropGeometryEngine {
    /// Creates an engine selecting the whole surface, with no constraint.
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            surface,
            rect: surface.full_rect(),
            mode: DragMode::None,
            snapshot: None,
            constraint: AspectConstraint::Free,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rect(surface: SurfaceSize, rect: Rect) -> Self {
        Self {
            rect,
            ..Self::new(surface)
        }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn snapshot(&self) -> Option<DragSnapshot> {
        self.snapshot
    }

    pub fn constraint(&self) -> AspectConstraint {
        self.constraint
    }

    pub fn is_dragging(&self) -> bool {
        self.mode.is_dragging()
    }

    /// Full-surface selection, free aspect, no drag in progress.
    pub fn reset(&mut self) {
        *self = Self::new(self.surface);
    }

    /// Selects as much of the surface as the current constraint allows.
    pub fn select_all(&mut self) {
        self.rect = self.surface.full_rect();
        self.conform();
    }

    /// Anchor points of all eight handles on the current rectangle.
    pub fn handle_anchors(&self) -> [(Handle, Point); 8] {
        Handle::ALL.map(|h| (h, h.anchor(self.rect)))
    }

    /// Classifies what a press at `p` would grab.
    ///
    /// Handles win over the body; the body excludes a border band one handle
    /// wide so edges stay grabbable on small selections.
    pub fn hit_test(&self, p: Point) -> HitTarget {
        for (handle, anchor) in self.handle_anchors() {
            if (p.x - anchor.x).abs() <= HIT_TOLERANCE && (p.y - anchor.y).abs() <= HIT_TOLERANCE {
                return HitTarget::Handle(handle);
            }
        }
        if self.rect.contains_inset(p, HANDLE_SIZE) {
            HitTarget::Body
        } else {
            HitTarget::Outside
        }
    }

    /// Pure transition: returns the state after `event`, leaving `self` untouched.
    pub fn step(self, event: PointerEvent) -> Self {
        let mut next = self;
        next.apply(event);
        next
    }

    pub fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(p) => self.begin_drag(p),
            PointerEvent::Move(p) => self.drag_to(p),
            PointerEvent::Up => self.end_drag(),
        }
    }

    pub fn begin_drag(&mut self, p: Point) {
        let p = self.surface.clamp(p);
        self.mode = match self.hit_test(p) {
            HitTarget::Handle(handle) => DragMode::Resize(handle),
            HitTarget::Body => DragMode::Move,
            HitTarget::Outside => DragMode::New,
        };
        if self.mode == DragMode::New {
            self.rect = Rect::new(p.x, p.y, 0.0, 0.0);
        }
        self.snapshot = Some(DragSnapshot {
            origin: p,
            rect: self.rect,
        });
    }

    /// Recomputes the rectangle for the pointer at `p`. No-op when idle.
    pub fn drag_to(&mut self, p: Point) {
        let Some(snapshot) = self.snapshot else {
            return;
        };
        match self.mode {
            DragMode::None => {}
            DragMode::Move => self.drag_move(snapshot, p),
            DragMode::New => self.drag_new(snapshot, p),
            DragMode::Resize(handle) => self.drag_resize(snapshot, handle, p),
        }
    }

    /// Finishes the drag. A `new` drag smaller than the minimum on both axes
    /// is treated as a click and selects everything.
    pub fn end_drag(&mut self) {
        if self.mode == DragMode::New {
            if self.rect.w < MIN_DIMENSION && self.rect.h < MIN_DIMENSION {
                self.select_all();
            } else {
                self.conform();
            }
        }
        self.mode = DragMode::None;
        self.snapshot = None;
    }

    /// Switches the constraint and reshapes the current rectangle to satisfy it.
    ///
    /// Height follows width; when that overflows the bottom of the surface the
    /// height takes the remaining space and width follows height instead. The
    /// top-left corner never moves.
    pub fn set_constraint(&mut self, constraint: AspectConstraint) {
        self.constraint = constraint;
        self.conform();
    }

    fn conform(&mut self) {
        if let Some(r) = self.constraint.value() {
            let SurfaceSize { width: sw, height: sh } = self.surface;
            let rect = &mut self.rect;
            let mut w = rect.w;
            let mut h = w / r;
            if rect.y + h > sh {
                h = sh - rect.y;
                w = (h * r).min(sw - rect.x);
                h = w / r;
            }
            rect.w = w;
            rect.h = h;
        }
        self.enforce_minimum();
    }

    /// Smallest width a selection may have under the current constraint.
    fn min_width(&self) -> f32 {
        match self.constraint.value() {
            Some(r) => MIN_DIMENSION * r.max(1.0),
            None => MIN_DIMENSION,
        }
    }

    fn min_height(&self) -> f32 {
        match self.constraint.value() {
            Some(r) => MIN_DIMENSION * (1.0 / r).max(1.0),
            None => MIN_DIMENSION,
        }
    }

    fn enforce_minimum(&mut self) {
        let SurfaceSize { width: sw, height: sh } = self.surface;
        let min_w = self.min_width().min(sw);
        let min_h = self.min_height().min(sh);
        let rect = &mut self.rect;
        if rect.w < min_w {
            rect.w = min_w;
            rect.x = rect.x.min(sw - rect.w).max(0.0);
        }
        if rect.h < min_h {
            rect.h = min_h;
            rect.y = rect.y.min(sh - rect.h).max(0.0);
        }
    }

    fn drag_move(&mut self, snapshot: DragSnapshot, p: Point) {
        let SurfaceSize { width: sw, height: sh } = self.surface;
        let o = snapshot.rect;
        let dx = p.x - snapshot.origin.x;
        let dy = p.y - snapshot.origin.y;
        self.rect.x = (o.x + dx).min(sw - o.w).max(0.0);
        self.rect.y = (o.y + dy).min(sh - o.h).max(0.0);
    }

    fn drag_new(&mut self, snapshot: DragSnapshot, p: Point) {
        let SurfaceSize { width: sw, height: sh } = self.surface;
        let anchor = snapshot.origin;
        let p = self.surface.clamp(p);

        let (mut x1, mut x2) = (anchor.x.min(p.x), anchor.x.max(p.x));
        let (mut y1, mut y2) = (anchor.y.min(p.y), anchor.y.max(p.y));

        if let Some(r) = self.constraint.value() {
            if x2 > x1 {
                // A level drag grows towards whichever side has more room.
                let upward = p.y < anchor.y || (p.y == anchor.y && anchor.y > sh - anchor.y);
                let available = if upward { anchor.y } else { sh - anchor.y };
                let mut w = x2 - x1;
                let mut h = w / r;
                if h > available {
                    h = available;
                    w = h * r;
                    if p.x < anchor.x {
                        x1 = x2 - w;
                    } else {
                        x2 = (x1 + w).min(sw);
                    }
                }
                if upward {
                    y1 = anchor.y - h;
                    y2 = anchor.y;
                } else {
                    y1 = anchor.y;
                    y2 = anchor.y + h;
                }
            }
        }

        self.rect = Rect::new(x1, y1, x2 - x1, y2 - y1);
    }

    fn drag_resize(&mut self, snapshot: DragSnapshot, handle: Handle, p: Point) {
        let SurfaceSize { width: sw, height: sh } = self.surface;
        let o = snapshot.rect;
        let dx = p.x - snapshot.origin.x;
        let dy = p.y - snapshot.origin.y;
        let min_w = self.min_width();
        let min_h = self.min_height();

        let (mut x1, mut y1, mut x2, mut y2) = (o.x, o.y, o.right(), o.bottom());

        // Each moving edge is clamped against the fixed opposite edge, then the surface.
        if handle.moves_west() {
            x1 = (o.x + dx).min(x2 - min_w).max(0.0);
        }
        if handle.moves_east() {
            x2 = (o.right() + dx).max(x1 + min_w).min(sw);
        }
        if handle.moves_north() {
            y1 = (o.y + dy).min(y2 - min_h).max(0.0);
        }
        if handle.moves_south() {
            y2 = (o.bottom() + dy).max(y1 + min_h).min(sh);
        }

        if let Some(r) = self.constraint.value() {
            if handle.is_horizontal() {
                let available = if handle.moves_north() { y2 } else { sh - y1 };
                let mut w = x2 - x1;
                let mut h = w / r;
                if h > available {
                    h = available;
                    w = h * r;
                    if handle.moves_west() {
                        x1 = x2 - w;
                    } else {
                        x2 = x1 + w;
                    }
                }
                if handle.moves_north() {
                    y1 = y2 - h;
                } else {
                    y2 = y1 + h;
                }
            } else {
                let available = sw - x1;
                let mut h = y2 - y1;
                let mut w = h * r;
                if w > available {
                    w = available;
                    h = w / r;
                    if handle.moves_north() {
                        y1 = y2 - h;
                    } else {
                        y2 = y1 + h;
                    }
                }
                x2 = x1 + w;
            }
        }

        self.rect = Rect::new(x1, y1, x2 - x1, y2 - y1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-3;

    fn surface() -> SurfaceSize {
        SurfaceSize::new(800.0, 450.0)
    }

    fn drag(engine: &mut CropGeometryEngine, from: (f32, f32), to: (f32, f32)) {
        engine.apply(PointerEvent::Down(Point::new(from.0, from.1)));
        engine.apply(PointerEvent::Move(Point::new(to.0, to.1)));
        engine.apply(PointerEvent::Up);
    }

    fn assert_rect(actual: Rect, expected: Rect) {
        let close = (actual.x - expected.x).abs() < EPS
            && (actual.y - expected.y).abs() < EPS
            && (actual.w - expected.w).abs() < EPS
            && (actual.h - expected.h).abs() < EPS;
        assert!(close, "expected {expected:?}, got {actual:?}");
    }

    fn assert_in_bounds(engine: &CropGeometryEngine) {
        let r = engine.rect();
        let s = engine.surface();
        assert!(r.x >= -EPS && r.y >= -EPS, "negative origin: {r:?}");
        assert!(r.right() <= s.width + EPS, "overflows right: {r:?}");
        assert!(r.bottom() <= s.height + EPS, "overflows bottom: {r:?}");
        assert!(r.w >= 0.0 && r.h >= 0.0, "negative size: {r:?}");
    }

    #[test]
    fn starts_with_full_frame_selection() {
        let engine = CropGeometryEngine::new(surface());
        assert_eq!(engine.rect(), Rect::new(0.0, 0.0, 800.0, 450.0));
        assert_eq!(engine.mode(), DragMode::None);
        assert_eq!(engine.constraint(), AspectConstraint::Free);
    }

    #[test]
    fn hit_test_prefers_handles_then_body() {
        let engine = CropGeometryEngine::with_rect(surface(), Rect::new(100.0, 100.0, 200.0, 100.0));
        assert_eq!(engine.hit_test(Point::new(103.0, 96.0)), HitTarget::Handle(Handle::NW));
        assert_eq!(engine.hit_test(Point::new(200.0, 200.0)), HitTarget::Handle(Handle::S));
        assert_eq!(engine.hit_test(Point::new(150.0, 150.0)), HitTarget::Body);
        // Inside the rectangle but within the border band, away from handles.
        assert_eq!(engine.hit_test(Point::new(150.0, 105.0)), HitTarget::Outside);
        assert_eq!(engine.hit_test(Point::new(500.0, 400.0)), HitTarget::Outside);
    }

    #[test]
    fn se_handle_drag_grows_from_snapshot() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 400.0, 225.0));
        engine.apply(PointerEvent::Down(Point::new(400.0, 225.0)));
        assert_eq!(engine.mode(), DragMode::Resize(Handle::SE));
        engine.apply(PointerEvent::Move(Point::new(450.0, 250.0)));
        engine.apply(PointerEvent::Move(Point::new(500.0, 275.0)));
        engine.apply(PointerEvent::Up);
        assert_rect(engine.rect(), Rect::new(0.0, 0.0, 500.0, 275.0));
        assert_eq!(engine.mode(), DragMode::None);
        assert!(engine.snapshot().is_none());
    }

    #[test]
    fn handle_drag_clamps_to_surface() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 400.0, 225.0));
        drag(&mut engine, (400.0, 225.0), (2000.0, 2000.0));
        assert_rect(engine.rect(), Rect::new(0.0, 0.0, 800.0, 450.0));
    }

    #[test]
    fn west_handle_keeps_east_edge_and_minimum() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(100.0, 100.0, 200.0, 100.0));
        drag(&mut engine, (100.0, 150.0), (600.0, 150.0));
        assert_rect(engine.rect(), Rect::new(280.0, 100.0, MIN_DIMENSION, 100.0));
    }

    #[test]
    fn move_translates_without_resizing_and_stays_inside() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(100.0, 100.0, 200.0, 100.0));
        drag(&mut engine, (200.0, 150.0), (260.0, 170.0));
        assert_rect(engine.rect(), Rect::new(160.0, 120.0, 200.0, 100.0));

        drag(&mut engine, (250.0, 170.0), (-500.0, 1000.0));
        assert_rect(engine.rect(), Rect::new(0.0, 350.0, 200.0, 100.0));
    }

    #[test]
    fn new_drag_spans_anchor_and_pointer_in_any_direction() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 100.0, 100.0));
        drag(&mut engine, (500.0, 300.0), (300.0, 200.0));
        assert_rect(engine.rect(), Rect::new(300.0, 200.0, 200.0, 100.0));
    }

    #[test]
    fn new_drag_collapses_to_point_on_press() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.apply(PointerEvent::Down(Point::new(500.0, 300.0)));
        assert_eq!(engine.mode(), DragMode::New);
        assert_eq!(engine.rect(), Rect::new(500.0, 300.0, 0.0, 0.0));
    }

    #[test]
    fn tiny_new_drag_selects_everything() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 100.0, 100.0));
        drag(&mut engine, (500.0, 300.0), (505.0, 303.0));
        assert_eq!(engine.rect(), surface().full_rect());
    }

    #[test]
    fn thin_new_drag_is_widened_to_minimum() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 100.0, 100.0));
        drag(&mut engine, (500.0, 100.0), (505.0, 300.0));
        let r = engine.rect();
        assert!(r.w >= MIN_DIMENSION - EPS);
        assert_rect(r, Rect::new(500.0, 100.0, MIN_DIMENSION, 200.0));
    }

    #[test]
    fn square_constraint_is_height_limited_on_wide_rect() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 500.0, 275.0));
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        assert_rect(engine.rect(), Rect::new(0.0, 0.0, 450.0, 450.0));
    }

    #[test]
    fn constraint_keeps_top_left_corner() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(100.0, 50.0, 300.0, 300.0));
        engine.set_constraint(AspectConstraint::ratio(16.0, 9.0));
        assert_rect(engine.rect(), Rect::new(100.0, 50.0, 300.0, 168.75));
    }

    #[test]
    fn constraint_fits_width_when_both_axes_overflow() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(700.0, 300.0, 100.0, 20.0));
        engine.set_constraint(AspectConstraint::ratio(1.0, 2.0));
        let r = engine.rect();
        assert_in_bounds(&engine);
        assert!((r.aspect().unwrap() - 0.5).abs() < EPS, "{r:?}");
        assert_eq!((r.x, r.y), (700.0, 300.0));
    }

    #[test]
    fn switching_back_to_free_leaves_rect_alone() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(10.0, 10.0, 300.0, 100.0));
        engine.set_constraint(AspectConstraint::Free);
        assert_rect(engine.rect(), Rect::new(10.0, 10.0, 300.0, 100.0));
    }

    #[test]
    fn corner_drag_with_ratio_derives_height_from_width() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 160.0, 90.0));
        engine.set_constraint(AspectConstraint::ratio(16.0, 9.0));
        drag(&mut engine, (160.0, 90.0), (320.0, 100.0));
        assert_rect(engine.rect(), Rect::new(0.0, 0.0, 320.0, 180.0));
    }

    #[test]
    fn north_handle_with_ratio_anchors_bottom_edge() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(100.0, 200.0, 200.0, 200.0));
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        drag(&mut engine, (100.0, 200.0), (50.0, 180.0));
        let r = engine.rect();
        assert!((r.bottom() - 400.0).abs() < EPS, "{r:?}");
        assert!((r.w - r.h).abs() < EPS, "{r:?}");
        assert!((r.w - 250.0).abs() < EPS, "{r:?}");
    }

    #[test]
    fn ratio_drag_against_bottom_edge_shrinks_width() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 300.0, 100.0, 100.0));
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        drag(&mut engine, (100.0, 400.0), (600.0, 400.0));
        assert_rect(engine.rect(), Rect::new(0.0, 300.0, 150.0, 150.0));
    }

    #[test]
    fn level_ratio_drag_on_bottom_edge_grows_upward() {
        let mut engine = CropGeometryEngine::new(surface());
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        engine.apply(PointerEvent::Down(Point::new(200.0, 450.0)));
        assert_eq!(engine.mode(), DragMode::New);
        engine.apply(PointerEvent::Move(Point::new(600.0, 450.0)));
        assert_rect(engine.rect(), Rect::new(200.0, 50.0, 400.0, 400.0));
        engine.apply(PointerEvent::Up);
        assert_rect(engine.rect(), Rect::new(200.0, 50.0, 400.0, 400.0));
    }

    #[test]
    fn level_ratio_drag_in_upper_half_grows_downward() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        drag(&mut engine, (200.0, 100.0), (600.0, 100.0));
        assert_rect(engine.rect(), Rect::new(200.0, 100.0, 350.0, 350.0));
    }

    #[test]
    fn tap_with_ratio_selects_largest_conforming_rect() {
        let mut engine = CropGeometryEngine::new(surface());
        engine.set_constraint(AspectConstraint::ratio(1.0, 1.0));
        engine.apply(PointerEvent::Down(Point::new(600.0, 440.0)));
        assert_eq!(engine.mode(), DragMode::New);
        engine.apply(PointerEvent::Up);
        assert_rect(engine.rect(), Rect::new(0.0, 0.0, 450.0, 450.0));
    }

    #[test]
    fn step_does_not_mutate_the_previous_state() {
        let before = CropGeometryEngine::with_rect(surface(), Rect::new(0.0, 0.0, 400.0, 225.0));
        let after = before
            .step(PointerEvent::Down(Point::new(400.0, 225.0)))
            .step(PointerEvent::Move(Point::new(500.0, 275.0)));
        assert_eq!(before.rect(), Rect::new(0.0, 0.0, 400.0, 225.0));
        assert_rect(after.rect(), Rect::new(0.0, 0.0, 500.0, 275.0));
    }

    #[test]
    fn move_while_idle_is_ignored() {
        let mut engine = CropGeometryEngine::new(surface());
        engine.apply(PointerEvent::Move(Point::new(10.0, 10.0)));
        assert_eq!(engine.rect(), surface().full_rect());
    }

    #[test]
    fn reset_restores_full_frame_and_free_aspect() {
        let mut engine = CropGeometryEngine::with_rect(surface(), Rect::new(10.0, 10.0, 50.0, 50.0));
        engine.set_constraint(AspectConstraint::ratio(4.0, 3.0));
        engine.reset();
        assert_eq!(engine.rect(), surface().full_rect());
        assert_eq!(engine.constraint(), AspectConstraint::Free);
    }

    /// One gesture: an optional handle to aim the press at, the press point
    /// and three moves, each as a fraction of the surface size.
    type Gesture = (Option<usize>, (f32, f32), [(f32, f32); 3]);

    fn gesture() -> impl Strategy<Value = Gesture> {
        let frac = || (-0.1f32..1.1, -0.1f32..1.1);
        (prop::option::of(0usize..8), frac(), prop::array::uniform3(frac()))
    }

    fn constraints() -> impl Strategy<Value = AspectConstraint> {
        prop_oneof![
            Just(AspectConstraint::Free),
            prop::sample::select(vec![(1.0, 1.0), (16.0, 9.0), (9.0, 16.0), (4.0, 3.0), (2.0, 3.0)])
                .prop_map(|(w, h)| AspectConstraint::ratio(w, h)),
        ]
    }

    /// Replays `gestures`, calling `check` after every move (`finished == false`)
    /// and after every release (`finished == true`).
    fn replay(
        surface: SurfaceSize,
        constraint: AspectConstraint,
        gestures: &[Gesture],
        mut check: impl FnMut(&CropGeometryEngine, bool) -> Result<(), TestCaseError>,
    ) -> Result<(), TestCaseError> {
        let at = |(fx, fy): (f32, f32)| Point::new(fx * surface.width, fy * surface.height);
        let mut engine = CropGeometryEngine::new(surface);
        engine.set_constraint(constraint);

        for (handle, press, moves) in gestures {
            let down = match handle {
                Some(i) => {
                    let (_, anchor) = engine.handle_anchors()[*i];
                    Point::new(anchor.x + (press.0 - 0.5) * 6.0, anchor.y + (press.1 - 0.5) * 6.0)
                }
                None => at(*press),
            };
            engine.apply(PointerEvent::Down(down));
            for m in moves {
                engine.apply(PointerEvent::Move(at(*m)));
                check(&engine, false)?;
            }
            engine.apply(PointerEvent::Up);
            check(&engine, true)?;
        }
        Ok(())
    }

    fn in_bounds(engine: &CropGeometryEngine) -> Result<(), TestCaseError> {
        let r = engine.rect();
        let s = engine.surface();
        prop_assert!(r.x >= -EPS && r.y >= -EPS, "negative origin: {:?}", r);
        prop_assert!(r.right() <= s.width + EPS, "overflows right: {:?}", r);
        prop_assert!(r.bottom() <= s.height + EPS, "overflows bottom: {:?}", r);
        prop_assert!(r.w >= 0.0 && r.h >= 0.0, "negative size: {:?}", r);
        Ok(())
    }

    proptest! {
        #[test]
        fn drags_never_leave_the_surface(
            sw in 120f32..1000.0,
            sh in 120f32..600.0,
            constraint in constraints(),
            gestures in prop::collection::vec(gesture(), 1..40),
        ) {
            replay(SurfaceSize::new(sw, sh), constraint, &gestures, |engine, _| in_bounds(engine))?;
        }

        #[test]
        fn finished_drags_respect_minimum_size(
            sw in 120f32..1000.0,
            sh in 120f32..600.0,
            constraint in constraints(),
            gestures in prop::collection::vec(gesture(), 1..40),
        ) {
            replay(SurfaceSize::new(sw, sh), constraint, &gestures, |engine, finished| {
                if finished {
                    let r = engine.rect();
                    prop_assert!(r.w >= MIN_DIMENSION - EPS, "too narrow: {:?}", r);
                    prop_assert!(r.h >= MIN_DIMENSION - EPS, "too short: {:?}", r);
                }
                Ok(())
            })?;
        }

        #[test]
        fn finished_drags_keep_the_ratio(
            sw in 120f32..1000.0,
            sh in 120f32..600.0,
            constraint in constraints(),
            gestures in prop::collection::vec(gesture(), 1..40),
        ) {
            let Some(ratio) = constraint.value() else {
                return Ok(());
            };
            replay(SurfaceSize::new(sw, sh), constraint, &gestures, |engine, finished| {
                if finished {
                    let r = engine.rect();
                    let aspect = r.aspect().unwrap_or(f32::NAN);
                    prop_assert!((aspect - ratio).abs() < 1e-2, "ratio {} broken: {:?}", ratio, r);
                }
                Ok(())
            })?;
        }
    }
}
