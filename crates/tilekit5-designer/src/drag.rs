//! Drag state machine for selection transforms.
//!
//! A drag session turns pointer motion into a candidate composite on
//! the selection: translate, rotate about the frozen center, or scale
//! about it. Pan sessions use the same lifecycle but move the viewport
//! instead of the selection. Nothing is baked into tile transforms
//! until the session commits, so cancel is always cheap.
//!
//! The transform center is frozen when the drag starts; keyboard
//! rotate/scale accumulate about the selection's current center
//! instead, so repeated keystrokes pivot where the tiles are now.

use std::time::{Duration, Instant};

use tilekit5_core::{angle_between_degrees, AffineTransform, Point};
use tilekit5_settings::SnapSettings;
use tracing::{debug, trace};

use crate::selection::Selection;
use crate::snap;
use crate::tile_store::TileStore;

/// What a pointer drag manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Slide the selection with the pointer.
    Translate,
    /// Rotate about the frozen transform center.
    Rotate,
    /// Scale uniformly about the frozen transform center.
    Scale,
    /// Move the viewport, leaving tiles alone.
    Pan,
}

#[derive(Debug)]
struct DragSession {
    kind: DragKind,
    started: Instant,
    start_pos: Point,
    center: Point,
    start_vector_len: f64,
    start_composite: AffineTransform,
    translate: Point,
    rotate_degrees: f64,
    scale: f64,
}

/// Result of one drag or keyboard step, for event emission.
#[derive(Debug, Default)]
pub struct DragUpdate {
    /// Viewport offset from the drag start, for pan sessions.
    pub pan_delta: Option<Point>,
    /// Snap pairs applied this step, moving point first.
    pub snaps: Vec<(Point, Point)>,
    /// Whether member transforms were baked (keyboard edits outside a
    /// live drag commit immediately).
    pub baked: bool,
}

/// Tracks the one live drag session and the keyboard accumulators.
#[derive(Debug)]
pub struct DragController {
    session: Option<DragSession>,
    mirror_sign: f64,
    kbd_rotate_degrees: f64,
    kbd_scale: f64,
}

impl DragController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self {
            session: None,
            mirror_sign: 1.0,
            kbd_rotate_degrees: 0.0,
            kbd_scale: 1.0,
        }
    }

    /// Whether a drag session is live.
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Kind of the live session, if any.
    pub fn kind(&self) -> Option<DragKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    fn reset_accumulators(&mut self) {
        self.mirror_sign = 1.0;
        self.kbd_rotate_degrees = 0.0;
        self.kbd_scale = 1.0;
    }

    /// Opens a drag session at the given scene position.
    ///
    /// Returns false when a session is already live, when a selection
    /// drag has nothing selected, or when a rotate/scale press lands on
    /// the transform center and leaves no start vector to measure
    /// against.
    pub fn start(
        &mut self,
        kind: DragKind,
        pos: Point,
        selection: &Selection,
        store: &TileStore,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }
        let (center, start_vector_len) = if kind == DragKind::Pan {
            (pos, 0.0)
        } else {
            let center = match selection.transform_center(store) {
                Some(c) => c,
                None => return false,
            };
            let len = (pos - center).length();
            if matches!(kind, DragKind::Rotate | DragKind::Scale) && len <= f64::EPSILON {
                debug!(?kind, "refusing drag with zero start vector");
                return false;
            }
            (center, len)
        };
        self.reset_accumulators();
        self.session = Some(DragSession {
            kind,
            started: Instant::now(),
            start_pos: pos,
            center,
            start_vector_len,
            start_composite: *selection.composite(),
            translate: Point::ORIGIN,
            rotate_degrees: 0.0,
            scale: 1.0,
        });
        debug!(?kind, "drag started");
        true
    }

    /// Feeds a pointer position into the live session.
    ///
    /// `invert_snap` is the modifier that flips the snap toggles for
    /// this gesture. A selection emptied mid-drag cancels silently.
    pub fn update(
        &mut self,
        pos: Point,
        invert_snap: bool,
        selection: &mut Selection,
        store: &TileStore,
        settings: &SnapSettings,
    ) -> DragUpdate {
        let session = match &mut self.session {
            Some(s) => s,
            None => return DragUpdate::default(),
        };
        if session.kind == DragKind::Pan {
            return DragUpdate {
                pan_delta: Some(pos - session.start_pos),
                ..DragUpdate::default()
            };
        }
        if selection.is_empty() {
            trace!("selection emptied mid-drag");
            self.session = None;
            self.reset_accumulators();
            return DragUpdate::default();
        }
        match session.kind {
            DragKind::Translate => {
                session.translate = pos - session.start_pos;
            }
            DragKind::Rotate => {
                let mut angle = angle_between_degrees(session.center, session.start_pos, pos);
                if settings.snap_to_angles != invert_snap {
                    let step = settings.angle_step_degrees();
                    angle = step * (angle / step).round();
                }
                session.rotate_degrees = angle;
            }
            DragKind::Scale => {
                let raw = (pos - session.center).length() / session.start_vector_len;
                if raw > f64::EPSILON {
                    session.scale = if invert_snap { raw } else { quantize_scale(raw) };
                }
            }
            DragKind::Pan => unreachable!("pan handled above"),
        }
        self.reapply(invert_snap, selection, store, settings)
    }

    // Rebuild the selection composite from the session state and the
    // keyboard accumulators, then snap.
    fn reapply(
        &self,
        invert_snap: bool,
        selection: &mut Selection,
        store: &TileStore,
        settings: &SnapSettings,
    ) -> DragUpdate {
        let session = match &self.session {
            Some(s) => s,
            None => return DragUpdate::default(),
        };
        let c = session.center;
        let mut composite = session.start_composite;
        if self.mirror_sign < 0.0 {
            composite = composite.then(&AffineTransform::scale_about(c, -1.0, 1.0));
        }
        if session.rotate_degrees != 0.0 {
            composite = composite.then(&AffineTransform::rotation_about(c, session.rotate_degrees));
        }
        if session.scale != 1.0 {
            composite =
                composite.then(&AffineTransform::scale_about(c, session.scale, session.scale));
        }
        composite = composite.then(&AffineTransform::translation(
            session.translate.x,
            session.translate.y,
        ));
        selection.set_composite(composite);

        if self.kbd_rotate_degrees != 0.0 || self.kbd_scale != 1.0 {
            if let Some(current) = selection.transform_center(store) {
                composite = composite
                    .then(&AffineTransform::rotation_about(
                        current,
                        self.kbd_rotate_degrees,
                    ))
                    .then(&AffineTransform::scale_about(
                        current,
                        self.kbd_scale,
                        self.kbd_scale,
                    ));
                selection.set_composite(composite);
            }
        }

        let mut snaps = Vec::new();
        if settings.snap_to_tiles != invert_snap {
            let ids = selection.ids();
            match session.kind {
                DragKind::Translate => {
                    let found = snap::nearest_snaps(store, &ids, &composite, settings, None);
                    if let Some(first) = found.first() {
                        composite = composite
                            .then(&snap::correction_by_translation(first.moving, first.anchor));
                        snaps.push((first.moving, first.anchor));
                        // A second pair, rotated into place about the
                        // anchor the first snap just landed on.
                        let again = snap::nearest_snaps(
                            store,
                            &ids,
                            &composite,
                            settings,
                            Some(first.anchor),
                        );
                        if let Some(second) = again.first() {
                            composite = composite.then(&snap::correction_by_rotation(
                                first.anchor,
                                second.moving,
                                second.anchor,
                            ));
                            snaps.push((second.moving, second.anchor));
                        }
                    }
                }
                DragKind::Rotate => {
                    let found = snap::nearest_snaps(store, &ids, &composite, settings, Some(c));
                    if let Some(first) = found.first() {
                        composite = composite.then(&snap::correction_by_rotation_with_nudge(
                            c,
                            first.moving,
                            first.anchor,
                        ));
                        snaps.push((first.moving, first.anchor));
                    }
                }
                DragKind::Scale => {
                    let found = snap::nearest_snaps(store, &ids, &composite, settings, Some(c));
                    if let Some(first) = found.first() {
                        if let Some(correction) =
                            snap::correction_by_scaling(c, first.moving, first.anchor)
                        {
                            composite = composite.then(&correction);
                            snaps.push((first.moving, first.anchor));
                        }
                    }
                }
                DragKind::Pan => {}
            }
            selection.set_composite(composite);
        }
        DragUpdate {
            pan_delta: None,
            snaps,
            baked: false,
        }
    }

    /// Handles a pointer release.
    ///
    /// A release within the sticky-grab window keeps the session alive
    /// so a click picks the selection up and a second click drops it.
    /// Returns the committed kind, or `None` when the session was kept
    /// or no session was live.
    pub fn release(
        &mut self,
        selection: &mut Selection,
        store: &mut TileStore,
        settings: &SnapSettings,
    ) -> Option<DragKind> {
        let session = self.session.as_ref()?;
        if session.started.elapsed() < Duration::from_millis(settings.sticky_grab_ms) {
            trace!("sticky grab keeps the drag alive");
            return None;
        }
        self.commit(selection, store)
    }

    /// Commits the live session, baking the composite into the members.
    pub fn commit(&mut self, selection: &mut Selection, store: &mut TileStore) -> Option<DragKind> {
        let session = self.session.take()?;
        if session.kind != DragKind::Pan {
            selection.bake_composite(store);
        }
        self.reset_accumulators();
        debug!(kind = ?session.kind, "drag committed");
        Some(session.kind)
    }

    /// Abandons the live session, restoring the start composite.
    ///
    /// Member transforms already baked by earlier commits are untouched.
    pub fn cancel(&mut self, selection: &mut Selection) -> Option<DragKind> {
        let session = self.session.take()?;
        if session.kind != DragKind::Pan {
            selection.set_composite(session.start_composite);
        }
        self.reset_accumulators();
        debug!(kind = ?session.kind, "drag canceled");
        Some(session.kind)
    }

    /// Rotates the selection by `degrees` about its current center.
    ///
    /// During a drag this accumulates into the live composite; outside
    /// one it applies and bakes immediately.
    pub fn rotate_by(
        &mut self,
        degrees: f64,
        selection: &mut Selection,
        store: &mut TileStore,
        settings: &SnapSettings,
    ) -> DragUpdate {
        if self.session.is_some() {
            self.kbd_rotate_degrees += degrees;
            return self.reapply(false, selection, store, settings);
        }
        let center = match selection.transform_center(store) {
            Some(c) => c,
            None => return DragUpdate::default(),
        };
        let composite = selection
            .composite()
            .then(&AffineTransform::rotation_about(center, degrees));
        selection.set_composite(composite);
        selection.bake_composite(store);
        DragUpdate {
            baked: true,
            ..DragUpdate::default()
        }
    }

    /// Scales the selection by `factor` about its current center.
    ///
    /// Non-positive or non-finite factors are ignored.
    pub fn scale_by(
        &mut self,
        factor: f64,
        selection: &mut Selection,
        store: &mut TileStore,
        settings: &SnapSettings,
    ) -> DragUpdate {
        if !factor.is_finite() || factor <= f64::EPSILON {
            return DragUpdate::default();
        }
        if self.session.is_some() {
            self.kbd_scale *= factor;
            return self.reapply(false, selection, store, settings);
        }
        let center = match selection.transform_center(store) {
            Some(c) => c,
            None => return DragUpdate::default(),
        };
        let composite = selection
            .composite()
            .then(&AffineTransform::scale_about(center, factor, factor));
        selection.set_composite(composite);
        selection.bake_composite(store);
        DragUpdate {
            baked: true,
            ..DragUpdate::default()
        }
    }

    /// Flips the selection horizontally about its current center.
    pub fn mirror(
        &mut self,
        selection: &mut Selection,
        store: &mut TileStore,
        settings: &SnapSettings,
    ) -> DragUpdate {
        if self.session.is_some() {
            self.mirror_sign = -self.mirror_sign;
            return self.reapply(false, selection, store, settings);
        }
        let center = match selection.transform_center(store) {
            Some(c) => c,
            None => return DragUpdate::default(),
        };
        let composite = selection
            .composite()
            .then(&AffineTransform::scale_about(center, -1.0, 1.0));
        selection.set_composite(composite);
        selection.bake_composite(store);
        DragUpdate {
            baked: true,
            ..DragUpdate::default()
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

// Integer factors when growing, unit fractions when shrinking, so
// dragged scales land on ratios that tile cleanly.
fn quantize_scale(raw: f64) -> f64 {
    if raw >= 1.0 {
        raw.round()
    } else {
        1.0 / (1.0 / raw).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::color::Color;

    const EPS: f64 = 1e-9;

    fn square_at(store: &mut TileStore, x: f64, y: f64) -> u64 {
        let id = store.add(catalog::polygon_tile(
            catalog::regular_polygon(4, 1.0).unwrap(),
            Color::default(),
        ));
        store.set_transform(id, AffineTransform::translation(x, y));
        id
    }

    fn select(store: &mut TileStore, ids: &[u64]) -> Selection {
        let mut sel = Selection::new();
        for id in ids {
            sel.insert(*id, store);
        }
        sel
    }

    fn quick_commit() -> SnapSettings {
        SnapSettings {
            sticky_grab_ms: 0,
            ..SnapSettings::default()
        }
    }

    #[test]
    fn test_translate_drag_commits_offset() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = quick_commit();

        assert!(drag.start(DragKind::Translate, Point::new(0.2, 0.1), &sel, &store));
        drag.update(Point::new(5.2, 0.1), true, &mut sel, &store, &settings);
        assert_eq!(drag.release(&mut sel, &mut store, &settings), Some(DragKind::Translate));
        let center = store.get(id).unwrap().scene_bounding_box().center();
        assert!((center.x - 5.0).abs() < EPS);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_rotate_drag_quantizes_angle() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        assert!(drag.start(DragKind::Rotate, Point::new(1.0, 0.0), &sel, &store));
        // 61 degrees of pointer motion quantizes to the 3 degree grid.
        let pos = Point::new(61f64.to_radians().cos(), 61f64.to_radians().sin());
        drag.update(pos, false, &mut sel, &store, &settings);
        let mapped = sel.composite().map_point(&Point::new(1.0, 0.0));
        assert!((mapped.x - 60f64.to_radians().cos()).abs() < EPS);
        assert!((mapped.y - 60f64.to_radians().sin()).abs() < EPS);
    }

    #[test]
    fn test_rotate_refuses_zero_start_vector() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        assert!(!drag.start(DragKind::Rotate, Point::ORIGIN, &sel, &store));
        assert!(!drag.start(DragKind::Scale, Point::ORIGIN, &sel, &store));
        assert!(drag.start(DragKind::Translate, Point::ORIGIN, &sel, &store));
    }

    #[test]
    fn test_scale_drag_quantizes_factor() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        assert!(drag.start(DragKind::Scale, Point::new(1.0, 0.0), &sel, &store));
        drag.update(Point::new(2.4, 0.0), false, &mut sel, &store, &settings);
        let b = sel.scene_bounding_box(&store).unwrap();
        assert!((b.width() - 2.0).abs() < EPS);

        drag.update(Point::new(0.28, 0.0), false, &mut sel, &store, &settings);
        let b = sel.scene_bounding_box(&store).unwrap();
        assert!((b.width() - 0.25).abs() < EPS);
    }

    #[test]
    fn test_sticky_release_keeps_session() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        assert!(drag.start(DragKind::Translate, Point::ORIGIN, &sel, &store));
        // An immediate release is a click; the selection stays grabbed.
        assert_eq!(drag.release(&mut sel, &mut store, &settings), None);
        assert!(drag.is_dragging());
        assert_eq!(drag.commit(&mut sel, &mut store), Some(DragKind::Translate));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_cancel_restores_start_composite() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        drag.start(DragKind::Translate, Point::ORIGIN, &sel, &store);
        drag.update(Point::new(9.0, 9.0), true, &mut sel, &store, &settings);
        assert_eq!(drag.cancel(&mut sel), Some(DragKind::Translate));
        assert!(sel.composite().is_identity(1e-12));
        let center = store.get(id).unwrap().scene_bounding_box().center();
        assert!(center.x.abs() < EPS && center.y.abs() < EPS);
    }

    #[test]
    fn test_translate_snap_pulls_edges_together() {
        let mut store = TileStore::new();
        let _anchor = square_at(&mut store, 0.0, 0.0);
        let moving = square_at(&mut store, 1.05, 0.0);
        let mut sel = select(&mut store, &[moving]);
        let mut drag = DragController::new();
        let settings = quick_commit();

        drag.start(DragKind::Translate, Point::new(1.05, 0.0), &sel, &store);
        let update = drag.update(Point::new(1.05, 0.0), false, &mut sel, &store, &settings);
        assert!(!update.snaps.is_empty());
        drag.commit(&mut sel, &mut store);
        let center = store.get(moving).unwrap().scene_bounding_box().center();
        assert!((center.x - 1.0).abs() < EPS);
        assert!(center.y.abs() < EPS);
    }

    #[test]
    fn test_modifier_inverts_tile_snapping() {
        let mut store = TileStore::new();
        let _anchor = square_at(&mut store, 0.0, 0.0);
        let moving = square_at(&mut store, 1.05, 0.0);
        let mut sel = select(&mut store, &[moving]);
        let mut drag = DragController::new();
        let settings = quick_commit();

        drag.start(DragKind::Translate, Point::new(1.05, 0.0), &sel, &store);
        let update = drag.update(Point::new(1.05, 0.0), true, &mut sel, &store, &settings);
        assert!(update.snaps.is_empty());
        drag.commit(&mut sel, &mut store);
        let center = store.get(moving).unwrap().scene_bounding_box().center();
        assert!((center.x - 1.05).abs() < EPS);
    }

    #[test]
    fn test_selection_emptied_mid_drag_cancels() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        drag.start(DragKind::Translate, Point::ORIGIN, &sel, &store);
        sel.clear(&mut store);
        drag.update(Point::new(1.0, 0.0), true, &mut sel, &store, &settings);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_pan_session_reports_delta() {
        let mut store = TileStore::new();
        let mut sel = Selection::new();
        let mut drag = DragController::new();
        let settings = quick_commit();

        assert!(drag.start(DragKind::Pan, Point::new(1.0, 1.0), &sel, &store));
        let update = drag.update(Point::new(3.0, 2.0), false, &mut sel, &store, &settings);
        let delta = update.pan_delta.unwrap();
        assert!((delta.x - 2.0).abs() < EPS && (delta.y - 1.0).abs() < EPS);
        assert_eq!(drag.release(&mut sel, &mut store, &settings), Some(DragKind::Pan));
    }

    #[test]
    fn test_kbd_rotate_outside_drag_bakes() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 2.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        let update = drag.rotate_by(90.0, &mut sel, &mut store, &settings);
        assert!(update.baked);
        assert!(sel.composite().is_identity(1e-12));
        let mapped = store
            .get(id)
            .unwrap()
            .transform
            .map_point(&Point::new(0.5, 0.0));
        assert!((mapped.x - 2.0).abs() < EPS);
        assert!((mapped.y - 0.5).abs() < EPS);
    }

    #[test]
    fn test_kbd_scale_outside_drag_keeps_center() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 2.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        drag.scale_by(2.0, &mut sel, &mut store, &settings);
        let b = store.get(id).unwrap().scene_bounding_box();
        assert!((b.width() - 2.0).abs() < EPS);
        assert!((b.center().x - 2.0).abs() < EPS);
        drag.scale_by(0.0, &mut sel, &mut store, &settings);
        let b = store.get(id).unwrap().scene_bounding_box();
        assert!((b.width() - 2.0).abs() < EPS);
    }

    #[test]
    fn test_mirror_outside_drag_flips_handedness() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 2.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        let update = drag.mirror(&mut sel, &mut store, &settings);
        assert!(update.baked);
        let tile = store.get(id).unwrap();
        assert!(tile.transform.determinant() < 0.0);
        let center = tile.scene_bounding_box().center();
        assert!((center.x - 2.0).abs() < EPS);
    }

    #[test]
    fn test_mirror_twice_during_drag_is_identity() {
        let mut store = TileStore::new();
        let id = square_at(&mut store, 0.0, 0.0);
        let mut sel = select(&mut store, &[id]);
        let mut drag = DragController::new();
        let settings = SnapSettings::default();

        drag.start(DragKind::Translate, Point::ORIGIN, &sel, &store);
        drag.mirror(&mut sel, &mut store, &settings);
        assert!(sel.composite().determinant() < 0.0);
        drag.mirror(&mut sel, &mut store, &settings);
        assert!(sel.composite().is_identity(1e-9));
        drag.cancel(&mut sel);
        let _ = id;
    }
}
