//! Scene coordinator tying the store, selection and drag machine together.
//!
//! `TileScene` is the public entry point of the engine. Callers feed it
//! pointer and keyboard gestures; it maintains the tile store, routes
//! drags through the controller, and publishes scene events so a UI can
//! repaint and report snaps without polling.

use tilekit5_core::{EventBus, Point, SceneEvent, SvgError};
use tilekit5_settings::{SnapSettings, ViewSettings};
use tracing::{debug, info};

use crate::catalog::CatalogTile;
use crate::drag::{DragController, DragKind, DragUpdate};
use crate::selection::Selection;
use crate::shapes::TileGeometry;
use crate::spatial_index::Bounds;
use crate::svg_io;
use crate::tile_store::TileStore;

/// Pan and zoom state of the view onto the scene.
#[derive(Debug, Clone)]
pub struct Viewport {
    pan: Point,
    zoom: f64,
    settings: ViewSettings,
}

impl Viewport {
    /// A viewport at the origin with unit zoom.
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            pan: Point::ORIGIN,
            zoom: 1.0,
            settings,
        }
    }

    /// Current pan offset in scene units.
    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Moves the viewport to an absolute pan offset.
    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// Multiplies the zoom, ignoring steps that leave the allowed range.
    pub fn zoom_by(&mut self, factor: f64) -> f64 {
        let z = self.zoom * factor;
        if z > self.settings.zoom_min && z < self.settings.zoom_max {
            self.zoom = z;
        }
        self.zoom
    }

    /// One zoom step in.
    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_by(self.settings.zoom_step)
    }

    /// One zoom step out.
    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_by(1.0 / self.settings.zoom_step)
    }

    /// Sets an absolute zoom, ignoring values outside the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom > self.settings.zoom_min && zoom < self.settings.zoom_max {
            self.zoom = zoom;
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(ViewSettings::default())
    }
}

/// The drawing engine: tiles, selection, drags, viewport and events.
#[derive(Debug)]
pub struct TileScene {
    store: TileStore,
    selection: Selection,
    drag: DragController,
    snap_settings: SnapSettings,
    viewport: Viewport,
    events: EventBus,
    pan_origin: Option<Point>,
}

impl TileScene {
    /// Creates an empty scene with default settings.
    pub fn new() -> Self {
        Self::with_settings(SnapSettings::default(), ViewSettings::default())
    }

    /// Creates an empty scene with the given settings.
    pub fn with_settings(snap_settings: SnapSettings, view_settings: ViewSettings) -> Self {
        Self {
            store: TileStore::new(),
            selection: Selection::new(),
            drag: DragController::new(),
            snap_settings,
            viewport: Viewport::new(view_settings),
            events: EventBus::new(),
            pan_origin: None,
        }
    }

    /// The tile store, for read access.
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// The event bus; subscribe here for repaint and snap notifications.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Snap settings in effect.
    pub fn snap_settings(&self) -> &SnapSettings {
        &self.snap_settings
    }

    /// The viewport, for read access.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The viewport, for direct zooming.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Flips tile snapping, returning the new state.
    pub fn toggle_snap_to_tiles(&mut self) -> bool {
        self.snap_settings.snap_to_tiles = !self.snap_settings.snap_to_tiles;
        info!(enabled = self.snap_settings.snap_to_tiles, "tile snapping toggled");
        self.snap_settings.snap_to_tiles
    }

    /// Flips angle snapping, returning the new state.
    pub fn toggle_snap_to_angles(&mut self) -> bool {
        self.snap_settings.snap_to_angles = !self.snap_settings.snap_to_angles;
        info!(enabled = self.snap_settings.snap_to_angles, "angle snapping toggled");
        self.snap_settings.snap_to_angles
    }

    /// Adds a catalog tile and returns its id.
    pub fn add_tile(&mut self, entry: CatalogTile) -> u64 {
        let id = self.store.add(entry);
        self.events.publish(&SceneEvent::TileAdded { id });
        id
    }

    /// Adds a whole catalog set, returning the assigned ids.
    pub fn add_tiles(&mut self, entries: impl IntoIterator<Item = CatalogTile>) -> Vec<u64> {
        entries.into_iter().map(|e| self.add_tile(e)).collect()
    }

    /// Removes a tile, deselecting it first.
    pub fn remove_tile(&mut self, id: u64) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }
        self.selection.forget(id);
        self.events.publish(&SceneEvent::TileRemoved { id });
        true
    }

    /// Deletes every selected tile, cancelling a live drag first.
    pub fn remove_selection(&mut self) {
        self.cancel_drag();
        let ids = self.selection.ids();
        if ids.is_empty() {
            return;
        }
        self.selection.clear(&mut self.store);
        for id in ids {
            self.store.remove(id);
            self.events.publish(&SceneEvent::TileRemoved { id });
        }
        self.events.publish(&SceneEvent::TileChanged);
        self.publish_selection();
    }

    fn publish_selection(&self) {
        self.events.publish(&SceneEvent::SelectionChanged {
            count: self.selection.selected_count(),
        });
    }

    /// Selected tile ids in ascending order.
    pub fn selected_ids(&self) -> Vec<u64> {
        self.selection.ids()
    }

    /// Number of selected tiles.
    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Whether the scene point falls on the selected tiles.
    pub fn selection_hit_test(&mut self, p: Point) -> bool {
        self.selection.contains_scene_point(p, &self.store)
    }

    /// Handles a selection click at a scene position.
    ///
    /// Without `multi` the clicked tile becomes the selection and a
    /// click on empty space clears it; with `multi` the clicked tile's
    /// membership toggles and empty space is ignored. Returns the hit
    /// tile, if any.
    pub fn click_select(&mut self, pos: Point, multi: bool) -> Option<u64> {
        let hit = self.store.top_tile_at(pos);
        match hit {
            Some(id) => {
                if multi {
                    self.selection.toggle(id, &mut self.store);
                } else if !self.selection.contains(id) {
                    self.selection.clear(&mut self.store);
                    self.selection.insert(id, &mut self.store);
                }
            }
            None => {
                if !multi {
                    self.clear_selection();
                }
                return None;
            }
        }
        self.publish_selection();
        hit
    }

    /// Selects the tiles whose scene boxes intersect the band region.
    pub fn rubber_band_select(&mut self, region: &Bounds, multi: bool) {
        if !multi {
            self.selection.clear(&mut self.store);
        }
        for id in self.store.tiles_in_region(region) {
            self.selection.insert(id, &mut self.store);
        }
        self.publish_selection();
    }

    /// Selects every tile.
    pub fn select_all(&mut self) {
        self.selection.select_all(&mut self.store);
        self.publish_selection();
    }

    /// Deselects everything, cancelling a live drag first.
    pub fn clear_selection(&mut self) {
        self.cancel_drag();
        self.selection.clear(&mut self.store);
        self.publish_selection();
    }

    /// Whether a drag session is live.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Starts a drag at a scene position.
    pub fn begin_drag(&mut self, kind: DragKind, pos: Point) -> bool {
        if !self.drag.start(kind, pos, &self.selection, &self.store) {
            return false;
        }
        if kind == DragKind::Pan {
            self.pan_origin = Some(self.viewport.pan());
        }
        true
    }

    /// Feeds pointer motion into the live drag.
    pub fn update_drag(&mut self, pos: Point, invert_snap: bool) {
        let update = self
            .drag
            .update(pos, invert_snap, &mut self.selection, &self.store, &self.snap_settings);
        self.dispatch(update);
    }

    /// Handles a pointer release, committing unless the sticky grab
    /// keeps the session alive.
    pub fn release_drag(&mut self) {
        let kind = self
            .drag
            .release(&mut self.selection, &mut self.store, &self.snap_settings);
        self.finish_drag(kind);
    }

    /// Commits the live drag unconditionally.
    pub fn commit_drag(&mut self) {
        let kind = self.drag.commit(&mut self.selection, &mut self.store);
        self.finish_drag(kind);
    }

    /// Cancels the live drag, restoring pre-drag state.
    pub fn cancel_drag(&mut self) {
        match self.drag.cancel(&mut self.selection) {
            Some(DragKind::Pan) => {
                if let Some(origin) = self.pan_origin.take() {
                    self.viewport.set_pan(origin);
                }
            }
            Some(_) => debug!("drag canceled"),
            None => {}
        }
    }

    fn finish_drag(&mut self, kind: Option<DragKind>) {
        match kind {
            Some(DragKind::Pan) => {
                self.pan_origin = None;
            }
            Some(_) => {
                self.events.publish(&SceneEvent::TileChanged);
            }
            None => {}
        }
    }

    fn dispatch(&mut self, update: DragUpdate) {
        if let Some(delta) = update.pan_delta {
            if let Some(origin) = self.pan_origin {
                self.viewport.set_pan(origin + delta);
            }
        }
        for (moving, anchor) in update.snaps {
            self.events.publish(&SceneEvent::Snapped { moving, anchor });
        }
        if update.baked {
            self.events.publish(&SceneEvent::TileChanged);
        }
    }

    /// Rotates the selection by `degrees` about its current center.
    pub fn rotate_selection(&mut self, degrees: f64) {
        let update =
            self.drag
                .rotate_by(degrees, &mut self.selection, &mut self.store, &self.snap_settings);
        self.dispatch(update);
    }

    /// Scales the selection by `factor` about its current center.
    pub fn scale_selection(&mut self, factor: f64) {
        let update =
            self.drag
                .scale_by(factor, &mut self.selection, &mut self.store, &self.snap_settings);
        self.dispatch(update);
    }

    /// Scales by a digit key: the digit itself, 0 standing in for 10,
    /// and `invert` selecting the reciprocal.
    pub fn scale_selection_digit(&mut self, digit: u8, invert: bool) {
        let k = if digit == 0 { 10.0 } else { f64::from(digit) };
        let factor = if invert { 1.0 / k } else { k };
        self.scale_selection(factor);
    }

    /// Mirrors the selection horizontally about its current center.
    pub fn mirror_selection(&mut self) {
        let update = self
            .drag
            .mirror(&mut self.selection, &mut self.store, &self.snap_settings);
        self.dispatch(update);
    }

    /// Scales the selection so its most common segment length becomes 1.
    ///
    /// Looks at every polygon edge of the selected tiles in scene
    /// coordinates; a no-op when any edge is already unit length or no
    /// edges exist. Ties go to the shortest of the most common lengths.
    pub fn autoscale(&mut self) {
        const REL_TOL: f64 = 1e-6;
        fn close(a: f64, b: f64) -> bool {
            (a - b).abs() <= REL_TOL * a.abs().max(b.abs())
        }

        let mut histogram: Vec<(f64, usize)> = Vec::new();
        for id in self.selection.ids() {
            let tile = match self.store.get(id) {
                Some(t) => t,
                None => continue,
            };
            let poly = match &tile.geometry {
                TileGeometry::Polygon(p) => p,
                TileGeometry::Ellipse(_) => continue,
            };
            let pts = tile.transform.map_points(poly.vertices());
            for i in 0..pts.len() {
                let n = pts[i].distance_to(&pts[(i + 1) % pts.len()]);
                if close(n, 1.0) {
                    return;
                }
                if close(n, 0.0) {
                    continue;
                }
                match histogram.iter_mut().find(|(k, _)| close(n, *k)) {
                    Some((_, count)) => *count += 1,
                    None => histogram.push((n, 1)),
                }
            }
        }
        let mode = histogram
            .into_iter()
            .reduce(|best, next| {
                if next.1 > best.1 || (next.1 == best.1 && next.0 < best.0) {
                    next
                } else {
                    best
                }
            });
        if let Some((length, count)) = mode {
            debug!(length, count, "autoscaling selection");
            self.scale_selection(1.0 / length);
        }
    }

    /// Union of every tile's scene box.
    pub fn scene_bounds(&self) -> Option<Bounds> {
        self.store.scene_bounds()
    }

    /// Renders the scene as an SVG document string.
    pub fn to_svg(&self) -> String {
        svg_io::write_document(&self.store, &self.viewport)
    }

    /// Replaces the scene contents with a parsed SVG document.
    ///
    /// Returns the ids assigned to the loaded tiles, in document order.
    /// The recorded view mapping, when present, restores pan and zoom.
    pub fn load_svg(&mut self, text: &str) -> Result<Vec<u64>, SvgError> {
        let doc = svg_io::read_document(text)?;
        self.cancel_drag();
        self.selection.clear(&mut self.store);
        self.store.clear();
        let mut ids = Vec::with_capacity(doc.tiles.len());
        for tile in doc.tiles {
            let id = self.store.add_tile(tile);
            self.events.publish(&SceneEvent::TileAdded { id });
            ids.push(id);
        }
        if let Some(view) = doc.view_transform {
            let (a, _, _, _, e, f) = view.coefficients();
            self.viewport.set_zoom(a);
            self.viewport.set_pan(Point::new(e, f));
        }
        info!(tiles = ids.len(), "document loaded into scene");
        self.publish_selection();
        Ok(ids)
    }
}

impl Default for TileScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::color::Color;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tilekit5_core::{AffineTransform, EventCategory, EventFilter};

    const EPS: f64 = 1e-9;

    fn square(size: f64) -> CatalogTile {
        catalog::polygon_tile(
            catalog::regular_polygon(4, size).unwrap(),
            Color::default(),
        )
    }

    fn scene_with_squares(positions: &[(f64, f64)]) -> (TileScene, Vec<u64>) {
        let mut scene = TileScene::with_settings(
            SnapSettings {
                sticky_grab_ms: 0,
                ..SnapSettings::default()
            },
            ViewSettings::default(),
        );
        let mut ids = Vec::new();
        for &(x, y) in positions {
            let id = scene.add_tile(square(1.0));
            scene.store.set_transform(id, AffineTransform::translation(x, y));
            ids.push(id);
        }
        (scene, ids)
    }

    #[test]
    fn test_click_select_and_clear() {
        let (mut scene, ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 0.0)]);
        assert_eq!(scene.click_select(Point::ORIGIN, false), Some(ids[0]));
        assert_eq!(scene.selected_ids(), vec![ids[0]]);
        assert_eq!(scene.click_select(Point::new(5.0, 0.0), false), Some(ids[1]));
        assert_eq!(scene.selected_ids(), vec![ids[1]]);
        assert_eq!(scene.click_select(Point::new(50.0, 50.0), false), None);
        assert_eq!(scene.selected_count(), 0);
    }

    #[test]
    fn test_multi_click_toggles() {
        let (mut scene, ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 0.0)]);
        scene.click_select(Point::ORIGIN, false);
        scene.click_select(Point::new(5.0, 0.0), true);
        assert_eq!(scene.selected_count(), 2);
        scene.click_select(Point::ORIGIN, true);
        assert_eq!(scene.selected_ids(), vec![ids[1]]);
        scene.click_select(Point::new(50.0, 50.0), true);
        assert_eq!(scene.selected_count(), 1);
    }

    #[test]
    fn test_rubber_band_select() {
        let (mut scene, ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 0.0), (20.0, 0.0)]);
        scene.rubber_band_select(&Bounds::new(-1.0, -1.0, 6.0, 1.0), false);
        assert_eq!(scene.selected_ids(), vec![ids[0], ids[1]]);
        scene.rubber_band_select(&Bounds::new(19.0, -1.0, 21.0, 1.0), true);
        assert_eq!(scene.selected_count(), 3);
    }

    #[test]
    fn test_remove_selection_cancels_drag_and_emits() {
        let (mut scene, _ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 0.0)]);
        let removed = Arc::new(AtomicUsize::new(0));
        let r = removed.clone();
        scene.events().subscribe(
            EventFilter::Categories(vec![EventCategory::Tiles]),
            move |e| {
                if matches!(e, SceneEvent::TileRemoved { .. }) {
                    r.fetch_add(1, Ordering::SeqCst);
                }
            },
        );
        scene.select_all();
        scene.begin_drag(DragKind::Translate, Point::ORIGIN);
        scene.remove_selection();
        assert!(!scene.is_dragging());
        assert!(scene.store().is_empty());
        assert_eq!(removed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drag_snap_emits_snapped_event() {
        let (mut scene, ids) = scene_with_squares(&[(0.0, 0.0), (1.05, 0.0)]);
        let snaps = Arc::new(AtomicUsize::new(0));
        let s = snaps.clone();
        scene.events().subscribe(
            EventFilter::Categories(vec![EventCategory::Snap]),
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
        );
        scene.click_select(Point::new(1.05, 0.0), false);
        assert!(scene.begin_drag(DragKind::Translate, Point::new(1.05, 0.0)));
        scene.update_drag(Point::new(1.05, 0.0), false);
        scene.release_drag();
        assert!(snaps.load(Ordering::SeqCst) > 0);
        let center = scene.store().get(ids[1]).unwrap().scene_bounding_box().center();
        assert!((center.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_pan_drag_moves_viewport_and_cancel_restores() {
        let (mut scene, _ids) = scene_with_squares(&[(0.0, 0.0)]);
        assert!(scene.begin_drag(DragKind::Pan, Point::new(1.0, 1.0)));
        scene.update_drag(Point::new(4.0, 3.0), false);
        let pan = scene.viewport().pan();
        assert!((pan.x - 3.0).abs() < EPS && (pan.y - 2.0).abs() < EPS);
        scene.cancel_drag();
        let pan = scene.viewport().pan();
        assert!(pan.x.abs() < EPS && pan.y.abs() < EPS);
    }

    #[test]
    fn test_zoom_steps_and_clamp() {
        let mut view = Viewport::default();
        assert!((view.zoom_in() - 1.5).abs() < EPS);
        assert!((view.zoom_out() - 1.0).abs() < EPS);
        view.zoom_by(0.002);
        let before = view.zoom();
        view.zoom_by(1e-9);
        assert!((view.zoom() - before).abs() < EPS);
    }

    #[test]
    fn test_autoscale_normalizes_edge_length() {
        let mut scene = TileScene::new();
        let id = scene.add_tile(square(2.0));
        scene.select_all();
        scene.autoscale();
        let b = scene.store().get(id).unwrap().scene_bounding_box();
        assert!((b.width() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_autoscale_noop_when_unit_edges_exist() {
        let mut scene = TileScene::new();
        let small = scene.add_tile(square(0.5));
        let unit = scene.add_tile(square(1.0));
        scene.select_all();
        scene.autoscale();
        let b = scene.store().get(small).unwrap().scene_bounding_box();
        assert!((b.width() - 0.5).abs() < 1e-9);
        let _ = unit;
    }

    #[test]
    fn test_autoscale_mode_wins_over_minority() {
        let mut scene = TileScene::new();
        for _ in 0..3 {
            scene.add_tile(square(2.0));
        }
        let odd = scene.add_tile(square(3.0));
        scene.select_all();
        scene.autoscale();
        let b = scene.store().get(odd).unwrap().scene_bounding_box();
        assert!((b.width() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_snap_toggles() {
        let mut scene = TileScene::new();
        assert!(!scene.toggle_snap_to_tiles());
        assert!(scene.toggle_snap_to_tiles());
        assert!(!scene.toggle_snap_to_angles());
        assert!(scene.snap_settings().snap_to_tiles);
        assert!(!scene.snap_settings().snap_to_angles);
    }

    #[test]
    fn test_selection_events_report_count() {
        let (mut scene, _ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 0.0)]);
        let last = Arc::new(AtomicUsize::new(usize::MAX));
        let l = last.clone();
        scene.events().subscribe(
            EventFilter::Categories(vec![EventCategory::Selection]),
            move |e| {
                if let SceneEvent::SelectionChanged { count } = e {
                    l.store(*count, Ordering::SeqCst);
                }
            },
        );
        scene.select_all();
        assert_eq!(last.load(Ordering::SeqCst), 2);
        scene.clear_selection();
        assert_eq!(last.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_svg_roundtrip_through_scene() {
        let (mut scene, ids) = scene_with_squares(&[(0.0, 0.0), (5.0, 1.0)]);
        scene.viewport_mut().set_pan(Point::new(3.0, -1.0));
        scene.viewport_mut().zoom_by(1.5);
        let text = scene.to_svg();

        let mut other = TileScene::new();
        let loaded = other.load_svg(&text).unwrap();
        assert_eq!(loaded.len(), ids.len());
        let c = other.store().get(loaded[1]).unwrap().scene_bounding_box().center();
        assert!((c.x - 5.0).abs() < EPS && (c.y - 1.0).abs() < EPS);
        assert!((other.viewport().zoom() - 1.5).abs() < EPS);
        assert!((other.viewport().pan().x - 3.0).abs() < EPS);
    }

    #[test]
    fn test_load_svg_replaces_existing_tiles() {
        let (scene, _) = scene_with_squares(&[(0.0, 0.0)]);
        let text = scene.to_svg();
        let (mut other, old_ids) = scene_with_squares(&[(9.0, 9.0), (12.0, 0.0)]);
        other.load_svg(&text).unwrap();
        assert_eq!(other.store().len(), 1);
        assert!(other.store().get(old_ids[0]).is_none());
        assert!(other.selected_ids().is_empty());
    }
}
