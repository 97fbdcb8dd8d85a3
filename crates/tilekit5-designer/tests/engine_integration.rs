//! Integration tests for the tile drawing engine

use tilekit5_core::Point;
use tilekit5_designer::{catalog, CatalogTile, Color, DragKind, Snappable, TileScene};
use tilekit5_settings::{SnapSettings, ViewSettings};

const EPS: f64 = 1e-9;

fn hexagon() -> CatalogTile {
    catalog::polygon_tile(
        catalog::regular_polygon(6, 1.0).unwrap(),
        Color::default(),
    )
}

fn quick_scene(snap_dist: f64) -> TileScene {
    TileScene::with_settings(
        SnapSettings {
            snap_dist,
            sticky_grab_ms: 0,
            ..SnapSettings::default()
        },
        ViewSettings::default(),
    )
}

/// Drags the current selection by a delta with tile snapping suppressed.
fn nudge_selection(scene: &mut TileScene, from: Point, delta: Point) {
    assert!(scene.begin_drag(DragKind::Translate, from));
    scene.update_drag(from + delta, true);
    scene.commit_drag();
}

#[test]
fn test_hexagon_pair_shares_a_vertex_after_snap() {
    // A unit hexagon has its vertices on the unit circle. A twin parked
    // exactly one unit to the right shares the two vertices at x = 0.5.
    let mut scene = quick_scene(0.1);
    let first = scene.add_tile(hexagon());
    let second = scene.add_tile(hexagon());

    assert_eq!(scene.click_select(Point::ORIGIN, false), Some(second));
    nudge_selection(&mut scene, Point::ORIGIN, Point::new(1.0, 0.0));

    // Drag the first hexagon to within 0.05 of perfect alignment; the
    // snap pulls it the rest of the way.
    assert_eq!(scene.click_select(Point::new(-0.5, 0.0), false), Some(first));
    assert!(scene.begin_drag(DragKind::Translate, Point::new(-0.5, 0.0)));
    scene.update_drag(Point::new(-0.47, 0.03), false);
    scene.commit_drag();

    let shared = Point::new(0.5, 3f64.sqrt() / 2.0);
    for id in [first, second] {
        let tile = scene.store().get(id).unwrap();
        let closest = tile
            .snap_points()
            .iter()
            .map(|p| p.distance_to(&shared))
            .fold(f64::INFINITY, f64::min);
        assert!(closest < EPS, "tile {id} missed the shared vertex by {closest}");
    }
}

#[test]
fn test_cancel_after_commit_leaves_transforms_untouched() {
    let mut scene = quick_scene(0.25);
    let first = scene.add_tile(hexagon());
    let second = scene.add_tile(hexagon());

    assert_eq!(scene.click_select(Point::ORIGIN, false), Some(second));
    nudge_selection(&mut scene, Point::ORIGIN, Point::new(3.0, 1.0));

    let frozen: Vec<_> = [first, second]
        .iter()
        .map(|&id| scene.store().get(id).unwrap().transform.coefficients())
        .collect();

    // The second hexagon is still selected; start a fresh drag, move it
    // around and abandon it.
    assert!(scene.begin_drag(DragKind::Translate, Point::new(3.0, 1.0)));
    scene.update_drag(Point::new(7.0, -2.0), false);
    scene.update_drag(Point::new(-4.0, 5.0), true);
    scene.cancel_drag();

    let after: Vec<_> = [first, second]
        .iter()
        .map(|&id| scene.store().get(id).unwrap().transform.coefficients())
        .collect();
    assert_eq!(frozen, after);
}

#[test]
fn test_tangram_workflow_place_transform_delete() {
    let mut scene = TileScene::new();
    let pieces = catalog::tangram_set(2.0).unwrap();
    let ids = scene.add_tiles(
        pieces
            .into_iter()
            .map(|g| catalog::polygon_tile(g, Color::from_hsv(200, 200, 220))),
    );
    assert_eq!(ids.len(), 7);
    assert_eq!(scene.store().len(), 7);

    scene.select_all();
    assert_eq!(scene.selected_count(), 7);
    scene.rotate_selection(90.0);
    scene.mirror_selection();
    assert!(!scene.store().is_empty());

    scene.remove_selection();
    assert!(scene.store().is_empty());
    assert_eq!(scene.selected_count(), 0);
}

#[test]
fn test_autoscale_restores_unit_edges_after_scaling() {
    let mut scene = TileScene::new();
    let id = scene.add_tile(hexagon());
    scene.select_all();
    scene.scale_selection(3.0);
    let b = scene.store().get(id).unwrap().scene_bounding_box();
    assert!((b.width() - 6.0).abs() < EPS);

    scene.autoscale();
    let b = scene.store().get(id).unwrap().scene_bounding_box();
    assert!((b.width() - 2.0).abs() < EPS);
}

#[test]
fn test_scale_digit_keys_are_reciprocal() {
    let mut scene = TileScene::new();
    let id = scene.add_tile(hexagon());
    scene.select_all();
    scene.scale_selection_digit(4, false);
    scene.scale_selection_digit(4, true);
    let b = scene.store().get(id).unwrap().scene_bounding_box();
    assert!((b.width() - 2.0).abs() < EPS);

    scene.scale_selection_digit(0, false);
    let b = scene.store().get(id).unwrap().scene_bounding_box();
    assert!((b.width() - 20.0).abs() < EPS);
}
