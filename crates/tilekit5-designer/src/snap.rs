//! Magnetic snap search and corrective transforms.
//!
//! While a selection is dragged, every selected tile's snap points are
//! compared against the snap points of nearby stationary tiles. The
//! search returns all pairs at the minimum distance (within the snap
//! radius); the drag controller then picks the first pair under a
//! deterministic ordering and applies one of the corrective transforms
//! below so the pair coincides exactly.
//!
//! Distances are compared squared. The search is budgeted by wall
//! clock; a search that overruns returns no candidates rather than
//! stalling the drag.

use std::time::Instant;

use tilekit5_core::{angle_between_degrees, AffineTransform, Point};
use tilekit5_settings::SnapSettings;
use tracing::{info, trace};

use crate::shapes::Snappable;
use crate::spatial_index::Bounds;
use crate::tile_store::TileStore;

/// A matched pair of snap points within snapping range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    /// Snap point on the moving selection, in scene coordinates, with
    /// the candidate drag transform applied.
    pub moving: Point,
    /// Snap point on a stationary tile.
    pub anchor: Point,
    /// Squared distance between the pair.
    pub dist2: f64,
}

impl SnapCandidate {
    fn sort_key(&self) -> [f64; 4] {
        [self.moving.x, self.moving.y, self.anchor.x, self.anchor.y]
    }
}

fn mapped_bounds(bounds: &Bounds, transform: &AffineTransform) -> Bounds {
    let corners = [
        Point::new(bounds.min_x, bounds.min_y),
        Point::new(bounds.max_x, bounds.min_y),
        Point::new(bounds.max_x, bounds.max_y),
        Point::new(bounds.min_x, bounds.max_y),
    ];
    Bounds::from_points(&transform.map_points(&corners))
}

/// Finds the closest snap point pairs between a dragged selection and
/// the stationary tiles around it.
///
/// `candidate` is the drag transform applied on top of each selected
/// tile's own transform. All pairs tied for the minimum distance are
/// returned, sorted by their scene coordinates so equal inputs yield
/// equal outputs. Pairs within `snap_dist / exclude_divisor` of
/// `exclude` are skipped; a prior snap passes its anchor here so a
/// secondary search cannot rediscover the same pair.
pub fn nearest_snaps(
    store: &TileStore,
    selection: &[u64],
    candidate: &AffineTransform,
    settings: &SnapSettings,
    exclude: Option<Point>,
) -> Vec<SnapCandidate> {
    let started = Instant::now();
    let margin = settings.snap_dist * settings.margin_factor;
    let exclude_radius = settings.snap_dist / settings.exclude_divisor;
    let mut best_dist2 = settings.snap_dist * settings.snap_dist;
    let mut nearest: Vec<SnapCandidate> = Vec::new();

    let excluded = |point: Point| match exclude {
        Some(e) => point.distance_to(&e) <= exclude_radius,
        None => false,
    };
    let is_selected = |id: u64| selection.contains(&id);

    // Cheap whole-selection check before the per-tile loops.
    let whole = selection
        .iter()
        .filter_map(|&id| store.get(id))
        .map(|t| mapped_bounds(&t.scene_bounding_box(), candidate))
        .reduce(|a, b| a.union(&b));
    let whole = match whole {
        Some(b) => b,
        None => return Vec::new(),
    };
    if store
        .tiles_in_region(&whole.expanded(margin))
        .iter()
        .all(|&id| is_selected(id))
    {
        return Vec::new();
    }

    for &child_id in selection {
        let child = match store.get(child_id) {
            Some(t) => t,
            None => continue,
        };
        let region = mapped_bounds(&child.scene_bounding_box(), candidate).expanded(margin);
        let neighbors: Vec<u64> = store
            .tiles_in_region(&region)
            .into_iter()
            .filter(|&id| !is_selected(id))
            .collect();
        if !neighbors.is_empty() {
            trace!(child = child_id, count = neighbors.len(), "nearby tiles");
            let child_points: Vec<Point> = child
                .snap_points()
                .iter()
                .map(|p| candidate.map_point(p))
                .collect();
            for other_id in neighbors {
                let other = match store.get(other_id) {
                    Some(t) => t,
                    None => continue,
                };
                for &p in &child_points {
                    if excluded(p) {
                        continue;
                    }
                    for &q in other.snap_points().iter() {
                        if excluded(q) {
                            continue;
                        }
                        let d2 = p.distance_squared_to(&q);
                        if d2 <= best_dist2 {
                            if d2 < best_dist2 {
                                best_dist2 = d2;
                                nearest.clear();
                            }
                            nearest.push(SnapCandidate {
                                moving: p,
                                anchor: q,
                                dist2: d2,
                            });
                        }
                    }
                }
            }
        }
        let elapsed = started.elapsed();
        if elapsed.as_millis() as u64 >= settings.search_budget_ms {
            info!(elapsed_ms = elapsed.as_millis() as u64, "aborting slow snap search");
            return Vec::new();
        }
    }

    nearest.sort_by(|a, b| {
        let (ka, kb) = (a.sort_key(), b.sort_key());
        ka.iter()
            .zip(kb.iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    nearest
}

/// Translation aligning `moving` with `anchor`.
pub fn correction_by_translation(moving: Point, anchor: Point) -> AffineTransform {
    let d = anchor - moving;
    AffineTransform::translation(d.x, d.y)
}

/// Rotation about `origin` turning the ray through `moving` onto the
/// ray through `anchor`.
///
/// The two points only coincide afterwards when they are equidistant
/// from `origin`; rotate drags follow up with the radial-nudge variant
/// when exact coincidence is wanted.
pub fn correction_by_rotation(origin: Point, moving: Point, anchor: Point) -> AffineTransform {
    let theta = angle_between_degrees(origin, moving, anchor);
    AffineTransform::rotation_about(origin, theta)
}

/// Rotation about `origin` followed by the radial translation that
/// lands the rotated `moving` exactly on `anchor`.
pub fn correction_by_rotation_with_nudge(
    origin: Point,
    moving: Point,
    anchor: Point,
) -> AffineTransform {
    let rotation = correction_by_rotation(origin, moving, anchor);
    let nudge = anchor - rotation.map_point(&moving);
    rotation.then(&AffineTransform::translation(nudge.x, nudge.y))
}

/// Uniform scale about `origin` stretching `moving` onto `anchor`.
///
/// Returns `None` when `moving` sits on `origin`, where no scale factor
/// exists; the caller keeps its previous transform.
pub fn correction_by_scaling(
    origin: Point,
    moving: Point,
    anchor: Point,
) -> Option<AffineTransform> {
    let from = (moving - origin).length();
    if from <= f64::EPSILON {
        return None;
    }
    let factor = (anchor - origin).length() / from;
    Some(AffineTransform::scale_about(origin, factor, factor))
}
