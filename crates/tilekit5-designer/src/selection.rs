//! Selection container with a cached hit-test silhouette.
//!
//! The selection is a member set plus one composite transform that a
//! drag manipulates; member tiles keep their own transforms untouched
//! until the drag commits and the composite is baked into each of them.
//!
//! Hit testing goes through a silhouette cache holding each member's
//! geometry and inverse scene mapping. The cache is invalidated only
//! when membership changes or transforms are baked, never while the
//! composite moves during a drag.

use std::collections::BTreeSet;

use tilekit5_core::{AffineTransform, Point};
use tracing::trace;

use crate::shapes::TileGeometry;
use crate::spatial_index::Bounds;
use crate::tile_store::TileStore;

#[derive(Debug)]
struct SilhouettePart {
    geometry: TileGeometry,
    from_scene: AffineTransform,
}

/// The set of selected tiles and their shared drag transform.
#[derive(Debug, Default)]
pub struct Selection {
    members: BTreeSet<u64>,
    composite: AffineTransform,
    silhouette: Option<Vec<SilhouettePart>>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selected tiles.
    pub fn selected_count(&self) -> usize {
        self.members.len()
    }

    /// Whether no tile is selected.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the tile is a member.
    pub fn contains(&self, id: u64) -> bool {
        self.members.contains(&id)
    }

    /// Member ids in ascending order.
    pub fn ids(&self) -> Vec<u64> {
        self.members.iter().copied().collect()
    }

    /// The composite transform the current drag has built up.
    pub fn composite(&self) -> &AffineTransform {
        &self.composite
    }

    /// Replaces the composite transform.
    ///
    /// The silhouette cache survives; it stores pre-composite scene
    /// mappings and hit tests apply the composite on top.
    pub fn set_composite(&mut self, composite: AffineTransform) {
        self.composite = composite;
    }

    /// Resets the composite to identity.
    pub fn reset_composite(&mut self) {
        self.composite = AffineTransform::identity();
    }

    fn invalidate_silhouette(&mut self) {
        self.silhouette = None;
    }

    /// Adds a tile to the selection.
    ///
    /// Returns false when the id is unknown to the store.
    pub fn insert(&mut self, id: u64, store: &mut TileStore) -> bool {
        if !store.set_selected(id, true) {
            return false;
        }
        if self.members.insert(id) {
            self.invalidate_silhouette();
        }
        true
    }

    /// Removes a tile from the selection.
    ///
    /// Returns whether the tile was a member.
    pub fn remove(&mut self, id: u64, store: &mut TileStore) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        store.set_selected(id, false);
        self.invalidate_silhouette();
        if self.members.is_empty() {
            self.reset_composite();
        }
        true
    }

    /// Toggles a tile's membership, returning whether it is now selected.
    pub fn toggle(&mut self, id: u64, store: &mut TileStore) -> bool {
        if self.contains(id) {
            self.remove(id, store);
            false
        } else {
            self.insert(id, store)
        }
    }

    /// Selects every tile in the store.
    pub fn select_all(&mut self, store: &mut TileStore) {
        for id in store.draw_order().to_vec() {
            self.insert(id, store);
        }
    }

    /// Deselects everything and resets the composite.
    pub fn clear(&mut self, store: &mut TileStore) {
        for id in &self.members {
            store.set_selected(*id, false);
        }
        self.members.clear();
        self.reset_composite();
        self.invalidate_silhouette();
    }

    /// Forgets a tile that was removed from the store.
    ///
    /// Unlike [`Selection::remove`] this does not touch the store.
    pub fn forget(&mut self, id: u64) {
        if self.members.remove(&id) {
            self.invalidate_silhouette();
            if self.members.is_empty() {
                self.reset_composite();
            }
        }
    }

    /// Bakes the composite into every member's own transform.
    ///
    /// Afterwards the composite is identity and member tiles sit where
    /// the drag left them. The silhouette is rebuilt on next use since
    /// the members' scene mappings changed.
    pub fn bake_composite(&mut self, store: &mut TileStore) {
        if self.composite.is_identity(1e-12) {
            return;
        }
        trace!(members = self.members.len(), "baking selection transform");
        for id in &self.members {
            store.apply_transform(*id, &self.composite);
        }
        self.reset_composite();
        self.invalidate_silhouette();
    }

    /// Scene bounding box of the selection with the composite applied.
    pub fn scene_bounding_box(&self, store: &TileStore) -> Option<Bounds> {
        self.members
            .iter()
            .filter_map(|id| {
                let b = store.get(*id)?.scene_bounding_box();
                let corners = [
                    Point::new(b.min_x, b.min_y),
                    Point::new(b.max_x, b.min_y),
                    Point::new(b.max_x, b.max_y),
                    Point::new(b.min_x, b.max_y),
                ];
                Some(Bounds::from_points(&self.composite.map_points(&corners)))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Center of the selection's scene box, the pivot for transforms.
    pub fn transform_center(&self, store: &TileStore) -> Option<Point> {
        self.scene_bounding_box(store).map(|b| b.center())
    }

    fn silhouette_parts(&mut self, store: &TileStore) -> &[SilhouettePart] {
        let members = &self.members;
        self.silhouette.get_or_insert_with(|| {
            members
                .iter()
                .filter_map(|id| {
                    let tile = store.get(*id)?;
                    let from_scene = tile.transform.invert()?;
                    Some(SilhouettePart {
                        geometry: tile.geometry.clone(),
                        from_scene,
                    })
                })
                .collect()
        })
    }

    /// Whether the scene point falls on any member tile.
    pub fn contains_scene_point(&mut self, p: Point, store: &TileStore) -> bool {
        let q = match self.composite.invert() {
            Some(inv) => inv.map_point(&p),
            None => return false,
        };
        self.silhouette_parts(store).iter().any(|part| {
            let local = part.from_scene.map_point(&q);
            part.geometry.contains_point(local)
        })
    }
}
