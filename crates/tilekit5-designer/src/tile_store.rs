//! Tile storage with draw order and spatial lookups.
//!
//! The store owns every tile in a scene, assigns ids, and keeps the
//! quadtree index in sync with tile bounds. Draw order is insertion
//! order; hit testing walks it from the top so clicks land on the tile
//! painted last.
//!
//! Mutation goes through the store rather than through `&mut Tile` so
//! the index can never drift out of sync with a tile's bounds.

use std::collections::{BTreeMap, HashMap};

use tilekit5_core::{AffineTransform, Point};
use tracing::debug;

use crate::catalog::CatalogTile;
use crate::color::Color;
use crate::shapes::Tile;
use crate::spatial_index::{Bounds, SpatialIndex};

/// Owner of all tiles in a scene.
#[derive(Debug)]
pub struct TileStore {
    tiles: BTreeMap<u64, Tile>,
    draw_order: Vec<u64>,
    indexed_bounds: HashMap<u64, Bounds>,
    index: SpatialIndex,
    next_id: u64,
}

impl TileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
            draw_order: Vec::new(),
            indexed_bounds: HashMap::new(),
            index: SpatialIndex::default(),
            next_id: 1,
        }
    }

    /// Adds a catalog entry and returns its assigned id.
    pub fn add(&mut self, entry: CatalogTile) -> u64 {
        self.add_tile(entry.into_tile(0))
    }

    /// Adds a tile, overriding its id with a fresh one.
    pub fn add_tile(&mut self, mut tile: Tile) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        tile.id = id;
        let bounds = tile.scene_bounding_box();
        self.index.insert(id, &bounds);
        self.indexed_bounds.insert(id, bounds);
        self.draw_order.push(id);
        self.tiles.insert(id, tile);
        debug!(id, "tile added");
        id
    }

    /// Removes a tile, returning it if present.
    pub fn remove(&mut self, id: u64) -> Option<Tile> {
        let tile = self.tiles.remove(&id)?;
        self.draw_order.retain(|&other| other != id);
        if let Some(bounds) = self.indexed_bounds.remove(&id) {
            self.index.remove(id, &bounds);
        }
        debug!(id, "tile removed");
        Some(tile)
    }

    /// Removes every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.draw_order.clear();
        self.indexed_bounds.clear();
        self.index.clear();
    }

    /// Looks up a tile by id.
    pub fn get(&self, id: u64) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Number of tiles in the store.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the store holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile ids from bottom to top of the paint stack.
    pub fn draw_order(&self) -> &[u64] {
        &self.draw_order
    }

    /// Tiles from bottom to top of the paint stack.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.draw_order.iter().filter_map(|id| self.tiles.get(id))
    }

    /// Ids of selected tiles, bottom to top.
    pub fn selected_ids(&self) -> Vec<u64> {
        self.iter().filter(|t| t.selected).map(|t| t.id).collect()
    }

    fn reindex(&mut self, id: u64) {
        if let Some(tile) = self.tiles.get(&id) {
            let bounds = tile.scene_bounding_box();
            if let Some(old) = self.indexed_bounds.insert(id, bounds) {
                self.index.remove(id, &old);
            }
            self.index.insert(id, &bounds);
        }
    }

    /// Replaces a tile's transform, keeping the index in sync.
    ///
    /// Returns false when the id is unknown.
    pub fn set_transform(&mut self, id: u64, transform: AffineTransform) -> bool {
        match self.tiles.get_mut(&id) {
            Some(tile) => {
                tile.transform = transform;
                self.reindex(id);
                true
            }
            None => false,
        }
    }

    /// Post-composes a transform onto a tile, keeping the index in sync.
    pub fn apply_transform(&mut self, id: u64, next: &AffineTransform) -> bool {
        match self.tiles.get_mut(&id) {
            Some(tile) => {
                tile.transform = tile.transform.then(next);
                self.reindex(id);
                true
            }
            None => false,
        }
    }

    /// Sets a tile's fill color.
    pub fn set_fill(&mut self, id: u64, fill: Color) -> bool {
        match self.tiles.get_mut(&id) {
            Some(tile) => {
                tile.fill = fill;
                true
            }
            None => false,
        }
    }

    /// Sets a tile's selection flag.
    pub fn set_selected(&mut self, id: u64, selected: bool) -> bool {
        match self.tiles.get_mut(&id) {
            Some(tile) => {
                tile.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Ids of tiles whose scene boxes intersect `region`.
    pub fn tiles_in_region(&self, region: &Bounds) -> Vec<u64> {
        self.index.query(region)
    }

    /// The topmost tile containing the scene point, if any.
    pub fn top_tile_at(&self, p: Point) -> Option<u64> {
        let candidates = self.index.query_point(p.x, p.y);
        self.draw_order
            .iter()
            .rev()
            .find(|id| {
                candidates.contains(id)
                    && self
                        .tiles
                        .get(id)
                        .is_some_and(|t| t.contains_scene_point(p))
            })
            .copied()
    }

    /// Union of every tile's scene box, or `None` for an empty scene.
    pub fn scene_bounds(&self) -> Option<Bounds> {
        self.iter()
            .map(|t| t.scene_bounding_box())
            .reduce(|a, b| a.union(&b))
    }
}

impl Default for TileStore {
    fn default() -> Self {
        Self::new()
    }
}
