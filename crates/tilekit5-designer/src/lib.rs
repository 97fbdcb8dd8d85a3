//! # TileKit5 Designer
//!
//! The drawing engine for magnetic tiles: a scene of rigid shapes that
//! snap edge-to-edge while being dragged, rotated, scaled or mirrored.
//!
//! ## Core Components
//!
//! ### Shapes
//! - **Catalog**: Regular polygons, polygrams, tangrams, polyforms,
//!   Penrose prototiles, rulers and ellipses
//! - **Geometry**: Outline vertices double as snap points
//! - **Color**: RGB fills with HSV construction and a random palette
//!
//! ### Interaction
//! - **Selection**: A member set with one composite drag transform and a
//!   cached hit-test silhouette
//! - **Drag**: Translate/rotate/scale/pan state machine with quantized
//!   rotation steps and sticky grab
//! - **Snap**: Budgeted nearest-vertex search over the spatial index,
//!   with translation, rotation and scaling corrections
//!
//! ### Scene
//! - **TileScene**: Store, selection, drags, viewport and the event bus
//! - **SVG I/O**: Documents persist as plain SVG with tile identity in a
//!   proprietary attribute namespace
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tilekit5_designer::{catalog, TileScene};
//!
//! let mut scene = TileScene::new();
//! let hexagon = catalog::regular_polygon(6, 1.0)?;
//! scene.add_tile(catalog::polygon_tile(hexagon, Default::default()));
//! ```

pub mod catalog;
pub mod color;
pub mod drag;
pub mod polyform;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod snap;
pub mod spatial_index;
pub mod svg_io;
pub mod tile_store;
pub mod turtle;

pub use catalog::CatalogTile;
pub use color::{random_color, Color};
pub use drag::{DragController, DragKind, DragUpdate};
pub use scene::{TileScene, Viewport};
pub use selection::Selection;
pub use shapes::{
    EllipseGeometry, PenroseShape, PolygonGeometry, SnapPoints, Snappable, Tile, TileGeometry,
    TileKind, Transformable,
};
pub use snap::{nearest_snaps, SnapCandidate};
pub use spatial_index::{Bounds, IndexStats, SpatialIndex};
pub use svg_io::{load_document, read_document, save_document, write_document, SvgDocument};
pub use tile_store::TileStore;
pub use turtle::Turtle;
