//! # TileKit5
//!
//! A drawing engine for magnetic tiles: rigid shapes from a catalog that
//! snap edge-to-edge while the user drags, rotates, scales or mirrors a
//! selection.
//!
//! ## Architecture
//!
//! TileKit5 is organized as a workspace with multiple crates:
//!
//! 1. **tilekit5-core** - Geometry, affine transforms, errors, events
//! 2. **tilekit5-settings** - Snap and view configuration with persistence
//! 3. **tilekit5-designer** - Tiles, snapping, drags, scenes, SVG documents
//! 4. **tilekit5** - Facade crate that re-exports the engine surface
//!
//! ## Features
//!
//! - **Shape Catalog**: Regular polygons, polygrams, tangrams, polyominoes,
//!   polyiamonds, Penrose prototiles, rulers and ellipses
//! - **Magnetic Snapping**: Budgeted nearest-vertex search with translation,
//!   rotation and scaling corrections
//! - **Interactive Transforms**: Quantized rotate and scale steps, mirror,
//!   sticky grab and drag cancel
//! - **Scene Events**: Subscribe to tile, selection and snap notifications
//! - **SVG Documents**: Scenes persist as plain SVG readable by any viewer

pub use tilekit5_designer as designer;
pub use tilekit5_settings as settings;

pub use tilekit5_core::{
    angle_between_degrees, direction_degrees, polygon_area, AffineTransform, Error, EventBus,
    EventCategory, EventFilter, Point, Result, SceneEvent, SubscriptionId,
    SvgError, TileError,
};

pub use tilekit5_settings::{Config, SettingsError, SnapSettings, ViewSettings};

pub use tilekit5_designer::{
    catalog, CatalogTile, Color, DragController, DragKind, PenroseShape, Selection, SvgDocument,
    Tile, TileGeometry, TileKind, TileScene, TileStore, Viewport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Human-readable version including the build date.
pub fn version_string() -> String {
    format!("{VERSION} (built {BUILD_DATE})")
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
