//! Error handling for TileKit5
//!
//! Provides error types for the engine layers:
//! - Tile errors (catalog/polyform construction)
//! - Svg errors (document read/write)
//!
//! All error types use `thiserror` for ergonomic error handling. The
//! interactive drag/snap paths never return errors; anything degenerate
//! there (a singular transform, an empty selection) degrades to a no-op
//! instead.

use thiserror::Error;

/// Tile construction error type
///
/// Represents errors raised by the shape catalog and polyform builders.
#[derive(Error, Debug, Clone)]
pub enum TileError {
    /// Boundary segments do not form a closed loop
    #[error("Cannot chain {remaining} of {total} boundary segments into a loop")]
    UnchainableSegments {
        /// Segments left over after chaining stopped.
        remaining: usize,
        /// Total segments supplied.
        total: usize,
    },

    /// Polyform pattern contains no cells
    #[error("Polyform pattern is empty")]
    EmptyPattern,

    /// Catalog parameters are out of range
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        param: String,
        /// The reason the parameter is invalid.
        reason: String,
    },

    /// Unknown catalog identity during deserialization
    #[error("Unknown tile kind: {kind}")]
    UnknownKind {
        /// The unrecognized kind identifier.
        kind: String,
    },
}

/// SVG document error type
///
/// Represents errors reading or writing the tile document format.
#[derive(Error, Debug, Clone)]
pub enum SvgError {
    /// Document is not an SVG
    #[error("Not an SVG document: missing <svg> element")]
    NotSvg,

    /// Malformed attribute value
    #[error("Malformed attribute '{attr}': {value}")]
    MalformedAttribute {
        /// The attribute name.
        attr: String,
        /// The offending value.
        value: String,
    },

    /// Element missing required geometry
    #[error("Element <{element}> has no usable geometry")]
    MissingGeometry {
        /// The element tag name.
        element: String,
    },
}

/// Main error type for TileKit5
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Tile construction error
    #[error(transparent)]
    Tile(#[from] TileError),

    /// SVG document error
    #[error(transparent)]
    Svg(#[from] SvgError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a tile construction error
    pub fn is_tile_error(&self) -> bool {
        matches!(self, Error::Tile(_))
    }

    /// Check if this is an SVG document error
    pub fn is_svg_error(&self) -> bool {
        matches!(self, Error::Svg(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
