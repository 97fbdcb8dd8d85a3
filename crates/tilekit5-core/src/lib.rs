//! # TileKit5 Core
//!
//! Core types and utilities for TileKit5.
//! Provides the geometric primitives, affine transforms, error types and
//! the scene event bus shared by the engine crates.

pub mod error;
pub mod events;
pub mod geometry;
pub mod transform;

pub use error::{Error, Result, SvgError, TileError};

pub use events::{EventBus, EventCategory, EventFilter, SceneEvent, SubscriptionId};

pub use geometry::{
    angle_between_degrees, direction_degrees, polygon_area, rotate_point, Point,
};

pub use transform::AffineTransform;
