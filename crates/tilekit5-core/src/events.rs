//! Scene event bus.
//!
//! Provides a synchronous publish/subscribe bus for scene notifications
//! (tile mutation, selection changes, snap hits). Handlers run on the
//! publishing thread; the engine is single-threaded and event-driven, so
//! dispatch never crosses a thread boundary.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::geometry::Point;

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Root event enum for scene notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SceneEvent {
    /// A tile was added to the scene.
    TileAdded {
        /// Id of the added tile.
        id: u64,
    },
    /// A tile was removed from the scene.
    TileRemoved {
        /// Id of the removed tile.
        id: u64,
    },
    /// Tile geometry or transforms changed (e.g. a drag committed).
    TileChanged,
    /// The selection membership changed.
    SelectionChanged {
        /// Number of tiles now selected.
        count: usize,
    },
    /// A snap pair was resolved during a drag.
    Snapped {
        /// Snap point on the dragged selection, scene coordinates.
        moving: Point,
        /// Matching point on the stationary tile, scene coordinates.
        anchor: Point,
    },
}

impl SceneEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            SceneEvent::TileAdded { .. }
            | SceneEvent::TileRemoved { .. }
            | SceneEvent::TileChanged => EventCategory::Tiles,
            SceneEvent::SelectionChanged { .. } => EventCategory::Selection,
            SceneEvent::Snapped { .. } => EventCategory::Snap,
        }
    }
}

impl std::fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneEvent::TileAdded { id } => write!(f, "Tile {} added", id),
            SceneEvent::TileRemoved { id } => write!(f, "Tile {} removed", id),
            SceneEvent::TileChanged => write!(f, "Tiles changed"),
            SceneEvent::SelectionChanged { count } => write!(f, "Selection: {} tiles", count),
            SceneEvent::Snapped { moving, anchor } => write!(
                f,
                "Snapped ({:.3}, {:.3}) -> ({:.3}, {:.3})",
                moving.x, moving.y, anchor.x, anchor.y
            ),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Tile add/remove/change events.
    Tiles,
    /// Selection membership events.
    Selection,
    /// Snap resolution events.
    Snap,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Tiles => write!(f, "Tiles"),
            EventCategory::Selection => write!(f, "Selection"),
            EventCategory::Snap => write!(f, "Snap"),
        }
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &SceneEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

/// Type alias for event handler functions
type EventHandler = Box<dyn Fn(&SceneEvent) + Send + Sync>;

/// Synchronous event bus for scene notifications
#[derive(Clone, Default)]
pub struct EventBus {
    /// Registered handlers keyed by subscription id.
    handlers: Arc<RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>>,
}

impl EventBus {
    /// Create a new event bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to all matching handlers
    ///
    /// Returns the number of handlers invoked. Publishing with no
    /// subscribers is not an error.
    pub fn publish(&self, event: &SceneEvent) -> usize {
        let handlers = self.handlers.read();
        let mut invoked = 0;
        for (filter, handler) in handlers.values() {
            if filter.matches(event) {
                handler(event);
                invoked += 1;
            }
        }
        invoked
    }

    /// Subscribe to events with a synchronous handler
    ///
    /// The handler is called on the publishing thread, so it should return
    /// quickly to avoid blocking event dispatch.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&SceneEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
