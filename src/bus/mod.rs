//! Event bus for browser observers
//!
//! Uses tokio::sync::broadcast for pub/sub pattern.
//! The UI subscribes to learn about dataset mutations, loading state and
//! folder descriptions computed by the subdirectory parser.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event types that can be published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BrowserEvent {
    // Provider state
    LoadingChanged { loading: bool },
    ProviderReleased,

    // Dataset mutations
    ItemAppended { index: usize, location: String },
    DatasetReplaced { len: usize },
    DatasetCleared,

    // Subdirectory parsing
    DescriptionUpdated { index: usize, description: String },
    ChildrenParsed { parsed: usize },
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BrowserEvent>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BrowserEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events
    pub fn subscribe(&self) -> broadcast::Receiver<BrowserEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    /// Default capacity (1024 events): a large folder appends one event per entry
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Shared event bus wrapped in Arc for thread-safe sharing
pub type SharedBus = Arc<EventBus>;

/// Create a new shared event bus
pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}
