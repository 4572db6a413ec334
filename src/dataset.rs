//! Dataset sink: the ordered, observable list the UI binds to

use std::sync::{PoisonError, RwLock};

use crate::bus::{BrowserEvent, SharedBus};
use crate::catalog::CatalogItem;

/// Ordered destination for browse results.
///
/// Only the provider's actor mutates it; any thread may read.
pub trait DatasetSink: Send + Sync {
    fn append(&self, item: CatalogItem);
    fn replace_all(&self, items: Vec<CatalogItem>);
    /// Clear and notify, even when already empty
    fn clear(&self);
    fn snapshot(&self) -> Vec<CatalogItem>;
    /// Set the description of the entry at `index` without a structural
    /// change. Returns false when the index is out of range.
    fn set_description(&self, index: usize, description: &str) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory dataset publishing its mutations on the event bus
pub struct LiveDataset {
    items: RwLock<Vec<CatalogItem>>,
    bus: SharedBus,
}

impl LiveDataset {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            bus,
        }
    }

    pub fn get(&self, index: usize) -> Option<CatalogItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }
}

impl DatasetSink for LiveDataset {
    fn append(&self, item: CatalogItem) {
        let location = item.location().to_string();
        let index = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            items.push(item);
            items.len() - 1
        };
        self.bus
            .publish(BrowserEvent::ItemAppended { index, location });
    }

    fn replace_all(&self, new_items: Vec<CatalogItem>) {
        let len = new_items.len();
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = new_items;
        self.bus.publish(BrowserEvent::DatasetReplaced { len });
    }

    fn clear(&self) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.bus.publish(BrowserEvent::DatasetCleared);
    }

    fn snapshot(&self) -> Vec<CatalogItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_description(&self, index: usize, description: &str) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.get_mut(index) {
            Some(item) => {
                item.set_description(description);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::create_bus;
    use crate::catalog::{MediaItem, MediaType};

    fn item(uri: &str) -> CatalogItem {
        MediaItem::new(uri, MediaType::Directory).into()
    }

    #[tokio::test]
    async fn test_append_publishes_index() {
        let bus = create_bus();
        let mut rx = bus.subscribe();
        let dataset = LiveDataset::new(bus);

        dataset.append(item("file:///a"));
        dataset.append(item("file:///b"));

        assert_eq!(
            rx.recv().await.unwrap(),
            BrowserEvent::ItemAppended {
                index: 0,
                location: "file:///a".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            BrowserEvent::ItemAppended {
                index: 1,
                location: "file:///b".to_string()
            }
        );
        assert_eq!(dataset.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_always_notifies() {
        let bus = create_bus();
        let mut rx = bus.subscribe();
        let dataset = LiveDataset::new(bus);

        dataset.clear();
        assert_eq!(rx.recv().await.unwrap(), BrowserEvent::DatasetCleared);
        assert!(dataset.is_empty());
    }

    #[tokio::test]
    async fn test_set_description_is_not_structural() {
        let bus = create_bus();
        let dataset = LiveDataset::new(bus.clone());
        dataset.replace_all(vec![item("file:///a"), item("file:///b")]);

        let mut rx = bus.subscribe();
        assert!(dataset.set_description(1, "2 files"));
        assert!(!dataset.set_description(5, "nope"));

        assert_eq!(dataset.get(1).unwrap().description(), Some("2 files"));
        assert_eq!(dataset.len(), 2);
        assert!(rx.try_recv().is_err());
    }
}
