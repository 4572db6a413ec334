//! Prefetch cache shared by providers
//!
//! Holds child lists saved from a parsing pass so that navigating into a
//! folder can skip discovery. Entries are evicted once consumed.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::CatalogItem;

#[derive(Default)]
pub struct PrefetchCache {
    entries: RwLock<HashMap<String, Vec<CatalogItem>>>,
}

pub type SharedPrefetch = Arc<PrefetchCache>;

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPrefetch {
        Arc::new(Self::new())
    }

    pub fn get(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .cloned()
    }

    pub fn insert(&self, location: impl Into<String>, children: Vec<CatalogItem>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(location.into(), children);
    }

    pub fn remove(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(location)
    }

    /// Evict and return the entry for `location` if it holds any children.
    /// Empty entries are left untouched.
    pub fn take_non_empty(&self, location: &str) -> Option<Vec<CatalogItem>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(location) {
            Some(children) if !children.is_empty() => entries.remove(location),
            _ => None,
        }
    }

    pub fn contains(&self, location: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
