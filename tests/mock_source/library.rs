//! In-memory media library

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use media_browser::catalog::MediaItem;
use media_browser::enricher::MediaLibrary;

#[derive(Default)]
pub struct MemoryLibrary {
    entries: Mutex<HashMap<String, MediaItem>>,
    lookups: AtomicUsize,
}

impl MemoryLibrary {
    pub fn add(&self, item: MediaItem) {
        self.entries.lock().unwrap().insert(item.uri.clone(), item);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLibrary for MemoryLibrary {
    async fn lookup_by_uri(&self, uri: &str) -> anyhow::Result<Option<MediaItem>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(uri).cloned())
    }
}

/// Library whose lookups never complete
#[derive(Default)]
pub struct HangingLibrary {
    started: AtomicUsize,
}

impl HangingLibrary {
    /// Lookups entered so far
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLibrary for HangingLibrary {
    async fn lookup_by_uri(&self, _uri: &str) -> anyhow::Result<Option<MediaItem>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
