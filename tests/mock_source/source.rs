//! Scripted discovery source

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use media_browser::catalog::RawMedia;
use media_browser::discovery::{BrowseFlags, DiscoveryListener, DiscoverySource};
use media_browser::error::DiscoveryError;

/// Discovery source answering from canned listings.
///
/// Unknown locations list as empty. Held locations report their items but
/// never signal the end of the browse; the listener they were started with
/// stays available so tests can fire late callbacks.
#[derive(Default)]
pub struct ScriptedSource {
    listener: Mutex<Option<Arc<dyn DiscoveryListener>>>,
    listings: Mutex<HashMap<String, Vec<RawMedia>>>,
    shares: Mutex<Vec<RawMedia>>,
    held: Mutex<HashSet<String>>,
    held_listeners: Mutex<HashMap<String, Arc<dyn DiscoveryListener>>>,
    calls: Mutex<Vec<(String, BrowseFlags)>>,
    released: AtomicBool,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_listing(&self, location: &str, items: Vec<RawMedia>) {
        self.listings
            .lock()
            .unwrap()
            .insert(location.to_string(), items);
    }

    pub fn set_shares(&self, items: Vec<RawMedia>) {
        *self.shares.lock().unwrap() = items;
    }

    pub fn hold(&self, location: &str) {
        self.held.lock().unwrap().insert(location.to_string());
    }

    /// Listener a held browse of `location` was started with
    pub fn held_listener(&self, location: &str) -> Option<Arc<dyn DiscoveryListener>> {
        self.held_listeners.lock().unwrap().get(location).cloned()
    }

    /// Locations browsed so far, in call order (network share scans excluded)
    pub fn browsed(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(location, _)| location.clone())
            .collect()
    }

    pub fn browse_count(&self, location: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == location)
            .count()
    }

    pub fn flags_for(&self, location: &str) -> Vec<BrowseFlags> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == location)
            .map(|(_, flags)| *flags)
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn listener(&self) -> Result<Arc<dyn DiscoveryListener>, DiscoveryError> {
        if self.is_released() {
            return Err(DiscoveryError::Released);
        }
        self.listener
            .lock()
            .unwrap()
            .clone()
            .ok_or(DiscoveryError::NoListener)
    }

    fn report(listener: Arc<dyn DiscoveryListener>, items: Vec<RawMedia>, end: bool) {
        std::thread::spawn(move || {
            for (index, media) in items.into_iter().enumerate() {
                listener.on_media_added(index, media);
            }
            if end {
                listener.on_browse_end();
            }
        });
    }
}

impl DiscoverySource for ScriptedSource {
    fn set_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>) {
        *self.listener.lock().unwrap() = listener;
    }

    fn browse(&self, location: &str, flags: BrowseFlags) -> Result<(), DiscoveryError> {
        let listener = self.listener()?;
        self.calls
            .lock()
            .unwrap()
            .push((location.to_string(), flags));

        let items = self
            .listings
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .unwrap_or_default();
        let held = self.held.lock().unwrap().contains(location);
        if held {
            self.held_listeners
                .lock()
                .unwrap()
                .insert(location.to_string(), listener.clone());
        }
        Self::report(listener, items, !held);
        Ok(())
    }

    fn discover_network_shares(&self) -> Result<(), DiscoveryError> {
        let listener = self.listener()?;
        let shares = self.shares.lock().unwrap().clone();
        Self::report(listener, shares, true);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        *self.listener.lock().unwrap() = None;
    }
}
