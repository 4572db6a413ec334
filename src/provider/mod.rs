//! Browser provider
//!
//! Front end for one browsable location. Every operation is turned into a
//! [`BrowserAction`] and queued on a single actor task which owns all dataset
//! and folder-cache mutations, so browses, refreshes and parsing passes never
//! interleave. Results flow into the injected [`DatasetSink`] and progress is
//! published on the event bus.

mod actor;
mod parser;

pub use parser::{describe, EMPTY_FOLDER};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{BrowserEvent, SharedBus};
use crate::catalog::{CatalogItem, StorageItem};
use crate::config::Config;
use crate::dataset::DatasetSink;
use crate::discovery::{BrowseFlags, DiscoveryBridge, DiscoverySource};
use crate::enricher::{CatalogEnricher, MediaLibrary};
use crate::prefetch::SharedPrefetch;

use actor::BrowserActor;
use parser::FolderContents;

/// Control actions processed by the actor, one at a time, in FIFO order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    /// Browse a location, or network shares when `None`
    Browse(Option<String>),
    /// Storage roots followed by network shares
    BrowseRoot,
    Refresh,
    ParseChildren,
    DetachListener,
    ShutDown,
}

/// Per-provider browse settings
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Location this provider shows; `None` is the root
    pub location: Option<String>,
    /// Flags for user-facing browses
    pub flags: BrowseFlags,
    pub show_all_files: bool,
    /// Storage roots listed on a root browse
    pub roots: Vec<StorageItem>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            location: None,
            flags: BrowseFlags::INTERACT,
            show_all_files: true,
            roots: Vec::new(),
        }
    }
}

impl ProviderOptions {
    pub fn new(location: Option<String>) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config, location: Option<String>) -> Self {
        let mut flags = BrowseFlags::INTERACT;
        if config.show_hidden_files {
            flags |= BrowseFlags::SHOW_HIDDEN_FILES;
        }
        Self {
            location,
            flags,
            show_all_files: config.show_all_files,
            roots: config.storage_roots(),
        }
    }
}

/// Collaborators injected into a provider
#[derive(Clone)]
pub struct ProviderContext {
    pub source: Arc<dyn DiscoverySource>,
    pub library: Option<Arc<dyn MediaLibrary>>,
    pub dataset: Arc<dyn DatasetSink>,
    pub prefetch: SharedPrefetch,
    pub bus: SharedBus,
}

/// State read by callers and written by the actor
pub(crate) struct ProviderShared {
    loading: AtomicBool,
    bus: SharedBus,
    folders: FolderContents,
    parse: Mutex<ParseState>,
}

/// Cancellation of parsing passes
struct ParseState {
    /// Child of the provider token, replaced at the start of every pass
    cancel: CancellationToken,
    running: bool,
    /// `stop()` arrived while no pass was running
    stop_pending: bool,
}

impl ProviderShared {
    fn new(bus: SharedBus) -> Self {
        Self {
            loading: AtomicBool::new(false),
            bus,
            folders: FolderContents::default(),
            parse: Mutex::new(ParseState {
                cancel: CancellationToken::new(),
                running: false,
                stop_pending: false,
            }),
        }
    }

    fn parse_state(&self) -> MutexGuard<'_, ParseState> {
        self.parse.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        if self.loading.swap(loading, Ordering::SeqCst) != loading {
            self.bus.publish(BrowserEvent::LoadingChanged { loading });
        }
    }

    /// Token for a new parsing pass. Already cancelled when a stop is pending.
    pub(crate) fn begin_parse(&self, shutdown: &CancellationToken) -> CancellationToken {
        let token = shutdown.child_token();
        let mut state = self.parse_state();
        if std::mem::take(&mut state.stop_pending) {
            token.cancel();
        }
        state.cancel = token.clone();
        state.running = true;
        token
    }

    pub(crate) fn end_parse(&self) {
        self.parse_state().running = false;
    }

    /// A new listing supersedes a stop that no pass has consumed yet
    pub(crate) fn clear_pending_stop(&self) {
        self.parse_state().stop_pending = false;
    }

    fn cancel_parse(&self) {
        let mut state = self.parse_state();
        if state.running {
            state.cancel.cancel();
        } else {
            state.stop_pending = true;
        }
    }
}

pub struct BrowserProvider {
    location: Option<String>,
    tx: mpsc::UnboundedSender<BrowserAction>,
    shutdown: CancellationToken,
    bridge: Arc<DiscoveryBridge>,
    shared: Arc<ProviderShared>,
    prefetch: SharedPrefetch,
    bus: SharedBus,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BrowserProvider {
    /// Start the actor task. Must be called within a tokio runtime.
    pub fn spawn(options: ProviderOptions, ctx: ProviderContext) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let bridge = Arc::new(DiscoveryBridge::new(ctx.source));
        let shared = Arc::new(ProviderShared::new(ctx.bus.clone()));
        let location = options.location.clone();

        let actor = BrowserActor {
            enricher: CatalogEnricher::new(ctx.library, options.show_all_files),
            options,
            bridge: bridge.clone(),
            dataset: ctx.dataset,
            prefetch: ctx.prefetch.clone(),
            bus: ctx.bus.clone(),
            shared: shared.clone(),
            shutdown: shutdown.clone(),
            mailbox: tx.downgrade(),
        };
        let handle = tokio::spawn(actor.run(rx));

        info!(
            "BrowserProvider: started for {}",
            location.as_deref().unwrap_or("<root>")
        );

        Self {
            location,
            tx,
            shutdown,
            bridge,
            shared,
            prefetch: ctx.prefetch,
            bus: ctx.bus,
            handle: Mutex::new(Some(handle)),
        }
    }

    fn submit(&self, action: BrowserAction) {
        if self.tx.send(action).is_err() {
            debug!("BrowserProvider: actor stopped, action dropped");
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Populate the dataset for this provider's location
    pub fn fetch(&self) {
        match &self.location {
            None => self.browse_root(),
            Some(location) => self.browse(Some(location.clone())),
        }
    }

    /// Browse `location`, or network shares when `None`
    pub fn browse(&self, location: Option<String>) {
        if self.is_released() {
            return;
        }
        self.shared.set_loading(true);
        self.submit(BrowserAction::Browse(location));
    }

    pub fn browse_root(&self) {
        if self.is_released() {
            return;
        }
        self.shared.set_loading(true);
        self.submit(BrowserAction::BrowseRoot);
    }

    /// Re-list the current location, replacing the dataset.
    ///
    /// Returns false when the provider has no location. A released provider
    /// with a location still returns true; the request is dropped.
    pub fn refresh(&self) -> bool {
        if self.location.is_none() {
            return false;
        }
        if self.is_released() {
            return true;
        }
        self.shared.set_loading(true);
        self.submit(BrowserAction::Refresh);
        true
    }

    pub fn parse_children(&self) {
        self.submit(BrowserAction::ParseChildren);
    }

    /// Abort the running parsing pass and close the current stream.
    ///
    /// With no pass running, the next pass to start is abandoned instead,
    /// unless a browse or refresh starts first.
    pub fn stop(&self) {
        debug!("BrowserProvider: stop requested");
        self.shared.cancel_parse();
        self.bridge.close_session();
    }

    pub fn detach_listener(&self) {
        self.submit(BrowserAction::DetachListener);
    }

    /// Tear the provider down; idempotent
    pub fn release(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        info!("BrowserProvider: releasing");
        self.shutdown.cancel();
        self.bridge.close_session();
        self.submit(BrowserAction::ShutDown);
        self.shared.set_loading(false);
    }

    /// Wait until the actor has shut down
    pub async fn closed(&self) {
        let handle = {
            let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("BrowserProvider: actor task failed: {}", e);
            }
        }
    }

    /// Copy the parsed children of `item` into the prefetch cache.
    /// Returns false when nothing was parsed for it.
    pub fn save_children(&self, item: &CatalogItem) -> bool {
        match self.shared.folders.get(item.location()) {
            Some(children) if !children.is_empty() => {
                debug!(
                    "BrowserProvider: prefetching {} children of {}",
                    children.len(),
                    item.location()
                );
                self.prefetch.insert(item.location(), children);
                true
            }
            _ => false,
        }
    }

    /// True when the last parsing pass found no children for `item`
    pub fn is_empty(&self, item: &CatalogItem) -> bool {
        self.shared.folders.is_empty_for(item.location())
    }

    /// Children found for `location` by the last parsing pass
    pub fn folder_contents(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.shared.folders.get(location)
    }

    pub fn get_cached_children(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.prefetch.get(location)
    }

    pub fn remove_cached_children(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.prefetch.remove(location)
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }
}

impl Drop for BrowserProvider {
    fn drop(&mut self) {
        self.release();
    }
}
