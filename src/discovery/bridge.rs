//! Callback-to-stream bridge
//!
//! The source calls the installed listener from its own thread. Each listener
//! carries the generation of the session it was installed for; the slot holds
//! the current generation and the sender of the current session's channel.
//! Checking the generation and sending happen under the same lock, so a late
//! callback can never write into a replaced or closed stream.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::{BrowseFlags, DiscoveryListener, DiscoverySource};
use crate::catalog::RawMedia;

struct SlotState {
    generation: u64,
    tx: Option<mpsc::UnboundedSender<RawMedia>>,
}

/// The only state shared with the source's callback thread
struct SessionSlot {
    state: Mutex<SlotState>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                generation: 0,
                tx: None,
            }),
        }
    }

    fn deliver(&self, generation: u64, media: RawMedia) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            trace!(
                "DiscoveryBridge: dropping stale item {} (generation {} != {})",
                media.uri,
                generation,
                state.generation
            );
            return;
        }
        match &state.tx {
            Some(tx) => {
                if tx.send(media).is_err() {
                    trace!("DiscoveryBridge: session {} receiver gone", generation);
                }
            }
            None => trace!("DiscoveryBridge: session {} already closed", generation),
        }
    }

    fn finish(&self, generation: u64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == generation {
            state.tx = None;
        }
    }

    fn open(&self) -> Session {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        // Replacing the sender closes the previous session's stream
        state.tx = Some(tx);
        Session {
            generation: state.generation,
            rx,
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        state.tx = None;
    }

    fn generation(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }
}

/// One in-flight browse: the receiving end of the current stream
pub struct Session {
    generation: u64,
    rx: mpsc::UnboundedReceiver<RawMedia>,
}

impl Session {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next discovered item, or `None` once the browse ended or the session
    /// was closed or replaced
    pub async fn recv(&mut self) -> Option<RawMedia> {
        self.rx.recv().await
    }
}

/// Listener installed on the source for a single session
struct SessionListener {
    generation: u64,
    slot: Weak<SessionSlot>,
}

impl DiscoveryListener for SessionListener {
    fn on_media_added(&self, _index: usize, media: RawMedia) {
        if let Some(slot) = self.slot.upgrade() {
            slot.deliver(self.generation, media);
        }
    }

    fn on_browse_end(&self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.finish(self.generation);
        }
    }
}

/// Owns a discovery source and the session slot it writes into
pub struct DiscoveryBridge {
    source: Arc<dyn DiscoverySource>,
    slot: Arc<SessionSlot>,
}

impl DiscoveryBridge {
    pub fn new(source: Arc<dyn DiscoverySource>) -> Self {
        Self {
            source,
            slot: Arc::new(SessionSlot::new()),
        }
    }

    /// Start a new session, invalidating every earlier one
    pub fn open_session(&self) -> Session {
        let session = self.slot.open();
        debug!("DiscoveryBridge: opened session {}", session.generation);
        session
    }

    /// Point the source at `location` (or network shares when `None`) with a
    /// listener tagged for `session`
    pub fn start_discovery(&self, session: &Session, location: Option<&str>, flags: BrowseFlags) {
        let listener = Arc::new(SessionListener {
            generation: session.generation,
            slot: Arc::downgrade(&self.slot),
        });
        self.source.set_listener(Some(listener));

        let result = match location {
            Some(location) => self.source.browse(location, flags),
            None => self.source.discover_network_shares(),
        };
        if let Err(e) = result {
            warn!(
                "DiscoveryBridge: discovery of {} failed to start: {}",
                location.unwrap_or("<root>"),
                e
            );
            self.slot.finish(session.generation);
        }
    }

    /// Close the current stream; late callbacks for it are dropped
    pub fn close_session(&self) {
        self.slot.close();
        debug!(
            "DiscoveryBridge: closed session (now generation {})",
            self.slot.generation()
        );
    }

    pub fn detach_listener(&self) {
        self.source.set_listener(None);
    }

    /// Close the stream and release the source
    pub fn release(&self) {
        self.close_session();
        self.source.set_listener(None);
        self.source.release();
    }

    pub fn current_generation(&self) -> u64 {
        self.slot.generation()
    }
}
