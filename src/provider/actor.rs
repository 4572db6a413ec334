use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{BrowserAction, ProviderOptions, ProviderShared};
use crate::bus::{BrowserEvent, SharedBus};
use crate::catalog::{CatalogItem, RawMedia};
use crate::dataset::DatasetSink;
use crate::discovery::{DiscoveryBridge, Session};
use crate::enricher::CatalogEnricher;
use crate::prefetch::SharedPrefetch;

/// Consumer of the provider's mailbox. Owns all dataset and folder-cache
/// mutations.
pub(super) struct BrowserActor {
    pub(super) options: ProviderOptions,
    pub(super) bridge: Arc<DiscoveryBridge>,
    pub(super) enricher: CatalogEnricher,
    pub(super) dataset: Arc<dyn DatasetSink>,
    pub(super) prefetch: SharedPrefetch,
    pub(super) bus: SharedBus,
    pub(super) shared: Arc<ProviderShared>,
    pub(super) shutdown: CancellationToken,
    /// For queueing follow-up actions; weak so dropping the provider closes
    /// the mailbox
    pub(super) mailbox: mpsc::WeakUnboundedSender<BrowserAction>,
}

impl BrowserActor {
    pub(super) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BrowserAction>) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("BrowserActor: cancelled");
                    break;
                }
                action = rx.recv() => match action {
                    Some(BrowserAction::ShutDown) => {
                        debug!("BrowserActor: shutdown requested");
                        break;
                    }
                    Some(action) => self.handle(action).await,
                    None => {
                        debug!("BrowserActor: provider dropped");
                        break;
                    }
                },
            }
        }

        // Stop accepting, then discard whatever is still queued
        rx.close();
        while let Ok(action) = rx.try_recv() {
            debug!("BrowserActor: discarding {:?}", action);
        }

        self.bridge.release();
        self.shared.set_loading(false);
        self.bus.publish(BrowserEvent::ProviderReleased);
        info!("BrowserActor: stopped");
    }

    async fn handle(&mut self, action: BrowserAction) {
        debug!("BrowserActor: {:?}", action);
        match action {
            BrowserAction::Browse(location) => self.browse(location).await,
            BrowserAction::BrowseRoot => self.browse_root().await,
            BrowserAction::Refresh => self.refresh().await,
            BrowserAction::ParseChildren => self.parse_children().await,
            BrowserAction::DetachListener => self.bridge.detach_listener(),
            BrowserAction::ShutDown => {}
        }
    }

    pub(super) fn submit(&self, action: BrowserAction) {
        let Some(tx) = self.mailbox.upgrade() else {
            debug!("BrowserActor: mailbox closed, {:?} dropped", action);
            return;
        };
        if tx.send(action).is_err() {
            debug!("BrowserActor: mailbox closed");
        }
    }

    /// Next item of `session`, or `None` at end of stream or once `cancel` fires
    pub(super) async fn next_item(
        session: &mut Session,
        cancel: &CancellationToken,
    ) -> Option<RawMedia> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = session.recv() => item,
        }
    }

    /// Next enriched entry of `session`. Entries the enricher filters out are
    /// skipped. `None` at end of stream or once `cancel` fires, including
    /// while a library lookup is still pending.
    pub(super) async fn next_entry(
        &self,
        session: &mut Session,
        cancel: &CancellationToken,
    ) -> Option<CatalogItem> {
        while let Some(raw) = Self::next_item(session, cancel).await {
            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                resolved = self.enricher.resolve(raw) => resolved,
            };
            if resolved.is_some() {
                return resolved;
            }
        }
        None
    }

    async fn browse(&mut self, location: Option<String>) {
        self.shared.clear_pending_stop();
        if let Some(location) = location.as_deref() {
            if let Some(children) = self.prefetch.take_non_empty(location) {
                debug!(
                    "BrowserActor: {} served from prefetch ({} items)",
                    location,
                    children.len()
                );
                self.dataset.replace_all(children);
                self.submit(BrowserAction::ParseChildren);
                self.shared.set_loading(false);
                return;
            }
        }

        self.shared.set_loading(true);
        let mut session = self.bridge.open_session();
        self.bridge
            .start_discovery(&session, location.as_deref(), self.options.flags);

        let mut appended = 0usize;
        while let Some(item) = self.next_entry(&mut session, &self.shutdown).await {
            self.dataset.append(item);
            appended += 1;
        }
        if self.shutdown.is_cancelled() {
            debug!("BrowserActor: browse abandoned after {} items", appended);
            return;
        }

        debug!(
            "BrowserActor: browse of {} done, {} items",
            location.as_deref().unwrap_or("<root>"),
            appended
        );
        if self.dataset.is_empty() {
            self.dataset.clear();
        } else {
            self.submit(BrowserAction::ParseChildren);
        }
        self.shared.set_loading(false);
    }

    async fn browse_root(&mut self) {
        for root in &self.options.roots {
            self.dataset.append(CatalogItem::Storage(root.clone()));
        }
        self.browse(None).await;
    }

    async fn refresh(&mut self) {
        let Some(location) = self.options.location.clone() else {
            self.shared.set_loading(false);
            return;
        };

        self.shared.clear_pending_stop();
        self.shared.set_loading(true);
        let mut session = self.bridge.open_session();
        self.bridge
            .start_discovery(&session, Some(&location), self.options.flags);

        let mut items = Vec::new();
        while let Some(item) = self.next_entry(&mut session, &self.shutdown).await {
            items.push(item);
        }
        if self.shutdown.is_cancelled() {
            debug!("BrowserActor: refresh abandoned");
            return;
        }

        debug!("BrowserActor: refresh of {} done, {} items", location, items.len());
        self.dataset.replace_all(items);
        self.submit(BrowserAction::ParseChildren);
        self.shared.set_loading(false);
    }
}
