//! Subdirectory parsing
//!
//! After a listing settles, each folder-like entry is sub-browsed in turn to
//! count its children. The counts become the entry's description and the
//! children are kept so a later navigation can be served without discovery.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::actor::BrowserActor;
use crate::bus::BrowserEvent;
use crate::catalog::CatalogItem;
use crate::discovery::BrowseFlags;

/// Description of a folder with no children
pub const EMPTY_FOLDER: &str = "Empty folder";

/// Summary line for a folder: "2 subfolders, 1 file"
pub fn describe(folders: usize, files: usize) -> String {
    let mut parts = Vec::with_capacity(2);
    match folders {
        0 => {}
        1 => parts.push("1 subfolder".to_string()),
        n => parts.push(format!("{} subfolders", n)),
    }
    match files {
        0 => {}
        1 => parts.push("1 file".to_string()),
        n => parts.push(format!("{} files", n)),
    }
    if parts.is_empty() {
        EMPTY_FOLDER.to_string()
    } else {
        parts.join(", ")
    }
}

/// Children found per parent location during the last parsing pass
#[derive(Default)]
pub(crate) struct FolderContents {
    entries: Mutex<HashMap<String, Vec<CatalogItem>>>,
}

impl FolderContents {
    pub(crate) fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn insert(&self, location: String, children: Vec<CatalogItem>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(location, children);
    }

    pub(crate) fn get(&self, location: &str) -> Option<Vec<CatalogItem>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .cloned()
    }

    pub(crate) fn is_empty_for(&self, location: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .map_or(true, Vec::is_empty)
    }
}

impl BrowserActor {
    pub(super) async fn parse_children(&mut self) {
        let cancel = self.shared.begin_parse(&self.shutdown);
        if let Some(parsed) = self.parse_pass(&cancel).await {
            debug!("BrowserActor: parsed {} entries", parsed);
            self.bus.publish(BrowserEvent::ChildrenParsed { parsed });
        }
        self.shared.end_parse();
    }

    /// Describe and cache every parsable entry. `None` when `cancel` fired
    /// before the pass finished.
    async fn parse_pass(&self, cancel: &CancellationToken) -> Option<usize> {
        let entries = self.dataset.snapshot();
        self.shared.folders.clear();

        let mut parsed = 0usize;
        for (index, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                self.bridge.close_session();
                debug!("BrowserActor: parsing abandoned at entry {}", index);
                return None;
            }
            let Some(location) = entry.parsable_location() else {
                continue;
            };

            let mut session = self.bridge.open_session();
            // Nested browses never prompt the user
            self.bridge
                .start_discovery(&session, Some(location), BrowseFlags::empty());

            let mut directories = Vec::new();
            let mut files = Vec::new();
            while let Some(child) = self.next_entry(&mut session, cancel).await {
                if child.is_directory() {
                    directories.push(child);
                } else {
                    files.push(child);
                }
            }
            if cancel.is_cancelled() {
                self.bridge.close_session();
                debug!("BrowserActor: parsing of {} abandoned", location);
                return None;
            }

            let description = describe(directories.len(), files.len());
            if self.dataset.set_description(index, &description) {
                self.bus
                    .publish(BrowserEvent::DescriptionUpdated { index, description });
            }
            if !directories.is_empty() || !files.is_empty() {
                directories.append(&mut files);
                self.shared.folders.insert(location.to_string(), directories);
            }
            parsed += 1;
        }
        Some(parsed)
    }
}
