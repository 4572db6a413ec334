//! Local filesystem discovery
//!
//! Lists `file://` directories on a short-lived worker thread and reports the
//! entries through the installed listener, directories first, then by name.
//! There are no network shares to discover locally.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use url::Url;

use crate::catalog::RawMedia;
use crate::discovery::{BrowseFlags, DiscoveryListener, DiscoverySource};
use crate::error::DiscoveryError;

#[derive(Default)]
pub struct LocalDirectorySource {
    listener: Mutex<Option<Arc<dyn DiscoveryListener>>>,
    released: Arc<AtomicBool>,
}

impl LocalDirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_listener(&self) -> Result<Arc<dyn DiscoveryListener>, DiscoveryError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Released);
        }
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DiscoveryError::NoListener)
    }
}

struct Entry {
    path: PathBuf,
    name: String,
    is_dir: bool,
}

/// Visible entries of `dir`, directories first, then case-insensitively by name
fn list_directory(dir: &Path, show_hidden: bool) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("LocalDirectorySource: skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        entries.push(Entry {
            is_dir: path.is_dir(),
            path,
            name,
        });
    }
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(entries)
}

impl DiscoverySource for LocalDirectorySource {
    fn set_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = listener;
    }

    fn browse(&self, location: &str, flags: BrowseFlags) -> Result<(), DiscoveryError> {
        let listener = self.current_listener()?;

        let url = Url::parse(location)
            .map_err(|_| DiscoveryError::InvalidLocation(location.to_string()))?;
        if url.scheme() != "file" {
            return Err(DiscoveryError::InvalidLocation(location.to_string()));
        }
        let dir = url
            .to_file_path()
            .map_err(|_| DiscoveryError::InvalidLocation(location.to_string()))?;
        if !dir.is_dir() {
            return Err(DiscoveryError::InvalidLocation(location.to_string()));
        }

        let show_hidden = flags.contains(BrowseFlags::SHOW_HIDDEN_FILES);
        let released = self.released.clone();
        std::thread::Builder::new()
            .name("local-discovery".to_string())
            .spawn(move || {
                match list_directory(&dir, show_hidden) {
                    Ok(entries) => {
                        for (index, entry) in entries.into_iter().enumerate() {
                            if released.load(Ordering::SeqCst) {
                                break;
                            }
                            let Ok(uri) = Url::from_file_path(&entry.path) else {
                                continue;
                            };
                            let media = if entry.is_dir {
                                RawMedia::directory(uri.to_string())
                            } else {
                                RawMedia::file(uri.to_string())
                            };
                            listener.on_media_added(index, media.with_title(entry.name));
                        }
                    }
                    Err(e) => {
                        tracing::warn!("LocalDirectorySource: cannot list {}: {}", dir.display(), e);
                    }
                }
                listener.on_browse_end();
            })?;
        Ok(())
    }

    fn discover_network_shares(&self) -> Result<(), DiscoveryError> {
        let listener = self.current_listener()?;
        listener.on_browse_end();
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.set_listener(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    enum Callback {
        Added(RawMedia),
        End,
    }

    struct ChannelListener(Mutex<mpsc::Sender<Callback>>);

    impl DiscoveryListener for ChannelListener {
        fn on_media_added(&self, _index: usize, media: RawMedia) {
            self.0.lock().unwrap().send(Callback::Added(media)).unwrap();
        }

        fn on_browse_end(&self) {
            self.0.lock().unwrap().send(Callback::End).unwrap();
        }
    }

    fn collect(source: &LocalDirectorySource, location: &str, flags: BrowseFlags) -> Vec<RawMedia> {
        let (tx, rx) = mpsc::channel();
        source.set_listener(Some(Arc::new(ChannelListener(Mutex::new(tx)))));
        source.browse(location, flags).unwrap();

        let mut items = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                Callback::Added(media) => items.push(media),
                Callback::End => return items,
            }
        }
    }

    fn sample_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("A.flac"), b"").unwrap();
        std::fs::write(dir.path().join(".hidden.mp3"), b"").unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("Alpha")).unwrap();
        dir
    }

    #[test]
    fn test_lists_directories_first() {
        let dir = sample_dir();
        let location = Url::from_directory_path(dir.path()).unwrap().to_string();
        let source = LocalDirectorySource::new();

        let items = collect(&source, &location, BrowseFlags::INTERACT);
        let titles: Vec<_> = items.iter().map(|m| m.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["Alpha", "zeta", "A.flac", "b.mp3"]);
        assert_eq!(items[0].kind, crate::catalog::EntryKind::Directory);
        assert_eq!(items[2].kind, crate::catalog::EntryKind::File);
        assert!(items[2].uri.starts_with("file:///"));
    }

    #[test]
    fn test_hidden_files_flag() {
        let dir = sample_dir();
        let location = Url::from_directory_path(dir.path()).unwrap().to_string();
        let source = LocalDirectorySource::new();

        let items = collect(
            &source,
            &location,
            BrowseFlags::INTERACT | BrowseFlags::SHOW_HIDDEN_FILES,
        );
        assert_eq!(items.len(), 5);
        assert!(items
            .iter()
            .any(|m| m.title.as_deref() == Some(".hidden.mp3")));
    }

    #[test]
    fn test_errors() {
        let source = LocalDirectorySource::new();
        assert!(matches!(
            source.browse("file:///tmp", BrowseFlags::empty()),
            Err(DiscoveryError::NoListener)
        ));

        let (tx, _rx) = mpsc::channel();
        source.set_listener(Some(Arc::new(ChannelListener(Mutex::new(tx)))));
        assert!(matches!(
            source.browse("smb://nas/share", BrowseFlags::empty()),
            Err(DiscoveryError::InvalidLocation(_))
        ));
        assert!(matches!(
            source.browse("file:///definitely/not/here", BrowseFlags::empty()),
            Err(DiscoveryError::InvalidLocation(_))
        ));

        source.release();
        assert!(matches!(
            source.discover_network_shares(),
            Err(DiscoveryError::Released)
        ));
    }

    #[test]
    fn test_no_network_shares() {
        let source = LocalDirectorySource::new();
        let (tx, rx) = mpsc::channel();
        source.set_listener(Some(Arc::new(ChannelListener(Mutex::new(tx)))));

        source.discover_network_shares().unwrap();
        assert!(matches!(rx.recv().unwrap(), Callback::End));
    }
}
