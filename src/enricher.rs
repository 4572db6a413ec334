//! Catalog enrichment: raw discovered items into displayable entries

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::catalog::{CatalogItem, MediaItem, RawMedia};

/// Media library lookup used to replace provisional entries with indexed ones
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn lookup_by_uri(&self, uri: &str) -> anyhow::Result<Option<MediaItem>>;
}

pub struct CatalogEnricher {
    library: Option<Arc<dyn MediaLibrary>>,
    show_all_files: bool,
}

impl CatalogEnricher {
    pub fn new(library: Option<Arc<dyn MediaLibrary>>, show_all_files: bool) -> Self {
        Self {
            library,
            show_all_files,
        }
    }

    /// Resolve a discovered item, or `None` when it is filtered out
    pub async fn resolve(&self, raw: RawMedia) -> Option<CatalogItem> {
        let provisional = MediaItem::from_raw(raw);

        if !provisional.is_media() {
            if provisional.is_browsable() || self.show_all_files {
                return Some(provisional.into());
            }
            trace!("CatalogEnricher: filtered {}", provisional.uri);
            return None;
        }

        if provisional.scheme().as_deref() != Some("file") {
            return Some(provisional.into());
        }
        let Some(library) = &self.library else {
            return Some(provisional.into());
        };

        match library.lookup_by_uri(&provisional.uri).await {
            Ok(Some(indexed)) => Some(indexed.into()),
            Ok(None) => Some(provisional.into()),
            Err(e) => {
                warn!(
                    "CatalogEnricher: library lookup failed for {}: {}",
                    provisional.uri,
                    e
                );
                Some(provisional.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLibrary {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl MediaLibrary for CountingLibrary {
        async fn lookup_by_uri(&self, uri: &str) -> anyhow::Result<Option<MediaItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("library offline");
            }
            if uri.ends_with("known.mp3") {
                let mut item = MediaItem::new(uri, MediaType::Audio);
                item.title = "Known Song".to_string();
                item.artist = Some("Artist".to_string());
                item.library_id = Some(42);
                return Ok(Some(item));
            }
            Ok(None)
        }
    }

    fn make_enricher(fail: bool, show_all_files: bool) -> (CatalogEnricher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let library = Arc::new(CountingLibrary {
            calls: calls.clone(),
            fail,
        });
        (CatalogEnricher::new(Some(library), show_all_files), calls)
    }

    #[tokio::test]
    async fn test_library_hit_replaces_provisional() {
        let (enricher, calls) = make_enricher(false, true);
        let item = enricher
            .resolve(RawMedia::file("file:///music/known.mp3"))
            .await
            .unwrap();

        match item {
            CatalogItem::Media(m) => {
                assert_eq!(m.title, "Known Song");
                assert_eq!(m.library_id, Some(42));
            }
            other => panic!("unexpected item {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_library_miss_and_failure_keep_provisional() {
        let (enricher, _) = make_enricher(false, true);
        let item = enricher
            .resolve(RawMedia::file("file:///music/unknown.mp3"))
            .await
            .unwrap();
        assert_eq!(item.title(), "unknown.mp3");

        let (enricher, calls) = make_enricher(true, true);
        let item = enricher
            .resolve(RawMedia::file("file:///music/known.mp3"))
            .await
            .unwrap();
        assert_eq!(item.title(), "known.mp3");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_only_local_media_is_looked_up() {
        let (enricher, calls) = make_enricher(false, true);

        enricher
            .resolve(RawMedia::file("smb://nas/music/known.mp3"))
            .await
            .unwrap();
        enricher
            .resolve(RawMedia::directory("file:///music"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_show_all_files_filter() {
        let (strict, _) = make_enricher(false, false);
        assert!(strict
            .resolve(RawMedia::file("file:///docs/readme.txt"))
            .await
            .is_none());
        assert!(strict
            .resolve(RawMedia::file("file:///music/list.m3u"))
            .await
            .is_some());

        let (lenient, _) = make_enricher(false, true);
        assert!(lenient
            .resolve(RawMedia::file("file:///docs/readme.txt"))
            .await
            .is_some());
    }
}
