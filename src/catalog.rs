//! Catalog entries produced by browsing
//!
//! A discovery source reports [`RawMedia`]: a URI, an optional title and a coarse
//! entry kind. The enricher wraps it into a [`MediaItem`] (the provisional entry),
//! which may later be replaced by a richer record from the media library.
//! Everything the dataset holds is a [`CatalogItem`].

use serde::{Deserialize, Serialize};
use url::Url;

/// URI schemes whose directories cannot be sub-browsed (device-attached and
/// content-provider locations)
pub const UNPARSABLE_SCHEMES: &[&str] = &["otg", "content"];

/// Extensions treated as playlists regardless of their MIME type
const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8", "pls", "xspf", "cue", "asx", "b4s", "wpl"];

/// Coarse kind reported by the discovery source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Directory,
    File,
    #[default]
    Unknown,
}

/// An item as reported by a discovery source, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMedia {
    pub uri: String,
    pub title: Option<String>,
    pub kind: EntryKind,
}

impl RawMedia {
    pub fn new(uri: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            kind,
        }
    }

    pub fn directory(uri: impl Into<String>) -> Self {
        Self::new(uri, EntryKind::Directory)
    }

    pub fn file(uri: impl Into<String>) -> Self {
        Self::new(uri, EntryKind::File)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Playback type of a media entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Audio,
    Video,
    Directory,
    Playlist,
    Other,
}

impl MediaType {
    /// Infer the type of a file from its URI (extension / MIME type)
    pub fn infer(uri: &str) -> Self {
        let path = match Url::parse(uri) {
            Ok(url) => url.path().to_string(),
            Err(_) => uri.to_string(),
        };
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        let Some(extension) = extension else {
            return Self::Other;
        };
        if PLAYLIST_EXTENSIONS.contains(&extension.as_str()) {
            return Self::Playlist;
        }

        match mime_guess::from_ext(&extension).first() {
            Some(mime) if mime.type_() == mime_guess::mime::AUDIO => Self::Audio,
            Some(mime) if mime.type_() == mime_guess::mime::VIDEO => Self::Video,
            _ => Self::Other,
        }
    }
}

/// A media entry: a file, folder or playlist addressed by URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub uri: String,
    pub title: String,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // Populated by library lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl MediaItem {
    pub fn new(uri: impl Into<String>, media_type: MediaType) -> Self {
        let uri = uri.into();
        Self {
            title: title_from_uri(&uri),
            uri,
            media_type,
            description: None,
            library_id: None,
            artist: None,
            album: None,
            duration_ms: None,
        }
    }

    /// Wrap a discovered item into a provisional entry, consuming it
    pub fn from_raw(raw: RawMedia) -> Self {
        let media_type = match raw.kind {
            EntryKind::Directory => MediaType::Directory,
            EntryKind::File | EntryKind::Unknown => MediaType::infer(&raw.uri),
        };
        let mut item = Self::new(raw.uri, media_type);
        if let Some(title) = raw.title.filter(|t| !t.is_empty()) {
            item.title = title;
        }
        item
    }

    /// Playable audio or video
    pub fn is_media(&self) -> bool {
        matches!(self.media_type, MediaType::Audio | MediaType::Video)
    }

    /// Something the browser can show: playable media, folders and playlists
    pub fn is_browsable(&self) -> bool {
        self.is_media() || matches!(self.media_type, MediaType::Directory | MediaType::Playlist)
    }

    pub fn scheme(&self) -> Option<String> {
        uri_scheme(&self.uri)
    }
}

/// A storage root (mount point, removable volume)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageItem {
    pub uri: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StorageItem {
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            title: title_from_uri(&uri),
            uri,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A displayable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogItem {
    Media(MediaItem),
    Storage(StorageItem),
}

impl CatalogItem {
    /// Location used as identity for cache keys
    pub fn location(&self) -> &str {
        match self {
            Self::Media(m) => &m.uri,
            Self::Storage(s) => &s.uri,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Media(m) => &m.title,
            Self::Storage(s) => &s.title,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Media(m) => m.description.as_deref(),
            Self::Storage(s) => s.description.as_deref(),
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = Some(description.into());
        match self {
            Self::Media(m) => m.description = description,
            Self::Storage(s) => s.description = description,
        }
    }

    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::Media(m) => Some(m.media_type),
            Self::Storage(_) => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.media_type() == Some(MediaType::Directory)
    }

    /// Location to sub-browse when parsing children, if this entry supports it
    pub fn parsable_location(&self) -> Option<&str> {
        match self {
            Self::Media(m) => {
                if !matches!(m.media_type, MediaType::Directory | MediaType::Playlist) {
                    return None;
                }
                match m.scheme() {
                    Some(scheme) if UNPARSABLE_SCHEMES.contains(&scheme.as_str()) => None,
                    _ => Some(&m.uri),
                }
            }
            Self::Storage(s) => Some(&s.uri),
        }
    }
}

impl From<MediaItem> for CatalogItem {
    fn from(item: MediaItem) -> Self {
        Self::Media(item)
    }
}

impl From<StorageItem> for CatalogItem {
    fn from(item: StorageItem) -> Self {
        Self::Storage(item)
    }
}

/// Lowercased scheme of a URI, if it parses
pub fn uri_scheme(uri: &str) -> Option<String> {
    Url::parse(uri).ok().map(|url| url.scheme().to_ascii_lowercase())
}

/// Last path segment of a URI, percent-decoded
fn title_from_uri(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let segment = if segment.is_empty() { uri } else { segment };
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
