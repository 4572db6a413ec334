//! Discovery source capability and the bridge that turns its callbacks into
//! per-session item streams.
//!
//! A [`DiscoverySource`] is an opaque engine (local filesystem, SMB/UPnP share
//! browser, ...) that reports what it finds by calling a [`DiscoveryListener`]
//! from its own worker thread, with no back-pressure. The
//! [`bridge::DiscoveryBridge`] owns the source and hands the consumer a
//! [`bridge::Session`] it can await on.

pub mod bridge;

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::catalog::RawMedia;
use crate::error::DiscoveryError;

pub use bridge::{DiscoveryBridge, Session};

/// Flags passed to [`DiscoverySource::browse`]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BrowseFlags(u32);

impl BrowseFlags {
    pub const NO_SLAVES_AUTODETECT: Self = Self(1);
    pub const SHOW_HIDDEN_FILES: Self = Self(1 << 1);
    /// The source may prompt the user (credentials, certificates)
    pub const INTERACT: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for BrowseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BrowseFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for BrowseFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::NO_SLAVES_AUTODETECT) {
            names.push("NO_SLAVES_AUTODETECT");
        }
        if self.contains(Self::SHOW_HIDDEN_FILES) {
            names.push("SHOW_HIDDEN_FILES");
        }
        if self.contains(Self::INTERACT) {
            names.push("INTERACT");
        }
        write!(f, "BrowseFlags({})", names.join(" | "))
    }
}

/// Receives discovery results. Called from the source's own thread.
pub trait DiscoveryListener: Send + Sync {
    /// An item was found under the browsed location
    fn on_media_added(&self, index: usize, media: RawMedia);

    /// An item disappeared (network shares going away)
    fn on_media_removed(&self, _index: usize, _media: RawMedia) {}

    /// The current browse finished; no more items will follow
    fn on_browse_end(&self);
}

/// Opaque media discovery engine.
///
/// Implementations must not block in `browse` / `discover_network_shares`:
/// they start work and report through the installed listener, finishing every
/// successful call with exactly one `on_browse_end`. Results are delivered to
/// the listener that was installed when the call was made.
pub trait DiscoverySource: Send + Sync {
    /// Install or remove the listener that receives results
    fn set_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>);

    /// List the children of `location`
    fn browse(&self, location: &str, flags: BrowseFlags) -> Result<(), DiscoveryError>;

    /// Discover network shares (root browse)
    fn discover_network_shares(&self) -> Result<(), DiscoveryError>;

    /// Release native resources; the source is unusable afterwards
    fn release(&self);
}
