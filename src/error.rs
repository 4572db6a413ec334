//! Errors reported by discovery sources

use thiserror::Error;

/// Failure to start a browse on a discovery source.
///
/// These never reach provider callers: the bridge closes the session and the
/// browse completes with whatever was collected (usually nothing).
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The source was released and cannot browse anymore
    #[error("discovery source has been released")]
    Released,

    /// No listener is installed to receive results
    #[error("no discovery listener installed")]
    NoListener,

    /// The location cannot be browsed by this source
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Worker could not be started
    #[error("discovery I/O error: {0}")]
    Io(#[from] std::io::Error),
}
