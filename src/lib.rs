//! Media Browser
//!
//! An asynchronous directory and network-share browsing engine. A
//! callback-driven discovery source is turned into a serialized, cancelable
//! stream of catalog entries, with subfolder contents parsed and cached ahead
//! of navigation.
//!
//! This library provides:
//! - A per-location browser provider backed by a single actor task
//! - Generation-tagged bridging of discovery callbacks into async streams
//! - Subfolder descriptions and a shared prefetch cache
//! - A local filesystem discovery source
//! - An event bus for dataset, loading and description updates

pub mod adapters;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod enricher;
pub mod error;
pub mod prefetch;
pub mod provider;
