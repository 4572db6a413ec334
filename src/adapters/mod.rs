//! Discovery source adapters

pub mod local;

pub use local::LocalDirectorySource;
