//! Mock collaborators for provider integration testing
//!
//! The scripted source reports listings from its own std thread, like a real
//! discovery engine, so tests exercise the cross-thread callback path.

pub mod library;
pub mod source;

pub use library::{HangingLibrary, MemoryLibrary};
pub use source::ScriptedSource;
