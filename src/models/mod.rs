//! Data models for the postdoc application tracker.
//!
//! Field names serialize in camelCase so exported files stay readable by
//! every earlier version of the tracker.

mod application;
mod datastore;
mod document;
mod listing;
mod registry;
mod tristate;

pub use application::*;
pub use datastore::*;
pub use document::*;
pub use listing::*;
pub use registry::*;
pub use tristate::*;
