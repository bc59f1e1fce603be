//! Time-to-live caches for "list all X" reads.

pub mod slice;

pub use slice::{CachedCollection, FetchStatus, ResourceCache};
