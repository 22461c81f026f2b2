//! leafsync: GitHub Synchronization for Notes and Leaves
//!
//! Mirrors a two-level hierarchy of notes and markdown leaves into a GitHub
//! repository through the Git Data API. A push publishes the whole snapshot as
//! one commit, uploading only the leaves whose blob sha changed; a pull rebuilds
//! the hierarchy from the tree listing and `metadata.json`, loading priority
//! leaves first.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod metadata;
pub mod paths;
pub mod rate_limit;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::SyncError;
pub use sync::{PullObserver, PullOutcome, PushOutcome, StaleStatus, SyncEngine};
pub use types::{Leaf, Note, Snapshot};
