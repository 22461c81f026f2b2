//! GitHub Transport
//!
//! REST and Git Data API access behind the [`GitDataApi`] trait. The pipelines
//! only see classified [`crate::error::SyncError`] values, never HTTP statuses.

pub mod api;
pub mod client;
pub mod repo;
pub mod types;

pub use api::GitDataApi;
pub use client::{GitHubClient, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
pub use repo::RepoRef;
pub use types::{
    AuthenticatedUser, CommitInfo, EntryKind, NewCommit, NewTreeItem, RepositoryInfo, Signature,
    TreeEntry, TreeListing, FILE_MODE,
};
