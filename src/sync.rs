//! Synchronization Pipelines
//!
//! Push publishes a full snapshot as one commit, pull rebuilds the snapshot from
//! the tree listing plus `metadata.json`, and the stale check compares the
//! remote `pushCount` with the last one this client saw.

pub mod engine;
pub mod gate;
pub mod pull;
pub mod push;
pub mod stale;

pub use engine::{ConnectionInfo, SyncEngine};
pub use gate::{SyncGate, SyncGuard, SyncKind};
pub use pull::{pull_snapshot, NoopObserver, PullObserver, PullOptions, PullOutcome, PullPriority};
pub use push::{push_snapshot, PushOptions, PushOutcome};
pub use stale::{check_stale, spawn_stale_watcher, StaleStatus, StaleWatcher};

use crate::error::SyncError;
use crate::github::GitDataApi;
use crate::metadata::MetadataDocument;
use crate::paths::ManagedNamespace;
use tracing::debug;

/// Remote `metadata.json` as found on the default branch.
#[derive(Debug, Clone)]
pub(crate) enum RemoteMetadata {
    Absent,
    Parsed(MetadataDocument),
    /// Present but undecodable; carries the downgraded error.
    Corrupt(SyncError),
}

impl RemoteMetadata {
    pub(crate) fn into_option(self) -> Option<MetadataDocument> {
        match self {
            RemoteMetadata::Parsed(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Transport failures are returned as `Err`; a malformed body is not one.
pub(crate) async fn fetch_metadata<A>(
    api: &A,
    namespace: &ManagedNamespace,
) -> Result<RemoteMetadata, SyncError>
where
    A: GitDataApi + ?Sized,
{
    let path = namespace.metadata_path();
    let Some(text) = api.get_file(&path).await? else {
        debug!(path = %path, "No metadata document");
        return Ok(RemoteMetadata::Absent);
    };
    Ok(match MetadataDocument::from_json(&text) {
        Ok(doc) => RemoteMetadata::Parsed(doc),
        Err(err) => RemoteMetadata::Corrupt(err),
    })
}

/// Default branch of the repository, or `fallback` when it reports none.
pub(crate) async fn resolve_branch<A>(api: &A, fallback: &str) -> Result<String, SyncError>
where
    A: GitDataApi + ?Sized,
{
    let repo = api.get_repository().await?;
    Ok(repo
        .default_branch
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string()))
}
