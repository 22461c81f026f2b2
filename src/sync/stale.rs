//! Stale detection
//!
//! Only `metadata.json` is read. A remote `pushCount` above the local baseline
//! means another client pushed since this one last synced.

use super::engine::SyncEngine;
use super::{fetch_metadata, RemoteMetadata};
use crate::error::SyncError;
use crate::github::GitDataApi;
use crate::paths::ManagedNamespace;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub enum StaleStatus {
    Stale { remote: u64, local: u64 },
    UpToDate { remote: u64 },
    CheckFailed(SyncError),
}

impl StaleStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, StaleStatus::Stale { .. })
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            StaleStatus::Stale { .. } => "github.staleRemote",
            StaleStatus::UpToDate { .. } => "github.upToDate",
            StaleStatus::CheckFailed(err) => err.message_key(),
        }
    }
}

/// Compare the remote `pushCount` with `last_known`.
///
/// A missing document (including an empty repository) is up to date, provided
/// the repository itself is reachable; a 404 from the contents endpoint also
/// covers a mistyped or hidden repository.
pub async fn check_stale<A>(api: &A, namespace: &ManagedNamespace, last_known: u64) -> StaleStatus
where
    A: GitDataApi + ?Sized,
{
    let remote = match fetch_metadata(api, namespace).await {
        Ok(RemoteMetadata::Parsed(doc)) => doc.push_count,
        Ok(RemoteMetadata::Absent) => {
            return match api.get_repository().await {
                Ok(_) => StaleStatus::UpToDate { remote: 0 },
                Err(err) => {
                    debug!(error = %err, "Stale check could not reach the repository");
                    StaleStatus::CheckFailed(err)
                }
            };
        }
        Ok(RemoteMetadata::Corrupt(err)) | Err(err) => {
            debug!(error = %err, "Stale check failed");
            return StaleStatus::CheckFailed(err);
        }
    };
    if remote > last_known {
        StaleStatus::Stale {
            remote,
            local: last_known,
        }
    } else {
        StaleStatus::UpToDate { remote }
    }
}

/// Background poller started by [`spawn_stale_watcher`].
pub struct StaleWatcher {
    receiver: mpsc::Receiver<StaleStatus>,
    handle: JoinHandle<()>,
}

impl StaleWatcher {
    /// Next check outcome; `None` once the task has stopped.
    pub async fn recv(&mut self) -> Option<StaleStatus> {
        self.receiver.recv().await
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for StaleWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Poll the remote every `interval`.
///
/// A tick is skipped while a pull or push holds the engine's gate, and before
/// the engine has a `pushCount` baseline from a first pull or push.
pub fn spawn_stale_watcher<A>(engine: Arc<SyncEngine<A>>, interval: Duration) -> StaleWatcher
where
    A: GitDataApi + 'static,
{
    let (sender, receiver) = mpsc::channel(8);
    let handle = tokio::spawn(async move {
        let period = interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            if engine.gate().is_busy() {
                debug!("Sync in progress, stale check skipped");
                continue;
            }
            let Some(baseline) = engine.last_known_push_count() else {
                debug!("No pushCount baseline yet, stale check skipped");
                continue;
            };
            let status = engine.check_stale_against(baseline).await;
            if let StaleStatus::CheckFailed(err) = &status {
                warn!(error = %err, "Periodic stale check failed");
            }
            if sender.send(status).await.is_err() {
                break;
            }
        }
    });
    StaleWatcher { receiver, handle }
}
