//! Engine tying the pipelines to one repository.

use super::gate::{SyncGate, SyncKind};
use super::pull::{pull_snapshot, PullObserver, PullOptions, PullOutcome};
use super::push::{push_snapshot, PushOptions, PushOutcome};
use super::stale::{check_stale, StaleStatus};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::github::{GitDataApi, GitHubClient};
use crate::types::Snapshot;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

/// Result of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub login: String,
    pub repository: String,
    pub default_branch: Option<String>,
}

impl ConnectionInfo {
    pub fn message_key(&self) -> &'static str {
        "github.connectionOk"
    }
}

/// Owns the transport, the pipeline settings, the pull/push gate and the last
/// `pushCount` this client observed.
pub struct SyncEngine<A: GitDataApi> {
    api: A,
    push_options: PushOptions,
    pull_options: PullOptions,
    gate: SyncGate,
    last_push_count: Mutex<Option<u64>>,
}

impl SyncEngine<GitHubClient> {
    /// Validate the configuration and build a GitHub-backed engine.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let repo = config.github.validate()?;
        let token = config.github.resolved_token().unwrap_or_default();
        let client = GitHubClient::with_options(
            repo,
            &token,
            &config.github.api_base_url,
            &config.github.user_agent,
            config.sync.rate_limit_fallback_secs,
        )?;
        Ok(Self::new(
            client,
            config.sync.push_options(),
            config.sync.pull_options(),
        ))
    }
}

impl<A: GitDataApi> SyncEngine<A> {
    pub fn new(api: A, push_options: PushOptions, pull_options: PullOptions) -> Self {
        Self {
            api,
            push_options,
            pull_options,
            gate: SyncGate::new(),
            last_push_count: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn gate(&self) -> &SyncGate {
        &self.gate
    }

    /// `pushCount` seen by the last pull or push, if any.
    pub fn last_known_push_count(&self) -> Option<u64> {
        *self.last_push_count.lock()
    }

    /// Seed the baseline, e.g. from a persisted previous session.
    pub fn set_last_known_push_count(&self, count: u64) {
        *self.last_push_count.lock() = Some(count);
    }

    /// `GET /user` then the repository lookup.
    pub async fn test_connection(&self) -> Result<ConnectionInfo, SyncError> {
        let user = self.api.get_authenticated_user().await?;
        let repo = self.api.get_repository().await?;
        info!(login = %user.login, "Connection verified");
        Ok(ConnectionInfo {
            login: user.login,
            repository: repo.full_name.unwrap_or_default(),
            default_branch: repo.default_branch,
        })
    }

    pub async fn pull(&self, observer: &dyn PullObserver) -> Result<PullOutcome, SyncError> {
        let _guard = self.gate.try_acquire(SyncKind::Pull)?;
        let outcome = pull_snapshot(&self.api, &self.pull_options, observer).await?;
        self.set_last_known_push_count(outcome.metadata.push_count);
        Ok(outcome)
    }

    pub async fn push(&self, snapshot: &Snapshot) -> Result<PushOutcome, SyncError> {
        let _guard = self.gate.try_acquire(SyncKind::Push)?;
        self.push_locked(snapshot).await
    }

    /// Push only when no other client has pushed since the last sync.
    ///
    /// Without a baseline every remote push counts as newer.
    pub async fn push_if_fresh(&self, snapshot: &Snapshot) -> Result<PushOutcome, SyncError> {
        let _guard = self.gate.try_acquire(SyncKind::Push)?;
        let baseline = self.last_known_push_count().unwrap_or(0);
        match self.check_stale_against(baseline).await {
            StaleStatus::Stale { remote, local } => Err(SyncError::StaleRemote { remote, local }),
            StaleStatus::CheckFailed(err) => Err(err),
            StaleStatus::UpToDate { .. } => self.push_locked(snapshot).await,
        }
    }

    async fn push_locked(&self, snapshot: &Snapshot) -> Result<PushOutcome, SyncError> {
        let outcome = push_snapshot(&self.api, snapshot, &self.push_options).await?;
        self.set_last_known_push_count(outcome.push_count);
        Ok(outcome)
    }

    /// Stale check against the engine's own baseline (zero when unknown).
    pub async fn check_stale(&self) -> StaleStatus {
        self.check_stale_against(self.last_known_push_count().unwrap_or(0))
            .await
    }

    pub async fn check_stale_against(&self, last_known: u64) -> StaleStatus {
        check_stale(&self.api, &self.pull_options.namespace, last_known).await
    }
}
