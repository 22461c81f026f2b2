//! Error types for the synchronization engine.
//!
//! Every network status is mapped to a `SyncError` at the call site; pipelines
//! hand these back as values and never panic across their boundary.

use crate::rate_limit::RateLimitInfo;
use thiserror::Error;

/// The network step that produced an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStep {
    RepoFetch,
    UserFetch,
    BranchFetch,
    CommitFetch,
    TreeFetch,
    ContentFetch,
    TreeCreate,
    CommitCreate,
    RefUpdate,
}

impl ApiStep {
    pub fn message_key(&self) -> &'static str {
        match self {
            ApiStep::RepoFetch => "github.repoFetchFailed",
            ApiStep::UserFetch => "github.userFetchFailed",
            ApiStep::BranchFetch => "github.branchFetchFailed",
            ApiStep::CommitFetch => "github.commitFetchFailed",
            ApiStep::TreeFetch => "github.treeFetchFailed",
            ApiStep::ContentFetch => "github.contentFetchFailed",
            ApiStep::TreeCreate => "github.treeCreateFailed",
            ApiStep::CommitCreate => "github.commitCreateFailed",
            ApiStep::RefUpdate => "github.branchUpdateFailed",
        }
    }
}

impl std::fmt::Display for ApiStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApiStep::RepoFetch => "repo-fetch",
            ApiStep::UserFetch => "user-fetch",
            ApiStep::BranchFetch => "branch-fetch",
            ApiStep::CommitFetch => "commit-fetch",
            ApiStep::TreeFetch => "tree-fetch",
            ApiStep::ContentFetch => "content-fetch",
            ApiStep::TreeCreate => "tree-create",
            ApiStep::CommitCreate => "commit-create",
            ApiStep::RefUpdate => "ref-update",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Repository not found")]
    RepoNotFound,

    #[error("Rate limited by GitHub (retry in {}s)", .0.remaining_seconds.unwrap_or_default())]
    RateLimited(RateLimitInfo),

    #[error("GitHub API {step} failed with status {status}")]
    Api { step: ApiStep, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Refusing to push a snapshot without leaves")]
    NoLeaves,

    #[error("Remote has newer data (remote pushCount {remote}, local {local})")]
    StaleRemote { remote: u64, local: u64 },

    #[error("Another sync operation is in progress")]
    Busy,
}

impl SyncError {
    /// Presentation key for the failure; localisation happens elsewhere.
    pub fn message_key(&self) -> &'static str {
        match self {
            SyncError::ConfigInvalid(_) => "github.configInvalid",
            SyncError::AuthError => "github.noPermission",
            SyncError::RepoNotFound => "github.repoNotFound",
            SyncError::RateLimited(_) => "github.rateLimited",
            SyncError::Api { step, .. } => step.message_key(),
            SyncError::Network(_) => "github.networkError",
            SyncError::NoLeaves => "toast.noLeaves",
            SyncError::StaleRemote { .. } => "github.staleRemote",
            SyncError::Busy => "toast.syncBusy",
        }
    }

    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            SyncError::RateLimited(info) => Some(info),
            _ => None,
        }
    }

    /// Whether retrying the same operation later can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RateLimited(_) | SyncError::Network(_) | SyncError::Api { .. } | SyncError::Busy
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Network(format!("Malformed response body: {}", err))
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigInvalid(err.to_string())
    }
}
