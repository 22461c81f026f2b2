//! Configuration Management
//!
//! Layered configuration: built-in defaults, the global file under
//! `$XDG_CONFIG_HOME/leafsync/config.toml`, the workspace `.leafsync.toml`, then
//! `LEAFSYNC__SECTION__KEY` environment variables.

mod facade;
pub mod merge;
pub mod sources;
pub mod xdg;

pub use facade::ConfigLoader;

use crate::error::SyncError;
use crate::github::{RepoRef, Signature, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use crate::logging::LoggingConfig;
use crate::paths::ManagedNamespace;
use crate::rate_limit::DEFAULT_FALLBACK_SECS;
use crate::sync::pull::DEFAULT_CONTENT_CONCURRENCY;
use crate::sync::push::DEFAULT_COMMIT_MESSAGE;
use crate::sync::{PullOptions, PushOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_PREFIX: &str = "LEAFSYNC";
pub const TOKEN_ENV_FALLBACK: &str = "GITHUB_TOKEN";
pub const WORKSPACE_CONFIG_FILE: &str = ".leafsync.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.github.token.as_deref().is_some_and(|t| !t.is_empty()) {
            copy.github.token = Some("********".to_string());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, SyncError> {
        toml::to_string_pretty(self)
            .map_err(|e| SyncError::ConfigInvalid(format!("Failed to render config: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token; `GITHUB_TOKEN` is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// `owner/repo`
    #[serde(default)]
    pub repository: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: String::new(),
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl GitHubConfig {
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_FALLBACK).ok())
            .filter(|t| !t.trim().is_empty())
    }

    /// Check the token is present and the repository is `owner/repo`.
    pub fn validate(&self) -> Result<RepoRef, SyncError> {
        if self.resolved_token().is_none() {
            return Err(SyncError::ConfigInvalid(format!(
                "GitHub token missing (set github.token or {})",
                TOKEN_ENV_FALLBACK
            )));
        }
        RepoRef::parse(&self.repository)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitterConfig {
    pub name: String,
    pub email: String,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        let defaults = PushOptions::default().committer;
        Self {
            name: defaults.name,
            email: defaults.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Managed directory at the repository root.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_concurrency")]
    pub content_fetch_concurrency: usize,

    /// Branch used when the repository reports no default branch.
    #[serde(default = "default_fallback_branch")]
    pub fallback_branch: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default)]
    pub committer: CommitterConfig,

    #[serde(default = "default_stale_interval")]
    pub stale_check_interval_secs: u64,

    #[serde(default = "default_rate_limit_fallback")]
    pub rate_limit_fallback_secs: u64,
}

fn default_namespace() -> String {
    "notes".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONTENT_CONCURRENCY
}

fn default_fallback_branch() -> String {
    "main".to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_stale_interval() -> u64 {
    300
}

fn default_rate_limit_fallback() -> u64 {
    DEFAULT_FALLBACK_SECS
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            content_fetch_concurrency: default_concurrency(),
            fallback_branch: default_fallback_branch(),
            commit_message: default_commit_message(),
            committer: CommitterConfig::default(),
            stale_check_interval_secs: default_stale_interval(),
            rate_limit_fallback_secs: default_rate_limit_fallback(),
        }
    }
}

impl SyncSettings {
    pub fn namespace(&self) -> ManagedNamespace {
        ManagedNamespace::new(&self.namespace)
    }

    pub fn stale_check_interval(&self) -> Duration {
        Duration::from_secs(self.stale_check_interval_secs)
    }

    pub fn push_options(&self) -> PushOptions {
        PushOptions {
            namespace: self.namespace(),
            fallback_branch: self.fallback_branch.clone(),
            commit_message: self.commit_message.clone(),
            committer: Signature {
                name: self.committer.name.clone(),
                email: self.committer.email.clone(),
            },
        }
    }

    pub fn pull_options(&self) -> PullOptions {
        PullOptions {
            namespace: self.namespace(),
            fallback_branch: self.fallback_branch.clone(),
            concurrency: self.content_fetch_concurrency.max(1),
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.namespace.trim_matches('/').is_empty() {
            return Err(SyncError::ConfigInvalid("sync.namespace must not be empty".to_string()));
        }
        if self.fallback_branch.trim().is_empty() {
            return Err(SyncError::ConfigInvalid(
                "sync.fallback_branch must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
