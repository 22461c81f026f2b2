//! CLI Tooling
//!
//! Command-line interface over the sync engine. Every command loads the layered
//! configuration for the workspace and talks to exactly one repository.

use super::format::{
    format_connection, format_pull_summary, format_push_outcome, format_stale_status,
};
use crate::config::{ConfigLoader, SyncConfig};
use crate::error::SyncError;
use crate::github::GitHubClient;
use crate::metadata::MetadataDocument;
use crate::sync::{spawn_stale_watcher, PullObserver, PullPriority, SyncEngine};
use crate::types::{Leaf, LeafSkeleton, Note, Snapshot};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// leafsync - mirror a note hierarchy into a GitHub repository
#[derive(Parser)]
#[command(name = "leafsync")]
#[command(about = "Synchronize notes and leaves with a GitHub repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify the token and repository
    TestConnection,
    /// Pull every note and leaf from the repository
    Pull {
        /// Write the pulled snapshot as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Leaf path (relative to the namespace) to load first; repeatable
        #[arg(long = "priority-leaf")]
        priority_leaf: Vec<String>,
    },
    /// Push a snapshot file as one commit
    Push {
        /// Snapshot JSON (`notes`, `leaves`, optional `virtualLeaves`)
        #[arg(long)]
        snapshot: PathBuf,
        /// Refuse to push when the remote pushCount is ahead of this value
        #[arg(long)]
        expect_push_count: Option<u64>,
    },
    /// Compare the remote pushCount with a known value
    Stale {
        /// pushCount observed at the last pull or push
        #[arg(long, default_value = "0")]
        since: u64,
    },
    /// Poll for remote changes until interrupted
    Watch {
        /// pushCount observed at the last pull or push
        #[arg(long, default_value = "0")]
        since: u64,
        /// Seconds between checks (defaults to sync.stale_check_interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Stop after this many checks
        #[arg(long)]
        count: Option<usize>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML (token redacted)
    Show,
}

/// Observer that asks for the given leaves first and records progress.
struct CliPullObserver {
    priority: PullPriority,
    loaded: AtomicUsize,
    priority_ready_after: Mutex<Option<usize>>,
}

impl CliPullObserver {
    fn new(priority_leaves: &[String]) -> Self {
        Self {
            priority: PullPriority {
                leaf_paths: priority_leaves.iter().cloned().collect(),
                note_ids: Default::default(),
            },
            loaded: AtomicUsize::new(0),
            priority_ready_after: Mutex::new(None),
        }
    }
}

impl PullObserver for CliPullObserver {
    fn on_structure(
        &self,
        notes: &[Note],
        _metadata: &MetadataDocument,
        leaves: &[LeafSkeleton],
    ) -> Option<PullPriority> {
        info!(notes = notes.len(), leaves = leaves.len(), "Structure received");
        if self.priority.leaf_paths.is_empty() {
            None
        } else {
            Some(self.priority.clone())
        }
    }

    fn on_leaf(&self, _leaf: &Leaf) {
        self.loaded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_priority_complete(&self) {
        let loaded = self.loaded.load(Ordering::SeqCst);
        *self.priority_ready_after.lock() = Some(loaded);
    }
}

/// CLI context holding the resolved configuration.
pub struct CliContext {
    workspace_root: PathBuf,
    config: SyncConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, SyncError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn engine(&self) -> Result<SyncEngine<GitHubClient>, SyncError> {
        SyncEngine::from_config(&self.config)
    }

    fn runtime() -> Result<tokio::runtime::Runtime, SyncError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::ConfigInvalid(format!("Failed to start async runtime: {}", e)))
    }

    /// Resolve a path argument against the workspace root.
    fn workspace_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Config {
                command: ConfigCommands::Show,
            } => self.config.redacted().to_toml(),
            Commands::TestConnection => {
                let engine = self.engine()?;
                let info = Self::runtime()?.block_on(engine.test_connection())?;
                Ok(format_connection(&info))
            }
            Commands::Pull { out, priority_leaf } => self.pull(out.as_deref(), priority_leaf),
            Commands::Push {
                snapshot,
                expect_push_count,
            } => self.push(snapshot, *expect_push_count),
            Commands::Stale { since } => {
                let engine = self.engine()?;
                let status = Self::runtime()?.block_on(engine.check_stale_against(*since));
                Ok(format_stale_status(&status))
            }
            Commands::Watch {
                since,
                interval_secs,
                count,
            } => self.watch(*since, *interval_secs, *count),
        }
    }

    fn pull(&self, out: Option<&Path>, priority_leaf: &[String]) -> Result<String, SyncError> {
        let engine = self.engine()?;
        let observer = CliPullObserver::new(priority_leaf);
        let outcome = Self::runtime()?.block_on(engine.pull(&observer))?;

        let mut text = format_pull_summary(&outcome);
        if !priority_leaf.is_empty() {
            if let Some(after) = *observer.priority_ready_after.lock() {
                text.push_str(&format!("\n  Priority leaves ready after {} fetch(es).\n", after));
            }
        }
        if let Some(out) = out {
            let path = self.workspace_path(out);
            let snapshot = Snapshot::new(outcome.notes.clone(), outcome.leaves.clone());
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(&path, json).map_err(|e| {
                SyncError::ConfigInvalid(format!("Failed to write {}: {}", path.display(), e))
            })?;
            text.push_str(&format!("\n  Snapshot written to {}\n", path.display()));
        }
        Ok(text)
    }

    fn push(&self, snapshot: &Path, expect_push_count: Option<u64>) -> Result<String, SyncError> {
        let path = self.workspace_path(snapshot);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            SyncError::ConfigInvalid(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            SyncError::ConfigInvalid(format!("Invalid snapshot {}: {}", path.display(), e))
        })?;

        let engine = self.engine()?;
        let runtime = Self::runtime()?;
        let outcome = match expect_push_count {
            Some(count) => {
                engine.set_last_known_push_count(count);
                runtime.block_on(engine.push_if_fresh(&snapshot))?
            }
            None => runtime.block_on(engine.push(&snapshot))?,
        };
        Ok(format_push_outcome(&outcome))
    }

    fn watch(
        &self,
        since: u64,
        interval_secs: Option<u64>,
        count: Option<usize>,
    ) -> Result<String, SyncError> {
        let engine = Arc::new(self.engine()?);
        engine.set_last_known_push_count(since);
        let interval = interval_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.config.sync.stale_check_interval());

        let runtime = Self::runtime()?;
        let lines = runtime.block_on(async move {
            let mut watcher = spawn_stale_watcher(engine, interval);
            let mut lines = Vec::new();
            while let Some(status) = watcher.recv().await {
                let line = format_stale_status(&status);
                println!("{}", line);
                lines.push(line);
                if count.is_some_and(|limit| lines.len() >= limit) {
                    break;
                }
            }
            lines
        });
        Ok(format!("{} check(s) completed", lines.len()))
    }
}
