//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SyncConfig;
use crate::error::SyncError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<SyncConfig, SyncError> {
        let config = MergeService::load(workspace_root)?;
        config.sync.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        let config = MergeService::load_from_file(path)?;
        config.sync.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> SyncConfig {
        SyncConfig::default()
    }
}
