//! Lowest layer of every merge: the built-in defaults.

use crate::config::SyncConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `SyncConfig::default()`, so later sources only need to
/// name the keys they change.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&SyncConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
