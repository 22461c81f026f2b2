//! Environment variable source: LEAFSYNC__ prefix with __ separator

use crate::config::ENV_PREFIX;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `LEAFSYNC__SYNC__NAMESPACE=journal` sets `sync.namespace`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
