//! Global config file: `$XDG_CONFIG_HOME/leafsync/config.toml`

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

/// Add the global file if the config home can be resolved. The file is optional.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::global_config_file() {
        Some(path) => Ok(builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )),
        None => Ok(builder),
    }
}
