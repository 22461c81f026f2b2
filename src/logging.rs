//! Logging System
//!
//! Structured logging through `tracing`. Level, format and destination come from
//! the `[logging]` config section and can be overridden by `LEAFSYNC_LOG*`
//! environment variables.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub const ENV_LOG: &str = "LEAFSYNC_LOG";
pub const ENV_LOG_FORMAT: &str = "LEAFSYNC_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "LEAFSYNC_LOG_OUTPUT";
pub const ENV_LOG_MODULES: &str = "LEAFSYNC_LOG_MODULES";
pub const ENV_LOG_FILE: &str = "LEAFSYNC_LOG_FILE";

/// Resolve the log file path with precedence: CLI, `LEAFSYNC_LOG_FILE`, config file, default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, SyncError> {
    if let Some(p) = cli_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var(ENV_LOG_FILE) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    default_log_file_path()
}

/// `leafsync.log` in the platform state directory.
fn default_log_file_path() -> Result<PathBuf, SyncError> {
    let project_dirs = directories::ProjectDirs::from("", "", "leafsync").ok_or_else(|| {
        SyncError::ConfigInvalid("Could not determine platform directories for log file".to_string())
    })?;
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir())
        .to_path_buf();
    Ok(dir.join("leafsync.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when output includes file; `None` uses the state directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Colored output (text format, terminal destinations only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `leafsync::sync = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Initialize the global subscriber.
///
/// Priority order (highest to lowest): environment variables, configuration,
/// defaults. The CLI applies its flags by setting the environment variables.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), SyncError> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| SyncError::ConfigInvalid(format!("Logging already initialized: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let json = determine_format(config)? == "json";
    let output = determine_output(config)?;
    let ansi = !json && !output.file && config.map(|c| c.color).unwrap_or(true);

    let log_file = if output.file {
        Some(resolve_log_file_path(None, config.and_then(|c| c.file.clone()))?)
    } else {
        None
    };
    let writer = build_writer(&output, log_file)?;

    let layer = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| SyncError::ConfigInvalid(format!("Logging already initialized: {}", e)))
}

fn open_log_file(path: PathBuf) -> Result<Mutex<std::fs::File>, SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SyncError::ConfigInvalid(format!("Failed to create log directory: {}", e))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            SyncError::ConfigInvalid(format!("Failed to open log file {:?}: {}", path, e))
        })?;
    Ok(Mutex::new(file))
}

fn build_writer(
    output: &OutputDestinations,
    log_file: Option<PathBuf>,
) -> Result<BoxMakeWriter, SyncError> {
    if let Some(path) = log_file.filter(|_| output.file) {
        let file = open_log_file(path)?;
        return Ok(if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        });
    }
    Ok(match (output.stdout, output.stderr) {
        (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (false, true) => BoxMakeWriter::new(std::io::stderr),
        _ => BoxMakeWriter::new(std::io::stdout),
    })
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, SyncError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);
    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(directive.parse().map_err(|e| {
                SyncError::ConfigInvalid(format!("Invalid log directive: {}", e))
            })?);
        }
    }

    if let Ok(modules_str) = std::env::var(ENV_LOG_MODULES) {
        for module_spec in modules_str.split(',') {
            if let Some((module, module_level)) = module_spec.split_once('=') {
                let directive = format!("{}={}", module.trim(), module_level.trim());
                filter = filter.add_directive(directive.parse().map_err(|e| {
                    SyncError::ConfigInvalid(format!("Invalid log directive from env: {}", e))
                })?);
            }
        }
    }

    Ok(filter)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, SyncError> {
    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(SyncError::ConfigInvalid(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputDestinations, SyncError> {
    if let Ok(output) = std::env::var(ENV_LOG_OUTPUT) {
        return parse_output_destinations(&output);
    }
    parse_output_destinations(config.map(|c| c.output.as_str()).unwrap_or("file"))
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, SyncError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(SyncError::ConfigInvalid(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}
