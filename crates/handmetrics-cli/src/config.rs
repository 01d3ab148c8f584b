//! Configuration vault – reads/writes `~/.handmetrics/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use handmetrics_geometry::ExtractOptions;
use handmetrics_runtime::PipelineConfig;

/// How processed frames are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON-encoded frame per line.
    #[default]
    Json,
    /// Human-readable one-line-per-hand summary.
    Summary,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "summary" => Ok(OutputFormat::Summary),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

/// Persisted configuration stored in `~/.handmetrics/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compute lateral-plane side-bend angles alongside frontal bend angles.
    #[serde(default = "default_side_bend")]
    pub side_bend_enabled: bool,

    /// Per-topic capacity of the frame bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    #[serde(default)]
    pub output: OutputFormat,

    /// Stop replaying after this many unreadable frames in a row.
    #[serde(default = "default_max_detector_errors")]
    pub max_consecutive_detector_errors: usize,
}

fn default_side_bend() -> bool {
    true
}
fn default_bus_capacity() -> usize {
    64
}
fn default_max_detector_errors() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            side_bend_enabled: default_side_bend(),
            bus_capacity: default_bus_capacity(),
            output: OutputFormat::default(),
            max_consecutive_detector_errors: default_max_detector_errors(),
        }
    }
}

impl Config {
    /// Pipeline settings derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            extract: ExtractOptions {
                side_bend: self.side_bend_enabled,
            },
            bus_capacity: self.bus_capacity.max(1),
            max_consecutive_detector_errors: self.max_consecutive_detector_errors.max(1),
        }
    }
}

/// Return the path to `~/.handmetrics/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".handmetrics").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Load the config from disk, falling back to defaults, then apply
/// environment overrides.
pub fn effective() -> Result<Config, String> {
    let mut cfg = load()?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Apply `HANDMETRICS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HANDMETRICS_SIDE_BEND` | `side_bend_enabled` (`true`/`false`) |
/// | `HANDMETRICS_BUS_CAPACITY` | `bus_capacity` |
/// | `HANDMETRICS_OUTPUT` | `output` (`json`/`summary`) |
/// | `HANDMETRICS_MAX_DETECTOR_ERRORS` | `max_consecutive_detector_errors` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HANDMETRICS_SIDE_BEND")
        && let Ok(enabled) = v.trim().parse::<bool>()
    {
        cfg.side_bend_enabled = enabled;
    }
    if let Ok(v) = std::env::var("HANDMETRICS_BUS_CAPACITY")
        && let Ok(capacity) = v.trim().parse::<usize>()
        && capacity > 0
    {
        cfg.bus_capacity = capacity;
    }
    if let Ok(v) = std::env::var("HANDMETRICS_OUTPUT")
        && let Ok(output) = v.parse::<OutputFormat>()
    {
        cfg.output = output;
    }
    if let Ok(v) = std::env::var("HANDMETRICS_MAX_DETECTOR_ERRORS")
        && let Ok(limit) = v.trim().parse::<usize>()
    {
        cfg.max_consecutive_detector_errors = limit;
    }
}

/// Save the config to disk, creating `~/.handmetrics/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
