//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use iso_search_core::{AdapterId, AggregatorConfig};

const APP_DIR: &str = "iso-search";
const CONFIG_FILE: &str = "config.toml";

/// File configuration for search defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Connect timeout shared by every source, in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Request timeout for official sites and catalogs, in seconds.
    pub source_timeout_secs: Option<u64>,
    /// Request timeout for torrent trackers, in seconds.
    pub tracker_timeout_secs: Option<u64>,
    /// Torrent indexes queried for distro searches, in order.
    pub torrent_indexes: Option<Vec<AdapterId>>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Default output format.
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("source_timeout_secs", self.source_timeout_secs)?;
        validate_timeout_secs("tracker_timeout_secs", self.tracker_timeout_secs)?;
        Ok(())
    }

    /// Overlays file values onto library defaults.
    pub fn apply_to(&self, config: &mut AggregatorConfig) {
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.source_timeout_secs {
            config.source_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.tracker_timeout_secs {
            config.tracker_timeout = Duration::from_secs(secs);
        }
        if let Some(indexes) = &self.torrent_indexes {
            config.torrent_indexes.clone_from(indexes);
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=300).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=300");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter directive used when neither `RUST_LOG` nor CLI flags decide.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/iso-search/config.toml`
/// 2. `$HOME/.config/iso-search/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "connect_timeout_secs" | "source_timeout_secs" | "tracker_timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                match key {
                    "connect_timeout_secs" => cfg.connect_timeout_secs = Some(parsed),
                    "source_timeout_secs" => cfg.source_timeout_secs = Some(parsed),
                    _ => cfg.tracker_timeout_secs = Some(parsed),
                }
            }
            "torrent_indexes" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `torrent_indexes` value on line {line_no}"))?;
                cfg.torrent_indexes = Some(parse_torrent_indexes(&parsed).with_context(|| {
                    format!("Invalid `torrent_indexes` value '{parsed}' on line {line_no}")
                })?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            "format" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `format` value on line {line_no}"))?;
                cfg.format = Some(parse_format(&parsed).with_context(|| {
                    format!("Invalid `format` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

/// Comma-separated torrent index names; an empty string disables them all.
fn parse_torrent_indexes(value: &str) -> Result<Vec<AdapterId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| match AdapterId::from_name(name) {
            Some(id) if id.is_torrent_index() => Ok(id),
            _ => bail!("'{name}' is not a torrent index. Expected: distrowatch, linuxtracker"),
        })
        .collect()
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => bail!("Expected one of: text, json"),
    }
}
