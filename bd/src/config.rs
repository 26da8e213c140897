//! Breakdown configuration types and loading
//!
//! Configuration is keyed by profile name. For profile `P` the loader looks for
//! `{P}-app.yml` and overlays `{P}-user.yml` from the same directory:
//!
//! 1. `--config-file <path>` (exact file, no overlay)
//! 2. `.agent/breakdown/config/` under the current directory
//! 3. `~/.config/breakdown/`
//! 4. Built-in bootstrap config (profile `default` only)

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Profile used when `--config` is not given
pub const DEFAULT_PROFILE: &str = "default";

/// Project-local config directory, relative to the current directory
pub const PROJECT_CONFIG_DIR: &str = ".agent/breakdown/config";

/// Main Breakdown configuration for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of all prompt/schema lookups, resolved against the current directory
    #[serde(rename = "working-dir")]
    pub working_dir: PathBuf,

    /// Prompt template location
    #[serde(rename = "app-prompt")]
    pub app_prompt: AppPromptConfig,

    /// Schema file location
    #[serde(rename = "app-schema")]
    pub app_schema: AppSchemaConfig,

    /// Token validation patterns
    pub params: ParamsConfig,

    /// Path resolution behavior
    pub resolver: ResolverConfig,

    /// Variable collection behavior
    pub variables: VariablesConfig,

    /// Stdin acquisition
    pub stdin: StdinConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(".agent/breakdown"),
            app_prompt: AppPromptConfig::default(),
            app_schema: AppSchemaConfig::default(),
            params: ParamsConfig::default(),
            resolver: ResolverConfig::default(),
            variables: VariablesConfig::default(),
            stdin: StdinConfig::default(),
            log_level: None,
        }
    }
}

/// Prompt template base directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPromptConfig {
    /// Directory under `working-dir` holding `{directive}/{layer}/f_*.md`
    #[serde(rename = "base-dir")]
    pub base_dir: PathBuf,
}

impl Default for AppPromptConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("prompts"),
        }
    }
}

/// Schema base directory and file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSchemaConfig {
    /// Directory under `working-dir` holding `{directive}/{layer}/{filename}`
    #[serde(rename = "base-dir")]
    pub base_dir: PathBuf,

    /// Schema file name inside each directive/layer directory
    pub filename: String,
}

impl Default for AppSchemaConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("schema"),
            filename: "base.schema.json".to_string(),
        }
    }
}

/// Parameter validation, grouped by positional arity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
    pub two: TwoParamsConfig,
}

/// Patterns for the `<directive> <layer>` form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoParamsConfig {
    #[serde(rename = "directive-type")]
    pub directive_type: PatternConfig,

    #[serde(rename = "layer-type")]
    pub layer_type: PatternConfig,
}

/// A single configured pattern and the message shown when it rejects a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Regex source. Used exactly as written: include `^...$` to anchor it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "error-message")]
    pub error_message: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            error_message: "Invalid value".to_string(),
        }
    }
}

/// Path resolution behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Retry the unsuffixed template when an adaptation template is missing
    #[serde(rename = "adaptation-fallback")]
    pub adaptation_fallback: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            adaptation_fallback: true,
        }
    }
}

/// Variable collection behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesConfig {
    /// Let a later `uv-` variable replace an earlier one with the same name
    #[serde(rename = "allow-duplicate-user-variables")]
    pub allow_duplicate_user_variables: bool,
}

/// Stdin acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdinConfig {
    /// How long to wait for piped stdin to reach EOF
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for StdinConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl Config {
    /// Config used for the `default` profile when no file exists, and written by `init`
    pub fn bootstrap() -> Self {
        let mut config = Self::default();
        config.params.two.directive_type = PatternConfig {
            pattern: Some("^(to|summary|defect)$".to_string()),
            error_message: "Invalid directive type".to_string(),
        };
        config.params.two.layer_type = PatternConfig {
            pattern: Some("^(project|issue|task)$".to_string()),
            error_message: "Invalid layer type".to_string(),
        };
        config
    }

    /// File name of a profile's app config
    pub fn app_file_name(profile: &str) -> String {
        format!("{}-app.yml", profile)
    }

    /// File name of a profile's user overlay
    pub fn user_file_name(profile: &str) -> String {
        format!("{}-user.yml", profile)
    }

    /// Load configuration for `profile` with fallback chain
    pub fn load(profile: &str, cwd: &Path, config_file: Option<&PathBuf>) -> Result<Self> {
        debug!(%profile, ?cwd, ?config_file, "Config::load: called");
        Self::load_with_search_dirs(profile, config_file, &search_dirs(cwd))
    }

    /// Same chain as `load`, searching `search` in order instead of the standard locations
    pub fn load_with_search_dirs(
        profile: &str,
        config_file: Option<&PathBuf>,
        search: &[PathBuf],
    ) -> Result<Self> {
        validate_profile_name(profile)?;

        // Explicit file wins and its errors are not swallowed
        if let Some(path) = config_file {
            let value = read_yaml(path).context(format!("Failed to load config from {}", path.display()))?;
            return from_value(value, path);
        }

        for dir in search {
            match Self::load_from_dir(dir, profile) {
                Ok(Some(config)) => return Ok(config),
                Ok(None) => {}
                Err(e) => {
                    return Err(e.wrap_err(format!(
                        "Failed to load profile '{}' from {}",
                        profile,
                        dir.display()
                    )));
                }
            }
        }

        if profile == DEFAULT_PROFILE {
            info!("No config file found for profile '{}', using bootstrap config", profile);
            return Ok(Self::bootstrap());
        }

        Err(eyre!(
            "No configuration found for profile '{}' (looked for {})",
            profile,
            Self::app_file_name(profile)
        ))
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are ignored here; the full `load` reports them later.
    pub fn load_log_level(profile: &str, cwd: &Path, config_file: Option<&PathBuf>) -> Option<String> {
        Self::load(profile, cwd, config_file).ok().and_then(|c| c.log_level)
    }

    /// Load `{profile}-app.yml` from `dir`, overlaying `{profile}-user.yml` when present
    ///
    /// Returns `Ok(None)` when the app file does not exist.
    fn load_from_dir(dir: &Path, profile: &str) -> Result<Option<Self>> {
        let app_path = dir.join(Self::app_file_name(profile));
        if !app_path.exists() {
            debug!(?app_path, "Config::load_from_dir: app config absent");
            return Ok(None);
        }

        let mut value = read_yaml(&app_path)?;

        let user_path = dir.join(Self::user_file_name(profile));
        if user_path.exists() {
            debug!(?user_path, "Config::load_from_dir: merging user overlay");
            let overlay = read_yaml(&user_path)?;
            merge_yaml(&mut value, overlay);
        }

        from_value(value, &app_path).map(Some)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn search_dirs(cwd: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(PROJECT_CONFIG_DIR)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("breakdown"));
    }
    candidates
}

/// Profile names become file name prefixes, so they must stay a single plain segment
pub fn validate_profile_name(profile: &str) -> Result<()> {
    let valid = !profile.is_empty()
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !profile.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(eyre!("Invalid profile name '{}'", profile))
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    if content.trim().is_empty() {
        warn!("Config file {} is empty", path.display());
        return Ok(Value::Mapping(Default::default()));
    }
    serde_yaml::from_str(&content).context("Failed to parse config file")
}

fn from_value(value: Value, path: &Path) -> Result<Config> {
    let config: Config = serde_yaml::from_value(value).context(format!("Invalid config in {}", path.display()))?;
    info!("Loaded config from: {}", path.display());
    Ok(config)
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
