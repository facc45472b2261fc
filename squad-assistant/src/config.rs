// Configuration loading and parsing (squad.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `credentials.toml`.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub data: DataConfig,
    pub filters: FilterConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// squad.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire squad.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SquadFile {
    llm: LlmConfig,
    session: SessionConfig,
    data: DataConfig,
    filters: FilterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Messages endpoint override, e.g. a local proxy. Defaults to the
    /// public Anthropic API.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub database_path: String,
    pub default_coins: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Reference dataset, `.json` or `.csv`.
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Upper end of the price slider shown as the "full range".
    pub max_price: u64,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

impl CredentialsConfig {
    /// Apply an environment override. A set, non-empty value replaces the
    /// file's key.
    pub fn with_env_override(mut self, env_value: Option<String>) -> Self {
        if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
            self.anthropic_api_key = Some(key.trim().to_string());
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.anthropic_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/squad.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults and ignores the environment. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- squad.toml (required) ---
    let squad_path = config_dir.join("squad.toml");
    let squad_text = read_file(&squad_path)?;
    let squad_file: SquadFile =
        toml::from_str(&squad_text).map_err(|e| ConfigError::ParseError {
            path: squad_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        llm: squad_file.llm,
        session: squad_file.session,
        data: squad_file.data,
        filters: squad_file.filters,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first and applying the `ANTHROPIC_API_KEY` override.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    config.credentials = config
        .credentials
        .with_env_override(std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let non_empty: &[(&str, &str)] = &[
        ("llm.model", &config.llm.model),
        ("session.database_path", &config.session.database_path),
        ("data.reference", &config.data.reference),
    ];
    for (name, val) in non_empty {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".into(),
            message: "must be greater than 0".into(),
        });
    }

    let temp = config.llm.temperature;
    if !(0.0..=1.0).contains(&temp) {
        return Err(ConfigError::ValidationError {
            field: "llm.temperature".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {temp}"),
        });
    }

    if config.filters.max_price == 0 {
        return Err(ConfigError::ValidationError {
            field: "filters.max_price".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
