// Configuration loading and parsing (config/workbench.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

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
// Config sections
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire workbench.toml file.
#[derive(Debug, Clone, Deserialize)]
struct WorkbenchFile {
    seasons: SeasonRange,
    data: DataConfig,
    boards: Vec<BoardConfig>,
    fetch: FetchConfig,
}

/// Inclusive range of seasons to aggregate.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SeasonRange {
    pub first: u16,
    pub last: u16,
}

impl SeasonRange {
    pub fn contains(&self, season: u16) -> bool {
        (self.first..=self.last).contains(&season)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path to the play-by-play CSV exported from the upstream provider.
    pub plays: String,
    /// When set, rendered tables are also written to this directory as CSV.
    #[serde(default)]
    pub export_dir: Option<String>,
}

/// Which parsing strategy a ranking page requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardStrategy {
    /// First `<table>` element on the page, one prospect per row.
    Table,
    /// Free-text entries selected by CSS selector, "N. Name, POS, ..." lines.
    Text,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub url: String,
    pub strategy: BoardStrategy,
    /// CSS selector for the text strategy (ignored by the table strategy).
    #[serde(default)]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Directory of recorded pages, keyed by URL-derived file names.
    #[serde(default)]
    pub fixture_dir: Option<String>,
    /// When true, never touch the network; every page must have a fixture.
    #[serde(default)]
    pub offline: bool,
}

/// The assembled, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub seasons: SeasonRange,
    pub data: DataConfig,
    pub boards: Vec<BoardConfig>,
    pub fetch: FetchConfig,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/workbench.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization
/// automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("workbench.toml");
    let text = read_file(&path)?;
    let file: WorkbenchFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        seasons: file.seasons,
        data: file.data,
        boards: file.boards,
        fetch: file.fetch,
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
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, keep the user's copy
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the given base directory,
/// copying default config files first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
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
    if config.seasons.first > config.seasons.last {
        return Err(ConfigError::ValidationError {
            field: "seasons".into(),
            message: format!(
                "first season {} is after last season {}",
                config.seasons.first, config.seasons.last
            ),
        });
    }

    if config.data.plays.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.plays".into(),
            message: "must not be empty".into(),
        });
    }

    if config.boards.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "boards".into(),
            message: "at least one ranking source is required".into(),
        });
    }

    for board in &config.boards {
        if board.name.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "boards.name".into(),
                message: "must not be empty".into(),
            });
        }
        if board.url.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("boards.{}.url", board.name),
                message: "must not be empty".into(),
            });
        }
        if board.strategy == BoardStrategy::Text
            && board.selector.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::ValidationError {
                field: format!("boards.{}.selector", board.name),
                message: "text strategy requires a CSS selector".into(),
            });
        }
    }

    if config.fetch.user_agent.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "fetch.user_agent".into(),
            message: "must not be empty".into(),
        });
    }

    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "fetch.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.fetch.offline && config.fetch.fixture_dir.is_none() {
        return Err(ConfigError::ValidationError {
            field: "fetch.offline".into(),
            message: "offline mode requires fetch.fixture_dir".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
