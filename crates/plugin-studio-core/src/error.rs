use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("No plugins or marketplaces found under {root}")]
    NothingFound { root: PathBuf },

    #[error("No items selected")]
    NothingSelected,

    #[error("Validation failed for {count} item(s)")]
    ValidationFailed { count: usize },

    #[error("Invalid name: '{name}' - must be kebab-case (lowercase letters, numbers, hyphens)")]
    InvalidName { name: String },

    #[error("Invalid cache directory name: '{name}'")]
    InvalidCacheName { name: String },

    #[error("Plugin already exists: {name}")]
    PluginExists { name: String },

    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Claude CLI not found: {binary}")]
    ClaudeNotFound { binary: String },

    #[error("{command} timed out after {secs}s")]
    ClaudeTimeout { command: String, secs: u64 },

    #[error("Claude CLI execution failed: {message}")]
    ClaudeExecutionFailed { message: String },

    #[error("File watcher error: {0}")]
    Watch(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, StudioError>;

impl StudioError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigParse { .. } | Self::TomlDe(_) => 2,
            Self::HomeNotFound => 3,
            Self::InvalidName { .. } => 5,
            Self::PluginExists { .. } => 6,
            Self::Prompt(_) => 130,
            _ => 1,
        }
    }
}
