use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::claude::DEFAULT_BINARY;
use crate::error::{Result, StudioError};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "CPS_CONFIG";

const CONFIG_DIR: &str = ".claude-plugin-studio";
const CONFIG_FILE: &str = "config.toml";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StudioConfig {
    #[serde(default)]
    pub claude: ClaudeConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// External `claude` CLI settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaudeConfig {
    #[serde(default = "default_binary")]
    pub binary: String,

    #[serde(default = "default_validate_timeout")]
    pub validate_timeout_secs: u64,

    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
}

fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_validate_timeout() -> u64 {
    30
}

fn default_install_timeout() -> u64 {
    60
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            validate_timeout_secs: default_validate_timeout(),
            install_timeout_secs: default_install_timeout(),
        }
    }
}

/// Overrides for home-derived paths. `~/` expands to the home directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

fn default_debounce() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

impl StudioConfig {
    /// Load config from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: StudioConfig =
            toml::from_str(&content).map_err(|e| StudioError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(config)
    }

    /// Resolve the config location: explicit path, then `CPS_CONFIG`, then
    /// `~/.claude-plugin-studio/config.toml`
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Plugin cache root, `~/.claude/plugins/cache` unless overridden
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.paths.cache_root {
            Some(path) => expand_home(path),
            None => Ok(home_dir()?.join(".claude").join("plugins").join("cache")),
        }
    }

    /// Claude settings file, `~/.claude/settings.json` unless overridden
    pub fn settings_file(&self) -> Result<PathBuf> {
        match &self.paths.settings_file {
            Some(path) => expand_home(path),
            None => Ok(home_dir()?.join(".claude").join("settings.json")),
        }
    }

    pub fn validate_timeout(&self) -> Duration {
        Duration::from_secs(self.claude.validate_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.claude.install_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(StudioError::HomeNotFound)
}

fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = StudioConfig::load(&tmp.path().join("config.toml")).unwrap();

        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.claude.binary, "claude");
        assert_eq!(config.validate_timeout(), Duration::from_secs(30));
        assert_eq!(config.install_timeout(), Duration::from_secs(60));
        assert_eq!(config.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[claude]
binary = "/opt/claude/bin/claude"

[watch]
debounce_ms = 50
"#,
        )
        .unwrap();

        let config = StudioConfig::load(&path).unwrap();
        assert_eq!(config.claude.binary, "/opt/claude/bin/claude");
        assert_eq!(config.claude.validate_timeout_secs, 30);
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert!(config.paths.cache_root.is_none());
    }

    #[test]
    fn malformed_file_is_config_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[watch]\ndebounce_ms = \"soon\"\n").unwrap();

        let err = StudioConfig::load(&path).unwrap_err();
        assert!(matches!(err, StudioError::ConfigParse { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn path_overrides() {
        let config = StudioConfig {
            paths: PathsConfig {
                cache_root: Some("/tmp/cache".into()),
                settings_file: Some("relative/settings.json".into()),
            },
            ..Default::default()
        };

        assert_eq!(config.cache_root().unwrap(), PathBuf::from("/tmp/cache"));
        assert_eq!(
            config.settings_file().unwrap(),
            PathBuf::from("relative/settings.json")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~/x/y").unwrap(), home.join("x/y"));
        assert_eq!(expand_home("~").unwrap(), home);
        assert_eq!(expand_home("/abs/~/x").unwrap(), PathBuf::from("/abs/~/x"));
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = Path::new("/etc/cps.toml");
        assert_eq!(
            StudioConfig::resolve_path(Some(explicit)).unwrap(),
            PathBuf::from("/etc/cps.toml")
        );
    }
}
