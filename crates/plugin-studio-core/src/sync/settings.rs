//! Read-only view of Claude Code's `settings.json`
//!
//! ```json
//! {
//!   "enabledPlugins": {
//!     "plugin-a@my-market": true,
//!     "plugin-b@my-market": false
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

const ENABLED_PLUGINS: &str = "enabledPlugins";

#[derive(Debug, Clone)]
pub struct SettingsReader {
    settings_path: PathBuf,
}

impl SettingsReader {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Plugins enabled for `marketplace`, sorted by name. Unreadable
    /// settings yield an empty list.
    pub fn get_installed_plugins(&self, marketplace: &str) -> Vec<String> {
        let Some(settings) = self.load_settings() else {
            return Vec::new();
        };
        let Some(enabled) = settings.get(ENABLED_PLUGINS).and_then(Value::as_object) else {
            return Vec::new();
        };

        let suffix = format!("@{marketplace}");
        let mut plugins: Vec<String> = enabled
            .iter()
            .filter(|(_, value)| is_enabled(value))
            .filter_map(|(key, _)| key.strip_suffix(&suffix))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        plugins.sort();
        plugins
    }

    fn load_settings(&self) -> Option<Value> {
        let content = match fs::read_to_string(&self.settings_path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.settings_path.display(), error = %e, "Settings not readable");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(path = %self.settings_path.display(), error = %e, "Settings not valid JSON");
                None
            }
        }
    }
}

/// JSON truthiness
fn is_enabled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reader_with(content: &str) -> (SettingsReader, TempDir) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, content).unwrap();
        (SettingsReader::new(path), tmp)
    }

    #[test]
    fn filters_by_marketplace_and_enabled() {
        let (reader, _tmp) = reader_with(
            r#"{
                "enabledPlugins": {
                    "plugin-a@m": true,
                    "plugin-b@m": false,
                    "plugin-c@other": true
                }
            }"#,
        );

        assert_eq!(reader.get_installed_plugins("m"), vec!["plugin-a"]);
    }

    #[test]
    fn output_is_sorted() {
        let (reader, _tmp) = reader_with(
            r#"{"enabledPlugins": {"zeta@m": true, "alpha@m": true, "mid@m": 1}}"#,
        );

        assert_eq!(reader.get_installed_plugins("m"), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn suffix_must_match_whole_marketplace() {
        let (reader, _tmp) = reader_with(
            r#"{"enabledPlugins": {"a@my-m": true, "b@m": true, "@m": true}}"#,
        );

        assert_eq!(reader.get_installed_plugins("m"), vec!["b"]);
    }

    #[test]
    fn unreadable_settings_are_empty() {
        let tmp = TempDir::new().unwrap();
        let missing = SettingsReader::new(tmp.path().join("nope.json"));
        assert!(missing.get_installed_plugins("m").is_empty());

        let (broken, _tmp) = reader_with("{ not json");
        assert!(broken.get_installed_plugins("m").is_empty());

        let (no_key, _tmp) = reader_with(r#"{"theme": "dark"}"#);
        assert!(no_key.get_installed_plugins("m").is_empty());
    }
}
