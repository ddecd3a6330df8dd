//! Shared result and discovery types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::{MARKETPLACE_JSON, PLUGIN_JSON};

/// Kind of a discovered item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Plugin,
    Marketplace,
}

impl ItemKind {
    /// Manifest file name inside `.claude-plugin/`
    pub fn manifest_file(&self) -> &'static str {
        match self {
            ItemKind::Plugin => PLUGIN_JSON,
            ItemKind::Marketplace => MARKETPLACE_JSON,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "plugin",
            ItemKind::Marketplace => "marketplace",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A plugin or marketplace found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredItem {
    pub kind: ItemKind,
    pub name: String,
    /// Item root (parent of `.claude-plugin/`)
    pub path: PathBuf,
    pub manifest_path: PathBuf,
}

impl DiscoveredItem {
    pub fn is_marketplace(&self) -> bool {
        self.kind == ItemKind::Marketplace
    }

    /// True when `other` lives strictly below this item's root
    pub fn contains(&self, other: &DiscoveredItem) -> bool {
        other.path != self.path && other.path.starts_with(&self.path)
    }

    /// Path of `changed` relative to the item root, or `changed` itself
    pub fn relative<'a>(&self, changed: &'a Path) -> &'a Path {
        changed.strip_prefix(&self.path).unwrap_or(changed)
    }
}

/// Validation pipeline layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationLayer {
    Schema,
    Structure,
    ClaudeCli,
}

impl fmt::Display for ValidationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationLayer::Schema => "schema",
            ValidationLayer::Structure => "structure",
            ValidationLayer::ClaudeCli => "claude-cli",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub layer: ValidationLayer,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            layer: ValidationLayer::Schema,
            message: message.into(),
            path: None,
        }
    }

    pub fn structure(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            layer: ValidationLayer::Structure,
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn claude_cli(message: impl Into<String>) -> Self {
        Self {
            layer: ValidationLayer::ClaudeCli,
            message: message.into(),
            path: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.layer, self.message)
    }
}

/// Outcome of one validation call. Errors all come from a single layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
        }
    }

    /// Valid iff `errors` is empty
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Outcome of a sync step or a whole sync
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    /// Non-fatal problems (e.g. a plugin that failed to reinstall)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SyncResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}
