//! Manifest parsing for .claude-plugin/plugin.json and marketplace.json
//!
//! Typed views used after schema validation has passed. Schema checks run
//! on raw `serde_json::Value`s (see `validator::schema`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StudioError};

pub const PLUGIN_DIR: &str = ".claude-plugin";
pub const PLUGIN_JSON: &str = "plugin.json";
pub const MARKETPLACE_JSON: &str = "marketplace.json";

/// `<root>/.claude-plugin/<file>`
pub fn manifest_path(root: &Path, file: &str) -> PathBuf {
    root.join(PLUGIN_DIR).join(file)
}

/// Read and parse a manifest file as untyped JSON
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(StudioError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(value)
}

/// Claude Code plugin manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// Plugin name (required, kebab-case)
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "ComponentPaths::is_empty")]
    pub commands: ComponentPaths,

    #[serde(default, skip_serializing_if = "ComponentPaths::is_empty")]
    pub agents: ComponentPaths,

    #[serde(default, skip_serializing_if = "ComponentPaths::is_empty")]
    pub skills: ComponentPaths,

    /// Hook config path(s) or inline hook table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<ConfigRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsp_servers: Option<ConfigRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Component paths can be a single string or array of strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentPaths {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl ComponentPaths {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ComponentPaths::None => Vec::new(),
            ComponentPaths::Single(s) => vec![s.clone()],
            ComponentPaths::Multiple(v) => v.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ComponentPaths::None => true,
            ComponentPaths::Single(_) => false,
            ComponentPaths::Multiple(v) => v.is_empty(),
        }
    }
}

/// A config-file path or an inline JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigRef {
    Path(String),
    Inline(serde_json::Map<String, Value>),
}

impl ConfigRef {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            ConfigRef::Path(p) => Some(p),
            ConfigRef::Inline(_) => None,
        }
    }
}

/// `hooks` takes the same path forms as components, or an inline table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HooksRef {
    Path(String),
    Paths(Vec<String>),
    Inline(serde_json::Map<String, Value>),
}

impl HooksRef {
    /// Referenced paths; an inline table references none
    pub fn component_paths(&self) -> ComponentPaths {
        match self {
            HooksRef::Path(p) => ComponentPaths::Single(p.clone()),
            HooksRef::Paths(list) => ComponentPaths::Multiple(list.clone()),
            HooksRef::Inline(_) => ComponentPaths::None,
        }
    }
}

impl PluginManifest {
    /// Load `<plugin_root>/.claude-plugin/plugin.json`
    pub fn load(plugin_root: &Path) -> Result<Self> {
        let value = read_json(&manifest_path(plugin_root, PLUGIN_JSON))?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Claude Code plugin marketplace manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceManifest {
    pub name: String,
    pub owner: MarketplaceOwner,
    #[serde(default)]
    pub plugins: Vec<MarketplacePluginEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MarketplaceMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceOwner {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Base directory for relative plugin sources
    #[serde(
        default,
        rename = "pluginRoot",
        skip_serializing_if = "Option::is_none"
    )]
    pub plugin_root: Option<String>,
}

/// Plugin entry in marketplace.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplacePluginEntry {
    pub name: String,
    pub source: PluginSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EntryAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryAuthor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Where a marketplace plugin is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSource {
    /// Path string (e.g., "./plugins/my-plugin")
    Relative(String),
    Remote(RemoteSource),
}

impl PluginSource {
    /// The source path when it is a local `./` path
    pub fn local_path(&self) -> Option<&str> {
        match self {
            PluginSource::Relative(s) if s.starts_with("./") => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    Github,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub source: RemoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl MarketplaceManifest {
    /// Load `<marketplace_root>/.claude-plugin/marketplace.json`
    pub fn load(marketplace_root: &Path) -> Result<Self> {
        let value = read_json(&manifest_path(marketplace_root, MARKETPLACE_JSON))?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn plugin_root(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.plugin_root.as_deref())
            .unwrap_or("")
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name.clone()).collect()
    }
}
