//! Create new marketplaces and plugins on disk
//!
//! Layout produced for a plugin named `my-plugin` under the root:
//!
//! ```text
//! my-plugin/
//! ├── .claude-plugin/plugin.json
//! ├── skills/summarize-project/SKILL.md
//! ├── commands/
//! ├── agents/
//! └── scripts/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::error::{Result, StudioError};
use crate::manifest::{manifest_path, read_json, PLUGIN_JSON, MARKETPLACE_JSON};
use crate::templates::{self, SAMPLE_SKILL_NAME};
use crate::validator::is_kebab_case;

const EMPTY_DIRS: &[&str] = &["commands", "agents", "scripts"];

pub struct Scaffolder {
    root: PathBuf,
}

impl Scaffolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn marketplace_manifest(&self) -> PathBuf {
        manifest_path(&self.root, MARKETPLACE_JSON)
    }

    pub fn has_marketplace(&self) -> bool {
        self.marketplace_manifest().exists()
    }

    /// Write `<root>/.claude-plugin/marketplace.json`
    pub fn create_marketplace(
        &self,
        name: &str,
        owner: &str,
        email: Option<&str>,
        description: Option<&str>,
    ) -> Result<PathBuf> {
        ensure_kebab_case(name)?;

        let path = self.marketplace_manifest();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(
            &path,
            templates::marketplace_json(name, owner, email, description)?,
        )?;

        info!(marketplace = name, path = %path.display(), "Marketplace created");
        Ok(path)
    }

    /// Create `<root>/<name>` with a manifest and a sample skill
    ///
    /// # Errors
    /// * `InvalidName` - `name` is not kebab-case
    /// * `PluginExists` - `<root>/<name>` already exists
    pub fn create_plugin(&self, name: &str, description: Option<&str>) -> Result<PathBuf> {
        ensure_kebab_case(name)?;

        let plugin_root = self.root.join(name);
        if plugin_root.exists() {
            return Err(StudioError::PluginExists {
                name: name.to_string(),
            });
        }

        let manifest = manifest_path(&plugin_root, PLUGIN_JSON);
        if let Some(parent) = manifest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&manifest, templates::plugin_json(name, description)?)?;

        let skill_dir = plugin_root.join("skills").join(SAMPLE_SKILL_NAME);
        fs::create_dir_all(&skill_dir)?;
        fs::write(skill_dir.join("SKILL.md"), templates::sample_skill())?;

        for dir in EMPTY_DIRS {
            fs::create_dir_all(plugin_root.join(dir))?;
        }

        info!(plugin = name, path = %plugin_root.display(), "Plugin created");
        Ok(plugin_root)
    }

    /// Append a `./<name>` entry to the marketplace's `plugins`. Fields this
    /// tool does not know about are kept.
    pub fn add_plugin_to_marketplace(&self, name: &str, description: Option<&str>) -> Result<()> {
        let path = self.marketplace_manifest();
        let mut manifest = read_json(&path)?;

        let Value::Object(root) = &mut manifest else {
            return Err(StudioError::InvalidManifest {
                path,
                message: "root must be an object".into(),
            });
        };
        let plugins = root
            .entry("plugins")
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(entries) = plugins else {
            return Err(StudioError::InvalidManifest {
                path,
                message: "\"plugins\" must be an array".into(),
            });
        };
        entries.push(templates::plugin_entry(name, description));

        fs::write(&path, templates::pretty(&manifest)?)?;
        Ok(())
    }

    /// Whether the marketplace already lists a plugin called `name`
    pub fn plugin_exists(&self, name: &str) -> bool {
        let Ok(manifest) = read_json(&self.marketplace_manifest()) else {
            return false;
        };
        manifest
            .get("plugins")
            .and_then(Value::as_array)
            .is_some_and(|entries| {
                entries
                    .iter()
                    .any(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
            })
    }
}

fn ensure_kebab_case(name: &str) -> Result<()> {
    if is_kebab_case(name) {
        Ok(())
    } else {
        Err(StudioError::InvalidName {
            name: name.to_string(),
        })
    }
}
