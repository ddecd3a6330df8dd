//! Plugin / marketplace discovery
//!
//! Walks a directory tree and classifies every `.claude-plugin/` directory
//! by the manifest it holds. `marketplace.json` wins over `plugin.json`.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::{read_json, PLUGIN_DIR};
use crate::types::{DiscoveredItem, ItemKind};

/// Directories never descended into
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git"];

const UNKNOWN_NAME: &str = "unknown";

pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Depth-first scan in file-name order. Unreadable directories are
    /// treated as empty.
    pub fn scan(&self) -> Vec<DiscoveredItem> {
        let mut items = Vec::new();
        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if EXCLUDED_DIRS.contains(&name.as_ref()) {
                walker.skip_current_dir();
                continue;
            }

            if name == PLUGIN_DIR {
                if let Some(item) = classify(entry.path()) {
                    debug!(kind = %item.kind, name = %item.name, path = %item.path.display(), "Discovered item");
                    items.push(item);
                }
                walker.skip_current_dir();
            }
        }

        items
    }
}

/// Classify the parent of a `.claude-plugin/` directory
fn classify(plugin_dir: &Path) -> Option<DiscoveredItem> {
    let parent = plugin_dir.parent()?;

    for kind in [ItemKind::Marketplace, ItemKind::Plugin] {
        let manifest_path = plugin_dir.join(kind.manifest_file());
        let Ok(manifest) = read_json(&manifest_path) else {
            continue;
        };

        let name = manifest
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_NAME)
            .to_string();

        return Some(DiscoveredItem {
            kind,
            name,
            path: parent.to_path_buf(),
            manifest_path,
        });
    }

    None
}
