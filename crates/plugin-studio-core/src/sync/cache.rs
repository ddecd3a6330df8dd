//! Claude Code's plugin cache (`~/.claude/plugins/cache/<marketplace>`)

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, StudioError};
use crate::types::SyncResult;

#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_root: PathBuf,
}

impl CacheManager {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Cache directory of a marketplace. The name must be a single plain
    /// path component so the result stays directly under the cache root.
    pub fn cache_path(&self, marketplace: &str) -> Result<PathBuf> {
        Ok(self.cache_root.join(cache_component(marketplace)?))
    }

    pub fn plugin_cache_path(&self, marketplace: &str, plugin: &str) -> Result<PathBuf> {
        Ok(self.cache_path(marketplace)?.join(cache_component(plugin)?))
    }

    pub fn cache_exists(&self, marketplace: &str) -> bool {
        self.cache_path(marketplace)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Remove a marketplace's cache. A cache that is already gone counts
    /// as cleared.
    pub fn clear_cache(&self, marketplace: &str) -> SyncResult {
        let path = match self.cache_path(marketplace) {
            Ok(path) => path,
            Err(e) => {
                warn!(marketplace, "Refusing to clear cache outside the cache root");
                return SyncResult::failed(format!("Failed to clear cache: {}", e));
            }
        };
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Cache cleared");
                SyncResult::ok(format!("Cleared cache: {}", path.display()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                SyncResult::ok(format!("Cleared cache: {}", path.display()))
            }
            Err(e) => SyncResult::failed(format!("Failed to clear cache: {}", e)),
        }
    }
}

fn cache_component(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(name),
        _ => Err(StudioError::InvalidCacheName {
            name: name.to_string(),
        }),
    }
}
