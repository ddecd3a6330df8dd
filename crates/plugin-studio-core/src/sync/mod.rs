//! Make Claude Code pick up local changes
//!
//! A marketplace is re-registered from scratch: its cache is cleared, it is
//! removed and added again, then its plugins are reinstalled. Plugins
//! outside a marketplace cannot be reloaded by the host and only produce a
//! restart hint.

pub mod cache;
pub mod installer;
pub mod settings;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::claude::ClaudeCli;
use crate::config::StudioConfig;
use crate::error::Result;
use crate::manifest::MarketplaceManifest;
use crate::types::{DiscoveredItem, ItemKind, SyncResult};

pub use cache::CacheManager;
pub use installer::{Installer, INSTALL_TIMEOUT};
pub use settings::SettingsReader;

#[derive(Debug, Clone)]
pub struct Syncer {
    cache: CacheManager,
    installer: Installer,
    settings: SettingsReader,
}

impl Syncer {
    pub fn new(cache: CacheManager, installer: Installer, settings: SettingsReader) -> Self {
        Self {
            cache,
            installer,
            settings,
        }
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        Ok(Self::new(
            CacheManager::new(config.cache_root()?),
            Installer::new(
                ClaudeCli::new(&config.claude.binary),
                config.install_timeout(),
            ),
            SettingsReader::new(config.settings_file()?),
        ))
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    pub async fn sync_item(&self, item: &DiscoveredItem) -> SyncResult {
        match item.kind {
            ItemKind::Marketplace => self.sync_marketplace(&item.name, &item.path).await,
            ItemKind::Plugin => self.sync_plugin(&item.name, &item.path).await,
        }
    }

    pub async fn sync_marketplace(&self, name: &str, path: &Path) -> SyncResult {
        let cleared = self.cache.clear_cache(name);
        if !cleared.success {
            return cleared;
        }

        let removed = self.installer.remove_marketplace(name).await;
        debug!(marketplace = name, message = %removed.message, "Marketplace removed");

        let added = self.installer.add_marketplace(path).await;
        if !added.success {
            return added;
        }

        let plugins = self.plugins_to_install(name, path);
        let mut warnings = Vec::new();
        for plugin in &plugins {
            let installed = self.installer.install_plugin(plugin, name).await;
            if installed.success {
                debug!(marketplace = name, plugin = %plugin, "Plugin installed");
            } else {
                warn!(marketplace = name, plugin = %plugin, message = %installed.message, "Plugin install failed");
                warnings.push(installed.message);
            }
        }

        info!(marketplace = name, plugins = plugins.len(), failed = warnings.len(), "Marketplace synced");
        let message = if warnings.is_empty() {
            format!("Synced {name}")
        } else {
            format!(
                "Synced {name} ({} of {} plugins failed to install)",
                warnings.len(),
                plugins.len()
            )
        };
        SyncResult::ok(message).with_warnings(warnings)
    }

    /// Standalone plugins have no reload command; the user restarts the host.
    pub async fn sync_plugin(&self, name: &str, path: &Path) -> SyncResult {
        SyncResult::ok(format!("Plugin {name} change detected. Restart Claude Code.")).with_warnings(
            vec![format!(
                "Load it for development with: claude --plugin-dir \"{}\"",
                path.display()
            )],
        )
    }

    /// Plugins listed in the marketplace manifest, falling back to the ones
    /// enabled in settings when the manifest cannot be read
    pub fn plugins_to_install(&self, name: &str, path: &Path) -> Vec<String> {
        match MarketplaceManifest::load(path) {
            Ok(manifest) => manifest.plugin_names(),
            Err(e) => {
                debug!(marketplace = name, error = %e, "Using enabled plugins from settings");
                self.settings.get_installed_plugins(name)
            }
        }
    }
}
