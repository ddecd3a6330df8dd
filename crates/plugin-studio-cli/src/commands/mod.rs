pub mod create;
pub mod validate;
pub mod watch;

use std::path::{Path, PathBuf};

use plugin_studio_core::{DiscoveredItem, Result, Scanner, StudioConfig, StudioError};

use crate::logger::Logger;

/// Shared state for a single `cps` invocation
pub struct Context {
    pub root: PathBuf,
    pub config: StudioConfig,
    pub logger: Logger,
}

impl Context {
    /// Resolve the scan root and load the config file
    pub fn new(dir: Option<PathBuf>, config: Option<&Path>, logger: Logger) -> Result<Self> {
        let root = match dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let config_path = StudioConfig::resolve_path(config)?;
        let config = StudioConfig::load(&config_path)?;
        logger.debug(&format!("Config: {}", config_path.display()));

        Ok(Self {
            root,
            config,
            logger,
        })
    }

    /// Scan the root, failing when nothing is found
    pub fn scan(&self) -> Result<Vec<DiscoveredItem>> {
        self.logger.info("Scanning for plugins and marketplaces...");
        let items = Scanner::new(&self.root).scan();
        if items.is_empty() {
            return Err(StudioError::NothingFound {
                root: self.root.clone(),
            });
        }
        self.logger.debug(&format!("Found {} item(s)", items.len()));
        Ok(items)
    }
}
