use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use plugin_studio_core::{DiscoveredItem, Result, StudioError, Syncer, Validator, Watcher};

use super::Context;
use crate::logger::Logger;
use crate::prompt::{item_label, Prompt};

/// Scan, pick items, sync once, then keep syncing on change until Ctrl+C
pub async fn run(ctx: &Context) -> Result<()> {
    let items = ctx.scan()?;
    let selected = Prompt::new().select_items(&items)?;
    if selected.is_empty() {
        return Err(StudioError::NothingSelected);
    }

    let pipeline = Arc::new(Pipeline {
        validator: Validator::from_config(&ctx.config),
        syncer: Syncer::from_config(&ctx.config)?,
        logger: ctx.logger,
        selected,
        in_flight: TargetLocks::default(),
    });

    ctx.logger.blank();
    ctx.logger.info(&"Initial sync...".bold().to_string());
    for marketplace in marketplaces_to_sync(&pipeline.selected) {
        pipeline.validate_and_sync(&marketplace).await;
    }

    let mut watcher = Watcher::new(ctx.config.debounce());
    let on_change = {
        let pipeline = Arc::clone(&pipeline);
        move |item: DiscoveredItem, changed: PathBuf| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.handle_change(item, changed).await });
        }
    };
    if watcher.watch(&pipeline.selected, on_change) == 0 {
        return Err(StudioError::Watch("no item could be watched".into()));
    }

    ctx.logger.blank();
    ctx.logger.info(&"Watching:".bold().to_string());
    for item in &pipeline.selected {
        ctx.logger.info(&format!("  {}", item_label(item)));
    }
    ctx.logger.blank();
    ctx.logger.info(&"Press Ctrl+C to stop".bright_black().to_string());
    ctx.logger.blank();

    let signal = tokio::signal::ctrl_c().await;

    ctx.logger.blank();
    ctx.logger.info("Stopping...");
    watcher.stop().await;
    signal?;
    Ok(())
}

struct Pipeline {
    validator: Validator,
    syncer: Syncer,
    logger: Logger,
    selected: Vec<DiscoveredItem>,
    in_flight: TargetLocks,
}

impl Pipeline {
    async fn handle_change(&self, item: DiscoveredItem, changed: PathBuf) {
        debug!(item = %item.name, path = %changed.display(), "Change received");
        self.logger.change(item.relative(&changed));

        let target = match parent_marketplace(&self.selected, &item) {
            Some(parent) => {
                self.logger.info(&format!(
                    "Plugin {} is part of marketplace {}",
                    item.name, parent.name
                ));
                parent
            }
            None => &item,
        };
        self.validate_and_sync(target).await;
    }

    /// Validation errors block the sync. Runs for the same target never
    /// overlap.
    async fn validate_and_sync(&self, target: &DiscoveredItem) {
        let _guard = self.in_flight.lock(&target.path).await;
        debug!(item = %target.name, kind = ?target.kind, "Pipeline started");
        self.logger.info(&format!("Validating {}...", target.name));

        let result = self.validator.validate_item(target).await;
        if !result.valid {
            debug!(item = %target.name, errors = result.errors.len(), "Sync skipped");
            self.logger.validation_errors(&result.errors);
            return;
        }
        self.logger.success("Valid. Syncing...");

        if target.is_marketplace() {
            let installer = self.syncer.installer();
            self.logger
                .command(&installer.build_marketplace_remove_command(&target.name));
            self.logger
                .command(&installer.build_marketplace_add_command(&target.path));
        }

        let synced = self.syncer.sync_item(target).await;
        debug!(item = %target.name, success = synced.success, "Pipeline finished");
        if synced.success {
            self.logger.success(&synced.message);
            for warning in &synced.warnings {
                self.logger.warn(warning);
            }
        } else {
            self.logger.error(&synced.message);
        }
    }
}

/// One async lock per sync target path
#[derive(Default)]
struct TargetLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl TargetLocks {
    async fn lock(&self, target: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(target.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Selected marketplace whose tree contains `item`
pub fn parent_marketplace<'a>(
    selected: &'a [DiscoveredItem],
    item: &DiscoveredItem,
) -> Option<&'a DiscoveredItem> {
    if item.is_marketplace() {
        return None;
    }
    selected
        .iter()
        .find(|candidate| candidate.is_marketplace() && candidate.contains(item))
}

/// Selected marketplaces plus the parents of selected plugins, without
/// duplicates, in selection order
pub fn marketplaces_to_sync(selected: &[DiscoveredItem]) -> Vec<DiscoveredItem> {
    let mut marketplaces: Vec<DiscoveredItem> = Vec::new();
    for item in selected {
        let marketplace = if item.is_marketplace() {
            Some(item)
        } else {
            parent_marketplace(selected, item)
        };
        if let Some(marketplace) = marketplace {
            if !marketplaces.iter().any(|m| m.path == marketplace.path) {
                marketplaces.push(marketplace.clone());
            }
        }
    }
    marketplaces
}
