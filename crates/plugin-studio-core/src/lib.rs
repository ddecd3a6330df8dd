pub mod claude;
pub mod config;
pub mod error;
pub mod manifest;
pub mod scaffold;
pub mod scanner;
pub mod sync;
pub mod templates;
pub mod types;
pub mod validator;
pub mod watcher;

pub use claude::{ClaudeCli, CommandOutput};
pub use config::{StudioConfig, CONFIG_ENV};
pub use error::{Result, StudioError};
pub use manifest::{
    ComponentPaths, ConfigRef, HooksRef, MarketplaceManifest, MarketplacePluginEntry, PluginManifest,
    PluginSource,
};
pub use scaffold::Scaffolder;
pub use scanner::Scanner;
pub use sync::{CacheManager, Installer, SettingsReader, Syncer};
pub use types::{
    DiscoveredItem, ItemKind, SyncResult, ValidationError, ValidationLayer, ValidationResult,
};
pub use validator::{
    is_kebab_case, ClaudeCliValidator, ExternalValidation, ExternalValidator, SchemaValidator,
    StructureValidator, Validator,
};
pub use watcher::{watch_patterns, Debouncer, Watcher, DEFAULT_DEBOUNCE};
