//! Validation pipeline
//!
//! Three layers run in order, cheapest first:
//!
//! - `schema`: manifest JSON shape and naming rules
//! - `structure`: referenced paths exist on disk
//! - `claude_cli`: `claude plugin validate` (skipped when not installed)
//!
//! The first failing layer's result is returned as-is, so a caller only
//! ever sees errors from one layer at a time.

pub mod claude_cli;
pub mod schema;
pub mod structure;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::claude::ClaudeCli;
use crate::config::StudioConfig;
use crate::manifest::{
    manifest_path, read_json, MarketplaceManifest, PluginManifest, MARKETPLACE_JSON, PLUGIN_JSON,
};
use crate::types::{DiscoveredItem, ItemKind, ValidationError, ValidationResult};

pub use claude_cli::{ClaudeCliValidator, ExternalValidation, ExternalValidator};
pub use schema::{is_kebab_case, SchemaValidator};
pub use structure::StructureValidator;

pub struct Validator<E = ClaudeCliValidator> {
    schema: SchemaValidator,
    structure: StructureValidator,
    external: E,
}

impl Validator<ClaudeCliValidator> {
    pub fn from_config(config: &StudioConfig) -> Self {
        Self::with_external(ClaudeCliValidator::new(
            ClaudeCli::new(&config.claude.binary),
            config.validate_timeout(),
        ))
    }
}

impl Default for Validator<ClaudeCliValidator> {
    fn default() -> Self {
        Self::with_external(ClaudeCliValidator::default())
    }
}

impl<E: ExternalValidator> Validator<E> {
    pub fn with_external(external: E) -> Self {
        Self {
            schema: SchemaValidator::new(),
            structure: StructureValidator::new(),
            external,
        }
    }

    pub async fn validate_item(&self, item: &DiscoveredItem) -> ValidationResult {
        match item.kind {
            ItemKind::Plugin => self.validate_plugin(&item.path).await,
            ItemKind::Marketplace => self.validate_marketplace(&item.path).await,
        }
    }

    pub async fn validate_plugin(&self, plugin_root: &Path) -> ValidationResult {
        let value = match load_manifest(plugin_root, PLUGIN_JSON) {
            Ok(value) => value,
            Err(failure) => return failure,
        };

        let schema = self.schema.validate_plugin(&value);
        if !schema.valid {
            return schema;
        }

        let manifest: PluginManifest = match typed(value, PLUGIN_JSON) {
            Ok(manifest) => manifest,
            Err(failure) => return failure,
        };

        let structure = self.structure.validate_plugin(plugin_root, &manifest);
        if !structure.valid {
            return structure;
        }

        self.external_layer(plugin_root).await
    }

    pub async fn validate_marketplace(&self, marketplace_root: &Path) -> ValidationResult {
        let value = match load_manifest(marketplace_root, MARKETPLACE_JSON) {
            Ok(value) => value,
            Err(failure) => return failure,
        };

        let schema = self.schema.validate_marketplace(&value);
        if !schema.valid {
            return schema;
        }

        let manifest: MarketplaceManifest = match typed(value, MARKETPLACE_JSON) {
            Ok(manifest) => manifest,
            Err(failure) => return failure,
        };

        let structure = self
            .structure
            .validate_marketplace(marketplace_root, &manifest);
        if !structure.valid {
            return structure;
        }

        self.external_layer(marketplace_root).await
    }

    async fn external_layer(&self, root: &Path) -> ValidationResult {
        let outcome = self.external.validate(root).await;
        if outcome.skipped {
            debug!(path = %root.display(), "External validation skipped");
        }
        if !outcome.result.valid {
            return outcome.result;
        }
        ValidationResult::ok()
    }
}

fn load_manifest(root: &Path, file: &str) -> Result<Value, ValidationResult> {
    read_json(&manifest_path(root, file)).map_err(|e| {
        ValidationResult::failed(ValidationError::schema(format!(
            "Failed to read {file}: {e}"
        )))
    })
}

fn typed<T: DeserializeOwned>(value: Value, file: &str) -> Result<T, ValidationResult> {
    serde_json::from_value(value).map_err(|e| {
        ValidationResult::failed(ValidationError::schema(format!(
            "Failed to parse {file}: {e}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationLayer;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Records calls and returns a fixed outcome
    #[derive(Clone)]
    struct FakeExternal {
        outcome: ExternalValidation,
        calls: Arc<AtomicUsize>,
    }

    impl FakeExternal {
        fn new(outcome: ExternalValidation) -> Self {
            Self {
                outcome,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ExternalValidator for FakeExternal {
        async fn validate(&self, _path: &Path) -> ExternalValidation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn skipped_validator() -> Validator<FakeExternal> {
        Validator::with_external(FakeExternal::new(ExternalValidation::skipped()))
    }

    #[tokio::test]
    async fn unreadable_manifest_is_a_schema_error() {
        let tmp = TempDir::new().unwrap();
        let result = skipped_validator().validate_plugin(tmp.path()).await;

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].layer, ValidationLayer::Schema);
        assert!(result.errors[0]
            .message
            .starts_with("Failed to read plugin.json"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_schema_error() {
        let tmp = TempDir::new().unwrap();
        write(&manifest_path(tmp.path(), PLUGIN_JSON), "{ nope");

        let result = skipped_validator().validate_plugin(tmp.path()).await;
        assert_eq!(result.errors[0].layer, ValidationLayer::Schema);
    }

    #[tokio::test]
    async fn schema_failure_stops_before_structure() {
        let tmp = TempDir::new().unwrap();
        write(
            &manifest_path(tmp.path(), PLUGIN_JSON),
            r#"{"name": "Bad Name", "skills": "./missing"}"#,
        );
        let external = FakeExternal::new(ExternalValidation::skipped());
        let calls = Arc::clone(&external.calls);

        let result = Validator::with_external(external)
            .validate_plugin(tmp.path())
            .await;

        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .all(|e| e.layer == ValidationLayer::Schema));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn structure_failure_stops_before_external() {
        let tmp = TempDir::new().unwrap();
        write(
            &manifest_path(tmp.path(), PLUGIN_JSON),
            r#"{"name": "good-name", "skills": "./missing"}"#,
        );
        let external = FakeExternal::new(ExternalValidation::skipped());
        let calls = Arc::clone(&external.calls);

        let result = Validator::with_external(external)
            .validate_plugin(tmp.path())
            .await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].layer, ValidationLayer::Structure);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn external_failure_is_returned() {
        let tmp = TempDir::new().unwrap();
        write(&manifest_path(tmp.path(), PLUGIN_JSON), r#"{"name": "ok"}"#);
        let failing = ExternalValidation::checked(ValidationResult::failed(
            ValidationError::claude_cli("Error: bad hooks"),
        ));

        let result = Validator::with_external(FakeExternal::new(failing))
            .validate_plugin(tmp.path())
            .await;

        assert!(!result.valid);
        assert_eq!(result.errors[0].layer, ValidationLayer::ClaudeCli);
    }

    #[tokio::test]
    async fn marketplace_with_valid_plugin_end_to_end() {
        let tmp = TempDir::new().unwrap();
        write(
            &manifest_path(tmp.path(), MARKETPLACE_JSON),
            r#"{
                "name": "my-market",
                "owner": {"name": "Owner"},
                "plugins": [{"name": "my-plugin", "source": "./my-plugin"}]
            }"#,
        );
        let plugin_root = tmp.path().join("my-plugin");
        write(
            &manifest_path(&plugin_root, PLUGIN_JSON),
            r#"{"name": "my-plugin", "version": "1.0.0", "skills": "./skills"}"#,
        );
        write(&plugin_root.join("skills").join("a").join("SKILL.md"), "# A");

        // Deep validation against a binary that does not exist is skipped
        let validator = Validator::with_external(ClaudeCliValidator::new(
            ClaudeCli::new("cps-test-missing-claude-binary"),
            claude_cli::VALIDATE_TIMEOUT,
        ));

        let result = validator.validate_marketplace(tmp.path()).await;
        assert_eq!(result, ValidationResult::ok());

        let result = validator.validate_plugin(&plugin_root).await;
        assert_eq!(result, ValidationResult::ok());
    }

    #[tokio::test]
    async fn marketplace_missing_source_is_structure_error() {
        let tmp = TempDir::new().unwrap();
        write(
            &manifest_path(tmp.path(), MARKETPLACE_JSON),
            r#"{
                "name": "my-market",
                "owner": {"name": "Owner"},
                "plugins": [{"name": "ghost", "source": "./ghost"}]
            }"#,
        );

        let result = skipped_validator().validate_marketplace(tmp.path()).await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].layer, ValidationLayer::Structure);
        assert_eq!(result.errors[0].path.as_deref(), Some("plugins.ghost.source"));
    }

    #[tokio::test]
    async fn validate_item_dispatches_on_kind() {
        let tmp = TempDir::new().unwrap();
        write(
            &manifest_path(tmp.path(), MARKETPLACE_JSON),
            r#"{"name": "m", "owner": {"name": "o"}, "plugins": []}"#,
        );
        let item = DiscoveredItem {
            kind: ItemKind::Marketplace,
            name: "m".into(),
            path: tmp.path().to_path_buf(),
            manifest_path: manifest_path(tmp.path(), MARKETPLACE_JSON),
        };

        assert!(skipped_validator().validate_item(&item).await.valid);

        let as_plugin = DiscoveredItem {
            kind: ItemKind::Plugin,
            ..item
        };
        let result = skipped_validator().validate_item(&as_plugin).await;
        assert!(result.errors[0].message.contains("plugin.json"));
    }
}
