//! Structure layer: paths referenced by a manifest must exist on disk.

use std::path::Path;

use crate::manifest::{ComponentPaths, ConfigRef, MarketplaceManifest, PluginManifest};
use crate::types::{ValidationError, ValidationResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct StructureValidator;

impl StructureValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_plugin(&self, plugin_root: &Path, manifest: &PluginManifest) -> ValidationResult {
        let mut errors = Vec::new();

        let hooks = manifest
            .hooks
            .as_ref()
            .map(|hooks| hooks.component_paths())
            .unwrap_or_default();
        let components = [
            ("commands", &manifest.commands),
            ("agents", &manifest.agents),
            ("skills", &manifest.skills),
            ("hooks", &hooks),
        ];
        for (field, paths) in components {
            match paths {
                ComponentPaths::None => {}
                ComponentPaths::Single(p) => {
                    if !plugin_root.join(p).exists() {
                        errors.push(ValidationError::structure(
                            format!("Directory \"{p}\" referenced in \"{field}\" does not exist"),
                            field,
                        ));
                    }
                }
                ComponentPaths::Multiple(list) => {
                    for p in list {
                        if !plugin_root.join(p).exists() {
                            errors.push(ValidationError::structure(
                                format!("Path \"{p}\" referenced in \"{field}\" does not exist"),
                                field,
                            ));
                        }
                    }
                }
            }
        }

        let configs = [
            ("mcpServers", &manifest.mcp_servers),
            ("lspServers", &manifest.lsp_servers),
        ];
        for (field, config) in configs {
            if let Some(p) = config.as_ref().and_then(ConfigRef::as_path) {
                if !plugin_root.join(p).exists() {
                    errors.push(ValidationError::structure(
                        format!("Config file \"{p}\" referenced in \"{field}\" does not exist"),
                        field,
                    ));
                }
            }
        }

        ValidationResult::from_errors(errors)
    }

    /// Only `./` sources are checked; remote sources are always valid.
    pub fn validate_marketplace(
        &self,
        marketplace_root: &Path,
        manifest: &MarketplaceManifest,
    ) -> ValidationResult {
        let base = marketplace_root.join(manifest.plugin_root());

        let errors = manifest
            .plugins
            .iter()
            .filter_map(|plugin| {
                let source = plugin.source.local_path()?;
                if base.join(source).exists() {
                    return None;
                }
                Some(ValidationError::structure(
                    format!(
                        "Plugin \"{}\" source path \"{}\" does not exist",
                        plugin.name, source
                    ),
                    format!("plugins.{}.source", plugin.name),
                ))
            })
            .collect();

        ValidationResult::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn plugin(json: &str) -> PluginManifest {
        serde_json::from_str(json).unwrap()
    }

    fn marketplace(json: &str) -> MarketplaceManifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn missing_skills_dir() {
        let tmp = TempDir::new().unwrap();
        let result = StructureValidator::new()
            .validate_plugin(tmp.path(), &plugin(r#"{"name": "p", "skills": "./skills"}"#));

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("skills"));
        assert_eq!(result.errors[0].path.as_deref(), Some("skills"));
    }

    #[test]
    fn existing_paths_pass() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("skills")).unwrap();
        fs::create_dir_all(tmp.path().join("commands")).unwrap();
        fs::create_dir_all(tmp.path().join("hooks")).unwrap();
        fs::write(tmp.path().join(".mcp.json"), "{}").unwrap();

        let manifest = plugin(
            r#"{
                "name": "p",
                "skills": "./skills",
                "commands": ["./commands"],
                "hooks": "./hooks",
                "mcpServers": "./.mcp.json"
            }"#,
        );

        assert!(StructureValidator::new().validate_plugin(tmp.path(), &manifest).valid);
    }

    #[test]
    fn accumulates_every_missing_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("agents")).unwrap();

        let manifest = plugin(
            r#"{
                "name": "p",
                "commands": ["./a", "./b"],
                "agents": "./agents",
                "lspServers": "./.lsp.json",
                "mcpServers": {"server": {"command": "x"}}
            }"#,
        );

        let result = StructureValidator::new().validate_plugin(tmp.path(), &manifest);
        let paths: Vec<_> = result.errors.iter().filter_map(|e| e.path.as_deref()).collect();

        assert_eq!(paths, vec!["commands", "commands", "lspServers"]);
        assert_eq!(
            result.errors[0].message,
            "Path \"./a\" referenced in \"commands\" does not exist"
        );
        assert_eq!(
            result.errors[2].message,
            "Config file \"./.lsp.json\" referenced in \"lspServers\" does not exist"
        );
    }

    #[test]
    fn hooks_path_list_checks_each_entry() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("hooks")).unwrap();
        fs::write(tmp.path().join("hooks").join("a.json"), "{}").unwrap();

        let manifest = plugin(r#"{"name": "p", "hooks": ["./hooks/a.json", "./hooks/b.json"]}"#);
        let result = StructureValidator::new().validate_plugin(tmp.path(), &manifest);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].message,
            "Path \"./hooks/b.json\" referenced in \"hooks\" does not exist"
        );
        assert_eq!(result.errors[0].path.as_deref(), Some("hooks"));

        let inline = plugin(r#"{"name": "p", "hooks": {"PreToolUse": []}}"#);
        assert!(StructureValidator::new().validate_plugin(tmp.path(), &inline).valid);
    }

    #[test]
    fn remote_source_always_valid() {
        let tmp = TempDir::new().unwrap();
        let manifest = marketplace(
            r#"{
                "name": "m",
                "owner": {"name": "o"},
                "plugins": [{"name": "r", "source": {"source": "github", "repo": "o/r"}}]
            }"#,
        );

        assert!(StructureValidator::new()
            .validate_marketplace(tmp.path(), &manifest)
            .valid);
    }

    #[test]
    fn missing_relative_source() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("present")).unwrap();
        let manifest = marketplace(
            r#"{
                "name": "m",
                "owner": {"name": "o"},
                "plugins": [
                    {"name": "present", "source": "./present"},
                    {"name": "gone", "source": "./gone"},
                    {"name": "bare", "source": "bare-name"}
                ]
            }"#,
        );

        let result = StructureValidator::new().validate_marketplace(tmp.path(), &manifest);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].message,
            "Plugin \"gone\" source path \"./gone\" does not exist"
        );
        assert_eq!(result.errors[0].path.as_deref(), Some("plugins.gone.source"));
    }

    #[test]
    fn sources_resolve_under_plugin_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("plugins").join("a")).unwrap();
        let manifest = marketplace(
            r#"{
                "name": "m",
                "owner": {"name": "o"},
                "plugins": [{"name": "a", "source": "./a"}],
                "metadata": {"pluginRoot": "./plugins"}
            }"#,
        );

        assert!(StructureValidator::new()
            .validate_marketplace(tmp.path(), &manifest)
            .valid);
    }
}
