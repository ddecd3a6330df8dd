//! Manifest and skill templates for new marketplaces and plugins

use serde_json::{json, Map, Value};

use crate::error::Result;

pub const SAMPLE_SKILL_NAME: &str = "summarize-project";

const SAMPLE_SKILL: &str = r#"---
name: summarize-project
description: Summarize the current project structure and purpose
---

# Summarize Project

Analyze the current project and provide a concise summary.

## Instructions

1. Read the project's README.md if it exists
2. Scan the directory structure to understand the layout
3. Look for Cargo.toml, package.json, pyproject.toml, or similar config files
4. Provide a brief summary including:
   - What the project does
   - Main technologies used
   - Key directories and their purposes

Keep the summary under 200 words.
"#;

/// `.claude-plugin/marketplace.json` with no plugins
pub fn marketplace_json(
    name: &str,
    owner: &str,
    email: Option<&str>,
    description: Option<&str>,
) -> Result<String> {
    let mut owner_value = Map::new();
    owner_value.insert("name".into(), json!(owner));
    if let Some(email) = non_empty(email) {
        owner_value.insert("email".into(), json!(email));
    }

    let mut manifest = Map::new();
    manifest.insert("name".into(), json!(name));
    manifest.insert("owner".into(), Value::Object(owner_value));
    if let Some(description) = non_empty(description) {
        manifest.insert("metadata".into(), json!({ "description": description }));
    }
    manifest.insert("plugins".into(), json!([]));

    pretty(&Value::Object(manifest))
}

/// `.claude-plugin/plugin.json` pointing at the plugin's `skills` directory
pub fn plugin_json(name: &str, description: Option<&str>) -> Result<String> {
    let mut manifest = Map::new();
    manifest.insert("name".into(), json!(name));
    manifest.insert("version".into(), json!("1.0.0"));
    if let Some(description) = non_empty(description) {
        manifest.insert("description".into(), json!(description));
    }
    manifest.insert("skills".into(), json!("./skills"));

    pretty(&Value::Object(manifest))
}

pub fn sample_skill() -> &'static str {
    SAMPLE_SKILL
}

/// Marketplace `plugins` entry for a plugin living next to the manifest
pub fn plugin_entry(name: &str, description: Option<&str>) -> Value {
    let mut entry = Map::new();
    entry.insert("name".into(), json!(name));
    entry.insert("source".into(), json!(format!("./{name}")));
    if let Some(description) = non_empty(description) {
        entry.insert("description".into(), json!(description));
    }
    Value::Object(entry)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn pretty(value: &Value) -> Result<String> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    Ok(content)
}
