//! Schema layer: checks raw manifest JSON against the fixed plugin and
//! marketplace shapes, collecting every violation.
//!
//! Messages follow `<json-pointer or 'root'>: <rule>`, e.g.
//! `root: must have required property 'name'`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::{ValidationError, ValidationLayer, ValidationResult};

pub const KEBAB_CASE_PATTERN: &str = "^[a-z0-9]+(-[a-z0-9]+)*$";

static KEBAB_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(KEBAB_CASE_PATTERN).expect("kebab-case pattern is valid"));

const REMOTE_SOURCES: &[&str] = &["github", "url"];

pub fn is_kebab_case(name: &str) -> bool {
    KEBAB_CASE.is_match(name)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_plugin(&self, manifest: &Value) -> ValidationResult {
        let mut check = Checker::default();

        if let Some(root) = check.object(manifest, "") {
            check.required(root, "", &["name"]);
            if let Some(name) = check.string(root, "", "name") {
                if !is_kebab_case(name) {
                    check.violation(
                        "/name",
                        format!("must match pattern \"{KEBAB_CASE_PATTERN}\""),
                    );
                }
            }
            for key in ["version", "description", "homepage", "repository", "license"] {
                check.string(root, "", key);
            }
            if let Some(author) = root.get("author") {
                check.author(author, "/author", true);
            }
            check.string_array(root, "", "keywords");
            for key in ["commands", "agents", "skills"] {
                check.string_or_array(root, "", key);
            }
            check.hooks(root, "");
            for key in ["mcpServers", "lspServers"] {
                check.string_or_object(root, "", key);
            }
        }

        check.finish()
    }

    pub fn validate_marketplace(&self, manifest: &Value) -> ValidationResult {
        let mut check = Checker::default();

        if let Some(root) = check.object(manifest, "") {
            check.required(root, "", &["name", "owner", "plugins"]);
            check.string(root, "", "name");

            if let Some(owner) = root.get("owner") {
                if let Some(owner) = check.object(owner, "/owner") {
                    check.required(owner, "/owner", &["name"]);
                    check.string(owner, "/owner", "name");
                    check.string(owner, "/owner", "email");
                }
            }

            if let Some(plugins) = root.get("plugins") {
                match plugins.as_array() {
                    Some(entries) => {
                        for (i, entry) in entries.iter().enumerate() {
                            check.plugin_entry(entry, &format!("/plugins/{i}"));
                        }
                    }
                    None => check.violation("/plugins", "must be array"),
                }
            }

            if let Some(metadata) = root.get("metadata") {
                if let Some(metadata) = check.object(metadata, "/metadata") {
                    for key in ["description", "version", "pluginRoot"] {
                        check.string(metadata, "/metadata", key);
                    }
                }
            }
        }

        check.finish()
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    fn finish(self) -> ValidationResult {
        ValidationResult::from_errors(self.errors)
    }

    fn violation(&mut self, pointer: &str, rule: impl AsRef<str>) {
        let location = if pointer.is_empty() { "root" } else { pointer };
        self.errors.push(ValidationError {
            layer: ValidationLayer::Schema,
            message: format!("{location}: {}", rule.as_ref()),
            path: (!pointer.is_empty()).then(|| pointer.to_string()),
        });
    }

    fn object<'a>(&mut self, value: &'a Value, pointer: &str) -> Option<&'a Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.violation(pointer, "must be object");
        }
        object
    }

    fn required(&mut self, object: &Map<String, Value>, pointer: &str, keys: &[&str]) {
        for key in keys {
            if !object.contains_key(*key) {
                self.violation(pointer, format!("must have required property '{key}'"));
            }
        }
    }

    /// Optional string property; returns it when present and well-typed
    fn string<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        pointer: &str,
        key: &str,
    ) -> Option<&'a str> {
        match object.get(key)? {
            Value::String(s) => Some(s),
            _ => {
                self.violation(&child(pointer, key), "must be string");
                None
            }
        }
    }

    fn boolean(&mut self, object: &Map<String, Value>, pointer: &str, key: &str) {
        if let Some(value) = object.get(key) {
            if !value.is_boolean() {
                self.violation(&child(pointer, key), "must be boolean");
            }
        }
    }

    fn string_array(&mut self, object: &Map<String, Value>, pointer: &str, key: &str) {
        let Some(value) = object.get(key) else { return };
        let path = child(pointer, key);
        match value.as_array() {
            Some(items) => self.array_items_are_strings(items, &path),
            None => self.violation(&path, "must be array"),
        }
    }

    fn string_or_array(&mut self, object: &Map<String, Value>, pointer: &str, key: &str) {
        let Some(value) = object.get(key) else { return };
        let path = child(pointer, key);
        match value {
            Value::String(_) => {}
            Value::Array(items) => self.array_items_are_strings(items, &path),
            _ => self.violation(&path, "must be string or array"),
        }
    }

    fn string_or_object(&mut self, object: &Map<String, Value>, pointer: &str, key: &str) {
        let Some(value) = object.get(key) else { return };
        if !(value.is_string() || value.is_object()) {
            self.violation(&child(pointer, key), "must be string or object");
        }
    }

    fn hooks(&mut self, object: &Map<String, Value>, pointer: &str) {
        let Some(value) = object.get("hooks") else { return };
        let path = child(pointer, "hooks");
        match value {
            Value::String(_) | Value::Object(_) => {}
            Value::Array(items) => self.array_items_are_strings(items, &path),
            _ => self.violation(&path, "must be string, array or object"),
        }
    }

    fn array_items_are_strings(&mut self, items: &[Value], pointer: &str) {
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.violation(&format!("{pointer}/{i}"), "must be string");
            }
        }
    }

    fn author(&mut self, value: &Value, pointer: &str, name_required: bool) {
        let Some(author) = self.object(value, pointer) else { return };
        if name_required {
            self.required(author, pointer, &["name"]);
        }
        for key in ["name", "email", "url"] {
            self.string(author, pointer, key);
        }
    }

    fn plugin_entry(&mut self, value: &Value, pointer: &str) {
        let Some(entry) = self.object(value, pointer) else { return };
        self.required(entry, pointer, &["name", "source"]);
        self.string(entry, pointer, "name");
        self.string(entry, pointer, "description");
        self.string(entry, pointer, "version");
        self.boolean(entry, pointer, "strict");
        if let Some(author) = entry.get("author") {
            self.author(author, &child(pointer, "author"), false);
        }

        let Some(source) = entry.get("source") else { return };
        let source_pointer = child(pointer, "source");
        match source {
            Value::String(_) => {}
            Value::Object(remote) => {
                self.required(remote, &source_pointer, &["source"]);
                if let Some(kind) = self.string(remote, &source_pointer, "source") {
                    if !REMOTE_SOURCES.contains(&kind) {
                        self.violation(
                            &child(&source_pointer, "source"),
                            "must be equal to one of the allowed values",
                        );
                    }
                }
                for key in ["repo", "url", "ref", "sha"] {
                    self.string(remote, &source_pointer, key);
                }
            }
            _ => self.violation(&source_pointer, "must be string or object"),
        }
    }
}

/// JSON pointer to `key` under `pointer`
fn child(pointer: &str, key: &str) -> String {
    format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"))
}
