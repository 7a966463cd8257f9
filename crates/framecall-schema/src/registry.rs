use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use framecall_envelope::CallEnvelope;
use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validator::validate_args;

const SCHEMA_SUFFIX: &str = ".schema.json";
const MAX_METHOD_NAME_LEN: usize = 128;

/// Method-keyed registry of compiled argument schemas.
pub struct MethodSchemaRegistry {
    validators: HashMap<String, Validator>,
    config: RegistryConfig,
}

impl MethodSchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: HashMap::new(),
            config,
        }
    }

    /// Register the argument schema for a method from a JSON string.
    pub fn register(&mut self, method: &str, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(method, &schema)
    }

    /// Register the argument schema for a method from a JSON value.
    pub fn register_value(&mut self, method: &str, schema: &Value) -> Result<()> {
        let mut schema_to_compile = schema.clone();
        if self.config.strict_mode {
            apply_strict_mode(&mut schema_to_compile);
        }

        let compiled = jsonschema::validator_for(&schema_to_compile)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;

        self.validators.insert(method.to_string(), compiled);
        Ok(())
    }

    /// Load schemas from a directory of `<method>.schema.json` files.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    ///
    /// Symlinked schema files are refused, and files not ending in
    /// `.schema.json` are skipped.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(method) = file_name.strip_suffix(SCHEMA_SUFFIX) else {
                continue;
            };

            let entry_path = entry.path();
            let metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            if metadata.file_type().is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !metadata.is_file() {
                continue;
            }
            if !is_valid_method_name(method) {
                return Err(SchemaError::LoadFailed(format!(
                    "unusable method name in schema filename: {file_name}"
                )));
            }

            loaded = loaded.saturating_add(1);
            if loaded > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({})",
                    registry.config.max_schemas_from_directory
                )));
            }

            let content = read_bounded(&entry_path, registry.config.max_schema_file_size)?;
            registry.register(method, &content)?;
            debug!(%method, path = %entry_path.display(), "loaded argument schema");
        }

        Ok(registry)
    }

    /// Load from embedded `(method, schema)` pairs.
    pub fn from_embedded(schemas: &[(&str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (method, schema) in schemas {
            registry.register(method, schema)?;
        }
        Ok(registry)
    }

    /// Validate an argument list against the method's schema.
    pub fn validate(&self, method: &str, args: &[Value]) -> Result<()> {
        match self.validators.get(method) {
            Some(validator) => validate_args(method, args, validator),
            None if self.config.fail_on_missing_schema => {
                Err(SchemaError::NoSchema(method.to_string()))
            }
            None => Ok(()),
        }
    }

    /// Validate a decoded envelope's arguments.
    pub fn validate_envelope(&self, envelope: &CallEnvelope) -> Result<()> {
        self.validate(&envelope.method, &envelope.args)
    }

    /// Check if a method has a registered schema.
    pub fn has_schema(&self, method: &str) -> bool {
        self.validators.contains_key(method)
    }

    /// Methods that have registered schemas, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.validators.keys().cloned().collect();
        methods.sort_unstable();
        methods
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for MethodSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_method_name(method: &str) -> bool {
    !method.is_empty()
        && method.len() <= MAX_METHOD_NAME_LEN
        && method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '$'))
}

fn read_bounded(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;
    let size = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?
        .len();
    if size > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({size} bytes): {}",
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file grew while reading: {}",
            path.display()
        )));
    }
    Ok(content)
}

const NESTED_SCHEMA_MAPS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

const NESTED_SCHEMAS: [&str; 11] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
];

const NESTED_SCHEMA_LISTS: [&str; 4] = ["prefixItems", "allOf", "anyOf", "oneOf"];

const OBJECT_KEYWORDS: [&str; 6] = [
    "properties",
    "patternProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

fn apply_strict_mode(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_object_schema(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for key in NESTED_SCHEMA_MAPS {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(apply_strict_mode);
                }
            }
            for key in NESTED_SCHEMAS {
                if let Some(child) = map.get_mut(key) {
                    apply_strict_mode(child);
                }
            }
            for key in NESTED_SCHEMA_LISTS {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    children.iter_mut().for_each(apply_strict_mode);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_strict_mode),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    const GREET_SCHEMA: &str = r#"{
        "type": "array",
        "prefixItems": [{ "type": "string" }],
        "minItems": 1,
        "maxItems": 1
    }"#;

    const USER_SCHEMA: &str = r#"{
        "type": "array",
        "items": {
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        }
    }"#;

    #[test]
    fn register_and_validate() {
        let mut registry = MethodSchemaRegistry::new();
        registry.register("greet", GREET_SCHEMA).unwrap();

        assert!(registry.validate("greet", &[json!("Alice")]).is_ok());
        assert!(matches!(
            registry.validate("greet", &[json!(7)]),
            Err(SchemaError::ValidationFailed { .. })
        ));
        assert!(registry.validate("greet", &[]).is_err());
    }

    #[test]
    fn missing_schema_permissive_passes() {
        let registry = MethodSchemaRegistry::new();
        assert!(registry.validate("anything", &[json!(1)]).is_ok());
    }

    #[test]
    fn missing_schema_strict_fails() {
        let registry = MethodSchemaRegistry::with_config(RegistryConfig {
            fail_on_missing_schema: true,
            ..RegistryConfig::default()
        });
        assert!(matches!(
            registry.validate("anything", &[]),
            Err(SchemaError::NoSchema(method)) if method == "anything"
        ));
    }

    #[test]
    fn strict_mode_rejects_undeclared_properties_in_nested_items() {
        let mut permissive = MethodSchemaRegistry::new();
        permissive.register("users", USER_SCHEMA).unwrap();
        let mut strict = MethodSchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register("users", USER_SCHEMA).unwrap();

        let args = [json!({"id": 1, "extra": true})];
        assert!(permissive.validate("users", &args).is_ok());
        assert!(matches!(
            strict.validate("users", &args),
            Err(SchemaError::ValidationFailed { .. })
        ));
        assert!(strict.validate("users", &[json!({"id": 2})]).is_ok());
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = MethodSchemaRegistry::new();
        assert!(matches!(
            registry.register("x", r#"{"type":"definitely-not-a-type"}"#),
            Err(SchemaError::CompileFailed(_))
        ));
        assert!(matches!(
            registry.register("x", "{not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn validate_envelope_uses_method_name() {
        let registry = MethodSchemaRegistry::from_embedded(&[("greet", GREET_SCHEMA)]).unwrap();
        assert!(registry
            .validate_envelope(&CallEnvelope::new("greet", vec![json!("Bob")]))
            .is_ok());
        assert!(registry
            .validate_envelope(&CallEnvelope::new("greet", vec![json!(null)]))
            .is_err());
        assert_eq!(registry.methods(), vec!["greet".to_string()]);
    }

    #[test]
    fn from_directory_loads_method_schemas() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "greet.schema.json", GREET_SCHEMA);
        write_schema(&dir, "users.schema.json", USER_SCHEMA);
        write_schema(&dir, "notes.txt", "ignored");

        let registry = MethodSchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(
            registry.methods(),
            vec!["greet".to_string(), "users".to_string()]
        );
        assert!(registry.validate("users", &[json!({"id": 3})]).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_rejects_unusable_method_name() {
        let dir = make_temp_schema_dir("bad-name");
        write_schema(&dir, "has space.schema.json", GREET_SCHEMA);

        let result = MethodSchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink");
        let target = dir.join("target.json");
        std::fs::write(&target, GREET_SCHEMA).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("greet.schema.json")).unwrap();

        let result = MethodSchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_limits_are_enforced() {
        let dir = make_temp_schema_dir("limits");
        write_schema(&dir, "a.schema.json", GREET_SCHEMA);
        write_schema(&dir, "b.schema.json", GREET_SCHEMA);

        let count_limited = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        assert!(matches!(
            MethodSchemaRegistry::from_directory_with_config(&dir, count_limited),
            Err(SchemaError::LoadFailed(_))
        ));

        let size_limited = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        assert!(matches!(
            MethodSchemaRegistry::from_directory_with_config(&dir, size_limited),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "framecall-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
