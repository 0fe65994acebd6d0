//! Schema keywords, options and validation result types.

use serde::Serialize;
use serde_json::Value;

pub const TYPE_KEY: &str = "type";
pub const REF_KEY: &str = "$ref";
pub const ID_KEY: &str = "$id";
pub const PROPERTIES_KEY: &str = "properties";
pub const ITEMS_KEY: &str = "items";

pub const OBJECT_TYPE: &str = "object";
pub const ARRAY_TYPE: &str = "array";

/// Root-schema key holding the identity pre-check schema.
pub const DEFAULT_IDENTITY_KEY: &str = "$identity";
pub const DEFAULT_OWNER_FIELD: &str = "$owner";
pub const DEFAULT_PRIORITY_FIELD: &str = "$priority";

/// Field label used for violations at the document root.
pub const ROOT_FIELD: &str = "(root)";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for compiling a [`Schema`](crate::Schema).
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    /// Root-schema key whose sub-schema is checked before the full schema.
    pub identity_key: String,
    /// Annotation naming the owner of a field.
    pub owner_field: String,
    /// Annotation holding an integer priority for a field.
    pub priority_field: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            owner_field: DEFAULT_OWNER_FIELD.to_string(),
            priority_field: DEFAULT_PRIORITY_FIELD.to_string(),
        }
    }
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = key.into();
        self
    }

    pub fn owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = field.into();
        self
    }

    pub fn priority_field(mut self, field: impl Into<String>) -> Self {
        self.priority_field = field.into();
        self
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateResult {
    /// Identity pre-check results (mirrors `schema` when no identity exists).
    pub identity: SchemaResults,
    /// Full schema results (mirrors `identity` when the pre-check failed).
    pub schema: SchemaResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaResults {
    pub matches: bool,
    pub problems: Vec<SchemaProblem>,
}

/// A single violation, decorated with the annotations closest to its path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaProblem {
    pub description: String,
    /// `(root)` or the instance path joined with `.`.
    pub field: String,
    pub owner: Option<String>,
    pub priority: i64,
    /// The offending instance value.
    pub value: Value,
}

impl ValidateResult {
    /// True when both passes matched.
    pub fn is_valid(&self) -> bool {
        self.identity.matches && self.schema.matches
    }
}

impl std::fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.description)?;
        if let Some(owner) = &self.owner {
            write!(f, " [owner: {}]", owner)?;
        }
        if self.priority != 0 {
            write!(f, " [priority: {}]", self.priority)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_fields() {
        let opts = SchemaOptions::default();
        assert_eq!(opts.identity_key, "$identity");
        assert_eq!(opts.owner_field, "$owner");
        assert_eq!(opts.priority_field, "$priority");
    }

    #[test]
    fn options_builder_overrides() {
        let opts = SchemaOptions::new()
            .owner_field("x-owner")
            .priority_field("x-priority")
            .identity_key("x-identity");
        assert_eq!(opts.owner_field, "x-owner");
        assert_eq!(opts.priority_field, "x-priority");
        assert_eq!(opts.identity_key, "x-identity");
    }

    #[test]
    fn problem_display() {
        let problem = SchemaProblem {
            description: "\"x\" is not of type \"integer\"".into(),
            field: "items.0".into(),
            owner: Some("billing".into()),
            priority: 2,
            value: json!("x"),
        };
        assert_eq!(
            problem.to_string(),
            "items.0: \"x\" is not of type \"integer\" [owner: billing] [priority: 2]"
        );

        let bare = SchemaProblem {
            owner: None,
            priority: 0,
            ..problem
        };
        assert_eq!(bare.to_string(), "items.0: \"x\" is not of type \"integer\"");
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!({})), "object");
        assert_eq!(json_type_name(&json!([1])), "array");
    }
}
