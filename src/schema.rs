//! Document validation decorated with schema annotations.
//!
//! A [`Schema`] compiles a root JSON Schema (plus `$id`-addressable fragments)
//! with the `jsonschema` crate, and indexes the owner and priority annotations
//! of the same schema. Every violation reported by the validator is looked up
//! by instance path, so each problem carries the owner and priority declared
//! closest to it.
//!
//! If the root schema has an identity key (`$identity` by default), its value
//! is compiled separately and checked first; the full schema only runs when the
//! document passes the identity check.

use std::collections::HashMap;

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::TreeBuilder;
use crate::error::SchemaError;
use crate::tree::{search, AnnotationNode};
use crate::types::{
    SchemaOptions, SchemaProblem, SchemaResults, ValidateResult, ID_KEY, ROOT_FIELD,
};

/// Base URI the validator resolves relative `$id`s and `$ref`s against.
const DEFAULT_BASE_URI: &str = "json-schema:///";

/// Resolves `$ref` URIs to the caller's fragments without network access.
///
/// Fragments are keyed by their `$id` resolved against [`DEFAULT_BASE_URI`],
/// so a reference only reaches a fragment whose `$id` names it exactly.
struct FragmentRetriever {
    fragments: HashMap<String, Value>,
}

impl FragmentRetriever {
    fn new(additional: &[Value]) -> Self {
        let fragments = additional
            .iter()
            .filter_map(|fragment| {
                let id = fragment.get(ID_KEY)?.as_str()?;
                Some((fragment_uri(id), fragment.clone()))
            })
            .collect();
        Self { fragments }
    }
}

impl Retrieve for FragmentRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        self.fragments
            .get(uri.trim_end_matches('#'))
            .cloned()
            .ok_or_else(|| format!("unknown schema reference: {}", uri).into())
    }
}

/// Absolute form of a fragment `$id`, as the validator will request it.
fn fragment_uri(id: &str) -> String {
    let id = id.trim_end_matches('#');
    let absolute = id
        .split_once(':')
        .is_some_and(|(scheme, _)| !scheme.is_empty() && !scheme.contains('/'));
    if absolute {
        id.to_string()
    } else {
        format!("{}{}", DEFAULT_BASE_URI, id.trim_start_matches('/'))
    }
}

/// A compiled schema with its identity pre-check and annotation indexes.
pub struct Schema {
    root: Validator,
    identity: Option<Validator>,
    owners: Option<AnnotationNode>,
    priorities: Option<AnnotationNode>,
}

impl Schema {
    /// Compile `root` with default [`SchemaOptions`].
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Compile` if either schema is invalid, or
    /// `SchemaError::Build` if the annotation index hits a reference cycle.
    pub fn new(root: &Value, additional: &[Value]) -> Result<Self, SchemaError> {
        Self::with_options(root, additional, &SchemaOptions::default())
    }

    /// Compile `root` with explicit options.
    ///
    /// # Errors
    ///
    /// See [`Schema::new`].
    pub fn with_options(
        root: &Value,
        additional: &[Value],
        options: &SchemaOptions,
    ) -> Result<Self, SchemaError> {
        let identity = match root.get(&options.identity_key) {
            Some(identity_schema) => {
                debug!(key = %options.identity_key, "compiling identity schema");
                Some(compile(identity_schema, additional, "identity")?)
            }
            None => None,
        };
        let compiled = compile(root, additional, "root")?;

        let builder = TreeBuilder::new(additional);
        let owners = index(&builder, root, &options.owner_field)?;
        let priorities = index(&builder, root, &options.priority_field)?;

        Ok(Self {
            root: compiled,
            identity,
            owners,
            priorities,
        })
    }

    /// Validate `data`, running the identity check first when one exists.
    pub fn validate(&self, data: &Value) -> ValidateResult {
        match &self.identity {
            Some(identity) => {
                let identity = self.results(identity, data);
                let schema = if identity.matches {
                    self.results(&self.root, data)
                } else {
                    identity.clone()
                };
                ValidateResult { identity, schema }
            }
            None => {
                let schema = self.results(&self.root, data);
                ValidateResult {
                    identity: schema.clone(),
                    schema,
                }
            }
        }
    }

    /// Owner annotation closest to `path`.
    pub fn owner<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        search(self.owners.as_ref(), path)
    }

    /// Priority annotation closest to `path`, or 0.
    pub fn priority<S: AsRef<str>>(&self, path: &[S]) -> i64 {
        match search(self.priorities.as_ref(), path) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(priority = raw, "ignoring non-integer priority annotation");
                0
            }),
            None => 0,
        }
    }

    /// Whether an identity pre-check was compiled.
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    fn results(&self, validator: &Validator, data: &Value) -> SchemaResults {
        let problems: Vec<SchemaProblem> = validator
            .iter_errors(data)
            .map(|e| {
                let description = e.to_string();
                let path = instance_path_segments(&e.instance_path.to_string());
                SchemaProblem {
                    description,
                    field: field_label(&path),
                    owner: self.owner(&path).map(String::from),
                    priority: self.priority(&path),
                    value: e.instance.into_owned(),
                }
            })
            .collect();

        SchemaResults {
            matches: problems.is_empty(),
            problems,
        }
    }
}

/// Split a JSON Pointer (RFC 6901) into unescaped path segments.
///
/// The empty pointer addresses the root and yields no segments.
pub fn instance_path_segments(pointer: &str) -> Vec<String> {
    let Some(rest) = pointer.strip_prefix('/') else {
        return Vec::new();
    };
    rest.split('/')
        .map(|part| part.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn field_label(path: &[String]) -> String {
    if path.is_empty() {
        ROOT_FIELD.to_string()
    } else {
        path.join(".")
    }
}

fn compile(
    schema: &Value,
    additional: &[Value],
    which: &'static str,
) -> Result<Validator, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_retriever(FragmentRetriever::new(additional));
    opts.build(schema).map_err(|e| SchemaError::Compile {
        which,
        message: e.to_string(),
    })
}

fn index(
    builder: &TreeBuilder<'_>,
    root: &Value,
    field: &str,
) -> Result<Option<AnnotationNode>, SchemaError> {
    builder
        .build(root, field)
        .map_err(|source| SchemaError::Build {
            field: field.to_string(),
            source,
        })
}
