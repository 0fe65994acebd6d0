//! Annotated Schema
//!
//! Sparse lookup of custom JSON Schema annotations by document path.
//!
//! Schemas often carry side metadata on individual nodes: an example value,
//! the team that owns a field, a priority. This library indexes one such
//! annotation field into an [`AnnotationNode`] tree and answers, for any
//! document path, which annotation applies most specifically.
//!
//! # Example
//!
//! ```
//! use annotated_schema::{build_tree, search};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "$example": "A",
//!     "properties": {
//!         "id": { "type": "string", "$example": "B" },
//!         "data": { "type": "string" },
//!         "details": {
//!             "type": "object",
//!             "$example": "C",
//!             "properties": { "description": { "type": "string" } }
//!         }
//!     }
//! });
//!
//! let tree = build_tree(Some(&schema), &[], "$example").unwrap();
//!
//! assert_eq!(search(tree.as_ref(), &["id"]), Some("B"));
//! // `data` has no annotation of its own, so the root's applies
//! assert_eq!(search(tree.as_ref(), &["data"]), Some("A"));
//! assert_eq!(search(tree.as_ref(), &["details", "description"]), Some("C"));
//! ```
//!
//! # Lookup Rules
//!
//! | Path situation | Result |
//! |----------------|--------|
//! | Empty path | The node's own annotation |
//! | Segment routes to an annotated descendant | Deepest annotation wins |
//! | Segment unknown to the schema | Nearest ancestor's annotation |
//! | Array index (`"0"`, `"12"`) | The `items` schema's annotation |
//!
//! # References
//!
//! A `$ref` naming the `$id` of a supplied fragment merges the fragment into
//! the referencing node; the referencing node's own fields win. Local
//! references (`#/...`) and unknown ids contribute nothing. Reference cycles
//! fail the build with [`BuildError::ReferenceCycle`].
//!
//! # Validation
//!
//! [`Schema`] pairs the `jsonschema` validator with `$owner` / `$priority`
//! annotation trees, so each reported problem says who owns it.

mod builder;
mod error;
mod loader;
mod schema;
mod tree;
mod types;

pub use builder::{build_tree, TreeBuilder};
pub use error::{BuildError, LoadError, SchemaError};
pub use loader::{is_url, load_fragments, load_schema, load_schema_auto, load_schema_str};
pub use schema::{instance_path_segments, Schema};
pub use tree::{search, AnnotationNode, ArrayMatcher, Matcher, ObjectMatcher};
pub use types::{
    SchemaOptions, SchemaProblem, SchemaResults, ValidateResult, DEFAULT_IDENTITY_KEY,
    DEFAULT_OWNER_FIELD, DEFAULT_PRIORITY_FIELD,
};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
