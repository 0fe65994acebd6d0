//! Compiles a JSON Schema into an [`AnnotationNode`] tree for one annotation field.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BuildError;
use crate::tree::{AnnotationNode, ArrayMatcher, Matcher, ObjectMatcher};
use crate::types::{
    json_type_name, ARRAY_TYPE, ID_KEY, ITEMS_KEY, OBJECT_TYPE, PROPERTIES_KEY, REF_KEY, TYPE_KEY,
};

/// Builds annotation trees against a table of `$id`-addressable fragments.
///
/// The table borrows the fragments, so one builder can compile any number of
/// trees (different roots or different fields) without copying them.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder<'a> {
    references: HashMap<&'a str, &'a Map<String, Value>>,
}

impl<'a> TreeBuilder<'a> {
    /// Index `fragments` by their `$id`.
    ///
    /// Fragments that are not objects or carry no string `$id` are skipped.
    /// When two fragments share an `$id`, the later one wins.
    pub fn new(fragments: &'a [Value]) -> Self {
        let mut references = HashMap::new();
        for fragment in fragments {
            let Some(map) = fragment.as_object() else {
                debug!(
                    actual = json_type_name(fragment),
                    "skipping non-object reference fragment"
                );
                continue;
            };
            match map.get(ID_KEY).and_then(Value::as_str) {
                Some(id) => {
                    if references.insert(id, map).is_some() {
                        debug!(id, "duplicate fragment $id, later fragment wins");
                    }
                }
                None => debug!("skipping reference fragment without $id"),
            }
        }
        Self { references }
    }

    /// Whether a fragment with this `$id` is registered.
    pub fn has_reference(&self, id: &str) -> bool {
        self.references.contains_key(id)
    }

    /// Build the tree of `field` annotations for `root`.
    ///
    /// Returns `Ok(None)` when `root` is not an object or nothing in it
    /// carries the field.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ReferenceCycle`] when resolving `$ref`s re-enters
    /// a fragment that is already being resolved further up the schema.
    pub fn build(&self, root: &Value, field: &str) -> Result<Option<AnnotationNode>, BuildError> {
        let Some(schema) = root.as_object() else {
            return Ok(None);
        };
        let mut resolving = Vec::new();
        self.build_node(schema, field, &mut resolving)
    }

    fn build_node(
        &self,
        schema: &Map<String, Value>,
        field: &str,
        resolving: &mut Vec<&'a str>,
    ) -> Result<Option<AnnotationNode>, BuildError> {
        if let Some(reference) = schema.get(REF_KEY).and_then(Value::as_str) {
            if reference.starts_with('#') {
                debug!(reference, "local reference left unresolved");
            } else if let Some((&id, &fragment)) = self.references.get_key_value(reference) {
                if let Some(start) = resolving.iter().position(|r| *r == id) {
                    let mut chain: Vec<String> =
                        resolving[start..].iter().map(|r| r.to_string()).collect();
                    chain.push(id.to_string());
                    return Err(BuildError::ReferenceCycle { chain });
                }

                let merged = merge_reference(fragment, schema);
                resolving.push(id);
                let node = self.build_node(&merged, field, resolving);
                resolving.pop();
                return node;
            } else {
                debug!(reference, "unknown reference left unresolved");
            }
        }

        let value = schema.get(field).and_then(Value::as_str).map(String::from);

        let matcher = match schema.get(TYPE_KEY).and_then(Value::as_str) {
            Some(OBJECT_TYPE) => self.object_matcher(schema, field, resolving)?,
            Some(ARRAY_TYPE) => self.array_matcher(schema, field, resolving)?,
            _ => Matcher::None,
        };

        if value.is_none() && matcher.is_leaf() {
            return Ok(None);
        }
        Ok(Some(AnnotationNode::new(value, matcher)))
    }

    fn object_matcher(
        &self,
        schema: &Map<String, Value>,
        field: &str,
        resolving: &mut Vec<&'a str>,
    ) -> Result<Matcher, BuildError> {
        let Some(properties) = schema.get(PROPERTIES_KEY).and_then(Value::as_object) else {
            return Ok(Matcher::None);
        };

        let mut children = BTreeMap::new();
        for (key, property) in properties {
            let Some(property) = property.as_object() else {
                continue;
            };
            if let Some(child) = self.build_node(property, field, resolving)? {
                children.insert(key.clone(), child);
            }
        }

        if children.is_empty() {
            Ok(Matcher::None)
        } else {
            Ok(Matcher::Object(ObjectMatcher::new(children)))
        }
    }

    fn array_matcher(
        &self,
        schema: &Map<String, Value>,
        field: &str,
        resolving: &mut Vec<&'a str>,
    ) -> Result<Matcher, BuildError> {
        let Some(items) = schema.get(ITEMS_KEY).and_then(Value::as_object) else {
            return Ok(Matcher::None);
        };

        Ok(match self.build_node(items, field, resolving)? {
            Some(child) => Matcher::Array(ArrayMatcher::new(child)),
            None => Matcher::None,
        })
    }
}

/// Build a tree from an optional root. `None` yields no tree.
///
/// # Errors
///
/// See [`TreeBuilder::build`].
pub fn build_tree(
    root: Option<&Value>,
    fragments: &[Value],
    field: &str,
) -> Result<Option<AnnotationNode>, BuildError> {
    match root {
        Some(root) => TreeBuilder::new(fragments).build(root, field),
        None => Ok(None),
    }
}

/// Fragment fields overlaid with the referencing node's own fields.
///
/// The referencing node's `$ref` is consumed here; a `$ref` declared by the
/// fragment itself is kept so chained fragments keep resolving.
fn merge_reference(fragment: &Map<String, Value>, node: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = fragment.clone();
    for (key, value) in node {
        if key != REF_KEY {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
