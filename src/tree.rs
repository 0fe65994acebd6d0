//! Sparse annotation tree.
//!
//! A tree mirrors the shape of a JSON Schema: object schemas route a path
//! segment to a child by property name, array schemas route any index
//! segment to the single `items` child. Each node may carry an annotation.
//! Searching returns the annotation of the deepest node along the path that
//! has one, falling back to ancestors when the path runs past the schema.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Index segments accepted by array schemas: one or more decimal digits.
static INDEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9]+$").expect("index pattern is valid"));

/// A node of the annotation tree.
///
/// Nodes only exist when they carry an annotation or route to a deeper node
/// that does; the builder prunes everything else.
#[derive(Debug, Clone)]
pub struct AnnotationNode {
    value: Option<String>,
    matcher: Matcher,
}

/// Routing from a single path segment to a child node.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Leaf or unrecognized schema type.
    None,
    /// Exact property-name lookup.
    Object(ObjectMatcher),
    /// Any segment matching the index pattern routes to `items`.
    Array(ArrayMatcher),
}

/// Routes a property name to the child built from `properties`.
#[derive(Debug, Clone)]
pub struct ObjectMatcher {
    children: BTreeMap<String, AnnotationNode>,
}

/// Routes any index segment to the child built from `items`.
#[derive(Debug, Clone)]
pub struct ArrayMatcher {
    index_pattern: Regex,
    child: Box<AnnotationNode>,
}

impl ObjectMatcher {
    /// Matcher over the given property children.
    pub fn new(children: BTreeMap<String, AnnotationNode>) -> Self {
        Self { children }
    }

    /// Child for an exact property name.
    pub fn get(&self, key: &str) -> Option<&AnnotationNode> {
        self.children.get(key)
    }

    /// Property names that route to a child.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

impl ArrayMatcher {
    /// Array matcher using the default decimal index pattern.
    pub fn new(child: AnnotationNode) -> Self {
        Self::with_pattern(INDEX_PATTERN.clone(), child)
    }

    /// Array matcher with a caller-supplied pattern. The pattern should be
    /// anchored; it is applied with `is_match` against the raw segment.
    pub fn with_pattern(index_pattern: Regex, child: AnnotationNode) -> Self {
        Self {
            index_pattern,
            child: Box::new(child),
        }
    }

    /// The `items` child, when `segment` matches the index pattern.
    pub fn get(&self, segment: &str) -> Option<&AnnotationNode> {
        if self.index_pattern.is_match(segment) {
            Some(&self.child)
        } else {
            None
        }
    }
}

impl Matcher {
    fn get(&self, segment: &str) -> Option<&AnnotationNode> {
        match self {
            Matcher::None => None,
            Matcher::Object(m) => m.get(segment),
            Matcher::Array(m) => m.get(segment),
        }
    }

    /// No segment routes anywhere from here.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Matcher::None)
    }
}

impl AnnotationNode {
    pub fn new(value: Option<String>, matcher: Matcher) -> Self {
        Self { value, matcher }
    }

    /// The annotation recorded on this node, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Child node reached by a single path segment.
    pub fn lookup(&self, segment: &str) -> Option<&AnnotationNode> {
        self.matcher.get(segment)
    }

    /// Annotation closest to `path`.
    ///
    /// The deepest annotated node along the path wins. Segments the tree
    /// cannot route fall back to this node's own annotation.
    pub fn search<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let Some((segment, rest)) = path.split_first() else {
            return self.value();
        };

        self.lookup(segment.as_ref())
            .and_then(|child| child.search(rest))
            .or_else(|| self.value())
    }
}

/// Search an optional tree. An absent tree never yields an annotation.
pub fn search<'a, S: AsRef<str>>(
    tree: Option<&'a AnnotationNode>,
    path: &[S],
) -> Option<&'a str> {
    tree.and_then(|node| node.search(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: &str) -> AnnotationNode {
        AnnotationNode::new(Some(value.to_string()), Matcher::None)
    }

    fn object(value: Option<&str>, children: Vec<(&str, AnnotationNode)>) -> AnnotationNode {
        let children = children
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        AnnotationNode::new(
            value.map(String::from),
            Matcher::Object(ObjectMatcher::new(children)),
        )
    }

    #[test]
    fn absent_tree_finds_nothing() {
        assert_eq!(search::<&str>(None, &[]), None);
        assert_eq!(search(None, &["a", "b"]), None);
    }

    #[test]
    fn empty_path_returns_own_value() {
        let node = leaf("x");
        assert_eq!(node.search::<&str>(&[]), Some("x"));

        let routing_only = object(None, vec![("a", leaf("y"))]);
        assert_eq!(routing_only.search::<&str>(&[]), None);
    }

    #[test]
    fn deeper_annotation_wins() {
        let tree = object(
            Some("root"),
            vec![("a", object(Some("a"), vec![("b", leaf("b"))]))],
        );
        assert_eq!(tree.search(&["a", "b"]), Some("b"));
        assert_eq!(tree.search(&["a"]), Some("a"));
    }

    #[test]
    fn unroutable_segment_falls_back() {
        let tree = object(Some("root"), vec![("a", leaf("a"))]);
        assert_eq!(tree.search(&["missing"]), Some("root"));
        assert_eq!(tree.search(&["a", "deeper", "still"]), Some("a"));
    }

    #[test]
    fn unannotated_chain_falls_back_to_ancestor() {
        let tree = object(
            Some("root"),
            vec![("a", object(None, vec![("b", leaf("b"))]))],
        );
        assert_eq!(tree.search(&["a"]), Some("root"));
        assert_eq!(tree.search(&["a", "c"]), Some("root"));
        assert_eq!(tree.search(&["a", "b"]), Some("b"));
    }

    #[test]
    fn array_matcher_routes_index_segments() {
        let tree = AnnotationNode::new(
            Some("list".into()),
            Matcher::Array(ArrayMatcher::new(leaf("item"))),
        );
        assert_eq!(tree.search(&["0"]), Some("item"));
        assert_eq!(tree.search(&["12"]), Some("item"));
        assert_eq!(tree.search(&["x"]), Some("list"));
        assert_eq!(tree.search(&["-1"]), Some("list"));
        assert_eq!(tree.search(&[""]), Some("list"));
    }

    #[test]
    fn custom_index_pattern() {
        let single_digit = Regex::new("^[0-9]$").unwrap();
        let tree = AnnotationNode::new(
            Some("list".into()),
            Matcher::Array(ArrayMatcher::with_pattern(single_digit, leaf("item"))),
        );
        assert_eq!(tree.search(&["5"]), Some("item"));
        assert_eq!(tree.search(&["12"]), Some("list"));
    }

    #[test]
    fn search_accepts_owned_segments() {
        let tree = object(None, vec![("a", leaf("a"))]);
        let path = vec!["a".to_string()];
        assert_eq!(tree.search(&path), Some("a"));
    }

    #[test]
    fn only_none_matcher_is_leaf() {
        assert!(Matcher::None.is_leaf());
        assert!(!Matcher::Array(ArrayMatcher::new(leaf("item"))).is_leaf());
        assert!(!object(None, vec![("a", leaf("a"))]).matcher().is_leaf());
    }

    #[test]
    fn tree_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnnotationNode>();
    }
}
