//! In-memory MJCF element tree
//!
//! A [`Document`] owns every [`Element`] in an arena and hands out
//! [`ElementId`] handles. Each element has at most one parent; the root has
//! none. Children keep their source order, which matters both for first-match
//! lookups and for the order elements are written back out.
//!
//! Re-parenting is always "remove then insert": [`Document::insert_child`]
//! detaches an element from its current parent before attaching it elsewhere,
//! so the parent/children links are only ever updated in one place.

mod attributes;

pub use attributes::normalize_identifier;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Handle to an element stored in a [`Document`]
///
/// Handles are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// A tagged node with ordered attributes and optional text content
///
/// Attribute values are kept as raw strings so unknown attributes survive a
/// load/save round-trip untouched. Typed access goes through the parsing
/// helpers (`parse_f64`, `parse_vector3`, ...), which validate on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
}

impl Element {
    /// Create an element with no attributes
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Element tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether this element has the given tag
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Raw attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the attribute is present
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// All attributes in source order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the text content
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Value of the `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }
}

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// An MJCF document: a root element plus the path it was loaded from
///
/// Detached elements (removed subtrees, fresh deep copies) stay in the arena
/// until the document is dropped; only elements reachable from the root are
/// serialized.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: ElementId,
    path: Option<PathBuf>,
}

impl Document {
    /// Create a document whose root is `root`
    pub fn new(root: Element) -> Self {
        Self {
            nodes: vec![Node {
                element: root,
                parent: None,
                children: Vec::new(),
            }],
            root: ElementId(0),
            path: None,
        }
    }

    /// Root element handle
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// File the document was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record the file the document belongs to
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Directory containing the source file, used to resolve relative asset paths
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Borrow an element
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this document.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.nodes[id.0].element
    }

    /// Mutably borrow an element
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this document.
    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.nodes[id.0].element
    }

    /// Parent of an element; `None` for the root and for detached elements
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes[id.0].parent
    }

    /// All direct children in order
    pub fn child_ids(&self, id: ElementId) -> &[ElementId] {
        &self.nodes[id.0].children
    }

    /// Direct children with the given tag
    pub fn children<'a>(
        &'a self,
        id: ElementId,
        tag: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |child| self.element(*child).is(tag))
    }

    /// First direct child with the given tag
    pub fn first_child(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        self.children(id, tag).next()
    }

    /// First descendant (depth-first, document order) with the given tag
    ///
    /// The starting element itself is not considered.
    pub fn find(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        self.descendants(id)
            .into_iter()
            .find(|candidate| self.element(*candidate).is(tag))
    }

    /// All descendants with the given tag in document order
    pub fn find_all(&self, id: ElementId, tag: &str) -> Vec<ElementId> {
        self.descendants(id)
            .into_iter()
            .filter(|candidate| self.element(*candidate).is(tag))
            .collect()
    }

    /// All descendants in pre-order, excluding `id` itself
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.child_ids(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.child_ids(next).iter().rev().copied());
        }
        out
    }

    /// Add a detached element to the arena
    pub fn create_element(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            element,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Insert `child` under `parent` at `index` (or at the end)
    ///
    /// A child that already has a parent is removed from it first. An index
    /// past the end appends.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        index: Option<usize>,
    ) -> Result<()> {
        if child == self.root {
            return Err(Error::InvalidDocument(
                "the root element cannot be re-parented".to_string(),
            ));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(Error::InvalidDocument(format!(
                "cannot insert <{}> beneath itself",
                self.element(child).tag()
            )));
        }

        self.detach(child);

        let children = &mut self.nodes[parent.0].children;
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from `parent`
    ///
    /// Returns `false` without touching anything when `child` is not a
    /// direct child of `parent`.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|candidate| *candidate == child) {
            Some(index) => {
                children.remove(index);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }

    /// Detach an element from whatever parent it has
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
    }

    /// Copy a subtree into fresh, detached elements
    pub fn deep_copy(&mut self, id: ElementId) -> ElementId {
        let copy = self.create_element(self.element(id).clone());
        let children = self.child_ids(id).to_vec();
        for child in children {
            let child_copy = self.deep_copy(child);
            self.nodes[copy.0].children.push(child_copy);
            self.nodes[child_copy.0].parent = Some(copy);
        }
        copy
    }

    fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new(Element::new("mujoco"));
        let root = doc.root();
        let worldbody = doc.create_element(Element::new("worldbody"));
        doc.insert_child(root, worldbody, None).unwrap();
        let body = doc.create_element(Element::new("body").with_attr("name", "base"));
        doc.insert_child(worldbody, body, None).unwrap();
        let geom = doc.create_element(Element::new("geom").with_attr("name", "g0"));
        doc.insert_child(body, geom, None).unwrap();
        (doc, worldbody, body, geom)
    }

    #[test]
    fn test_find_is_depth_first() {
        let (mut doc, worldbody, body, _) = sample();
        let late = doc.create_element(Element::new("geom").with_attr("name", "late"));
        doc.insert_child(worldbody, late, None).unwrap();

        let first = doc.find(doc.root(), "geom").unwrap();
        assert_eq!(doc.element(first).name(), Some("g0"));
        assert_eq!(doc.find_all(doc.root(), "geom").len(), 2);
        assert_eq!(doc.children(worldbody, "geom").count(), 1);
        assert_eq!(doc.children(body, "geom").count(), 1);
        assert!(doc.find(doc.root(), "mujoco").is_none());
    }

    #[test]
    fn test_remove_child_is_idempotent() {
        let (mut doc, worldbody, body, _) = sample();
        assert!(doc.remove_child(worldbody, body));
        assert!(!doc.remove_child(worldbody, body));
        assert!(!doc.child_ids(worldbody).contains(&body));
        assert_eq!(doc.parent(body), None);
    }

    #[test]
    fn test_insert_child_reparents() {
        let (mut doc, worldbody, body, geom) = sample();
        doc.insert_child(worldbody, geom, Some(0)).unwrap();
        assert_eq!(doc.parent(geom), Some(worldbody));
        assert_eq!(doc.child_ids(worldbody), &[geom, body]);
        assert!(doc.child_ids(body).is_empty());
    }

    #[test]
    fn test_insert_child_rejects_cycles() {
        let (mut doc, worldbody, body, _) = sample();
        assert!(doc.insert_child(body, worldbody, None).is_err());
        assert!(doc.insert_child(body, body, None).is_err());
        let root = doc.root();
        assert!(doc.insert_child(body, root, None).is_err());
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let (mut doc, _, body, geom) = sample();
        let copy = doc.deep_copy(body);
        assert_eq!(doc.parent(copy), None);

        let copied_geom = doc.child_ids(copy)[0];
        assert_ne!(copied_geom, geom);
        doc.element_mut(copied_geom).set_attr("name", "changed");
        assert_eq!(doc.element(geom).name(), Some("g0"));
    }

    #[test]
    fn test_attribute_order_preserved() {
        let mut element = Element::new("geom")
            .with_attr("type", "mesh")
            .with_attr("mesh", "m")
            .with_attr("pos", "0 0 0");
        element.set_attr("mesh", "n");
        element.set_attr("quat", "1 0 0 0");
        assert_eq!(element.remove_attr("pos"), Some("0 0 0".to_string()));
        let keys: Vec<&str> = element.attributes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["type", "mesh", "quat"]);
        assert_eq!(element.attr("mesh"), Some("n"));
    }
}
