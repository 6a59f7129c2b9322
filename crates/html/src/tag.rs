//! Arena-owned tag tree.
//!
//! Nodes live in a `Vec` owned by [`TagTree`] and refer to each other through [`TagId`]
//! handles. The parent link is a plain handle, so there are no ownership cycles.

use std::collections::HashMap;
use std::ops::Index;

use crate::event::Attributes;

/// Resolved CSS of a tag: property name to value.
pub type CssProperties = HashMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(u32);

impl TagId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tag {
    name: String,
    namespace: Option<String>,
    attributes: Attributes,
    css: CssProperties,
    css_published: bool,
    children: Vec<TagId>,
    parent: Option<TagId>,
    text: Vec<String>,
}

impl Tag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .into_iter()
            .flat_map(str::split_ascii_whitespace)
    }

    pub fn css(&self) -> &CssProperties {
        &self.css
    }

    pub fn is_css_published(&self) -> bool {
        self.css_published
    }

    pub fn children(&self) -> &[TagId] {
        &self.children
    }

    pub fn parent(&self) -> Option<TagId> {
        self.parent
    }

    /// Text runs that were emitted while this tag was the innermost open tag.
    pub fn text_runs(&self) -> &[String] {
        &self.text
    }
}

#[derive(Clone, Debug, Default)]
pub struct TagTree {
    tags: Vec<Tag>,
}

impl TagTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Create a detached tag.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        attributes: Attributes,
        namespace: Option<String>,
    ) -> TagId {
        let id = TagId(self.tags.len() as u32);
        self.tags.push(Tag {
            name: name.into(),
            namespace,
            attributes,
            ..Tag::default()
        });
        id
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(id.index())
    }

    fn get_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.tags.get_mut(id.index())
    }

    /// Append `child` as the last child of `parent` and point its parent link at `parent`.
    ///
    /// A child that already has a parent stays listed among that parent's children; only
    /// [`TagTree::detach`] removes it from there.
    pub fn append_child(&mut self, parent: TagId, child: TagId) {
        if self.get(parent).is_none() {
            return;
        }
        let Some(node) = self.get_mut(child) else {
            return;
        };
        node.parent = Some(parent);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        log::trace!(target: "tagflow.tree", "append {:?} -> {:?}", child, parent);
    }

    /// Remove `id` from its parent's child list and clear its parent link.
    pub fn detach(&mut self, id: TagId) {
        let Some(parent) = self.get_mut(id).and_then(|t| t.parent.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
    }

    pub fn parent(&self, id: TagId) -> Option<TagId> {
        self.get(id).and_then(Tag::parent)
    }

    pub fn children(&self, id: TagId) -> &[TagId] {
        self.get(id).map(Tag::children).unwrap_or(&[])
    }

    pub fn last_child(&self, id: TagId) -> Option<TagId> {
        self.children(id).last().copied()
    }

    /// Direct children named `name`, in document order.
    pub fn children_named(&self, id: TagId, name: &str) -> Vec<TagId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|t| t.name == name))
            .collect()
    }

    /// Whether a child (or, with `recursive`, any descendant) is named `name`.
    pub fn has_child(&self, id: TagId, name: &str, recursive: bool) -> bool {
        self.children(id).iter().any(|c| {
            self.get(*c).is_some_and(|t| t.name == name)
                || (recursive && self.has_child(*c, name, true))
        })
    }

    /// The sibling `offset` positions away in the parent's child list. Offset zero is the
    /// tag itself. `None` for detached tags and out-of-range offsets.
    pub fn sibling(&self, id: TagId, offset: isize) -> Option<TagId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|c| *c == id)?;
        let target = position.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    pub fn ancestors(&self, id: TagId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Tags without a parent, in creation order.
    pub fn roots(&self) -> Vec<TagId> {
        (0..self.tags.len())
            .map(|i| TagId(i as u32))
            .filter(|id| self.parent(*id).is_none())
            .collect()
    }

    /// `id` followed by all its descendants, depth first.
    pub fn descendants(&self, id: TagId) -> Vec<TagId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn add_text(&mut self, id: TagId, text: &str) {
        if let Some(tag) = self.get_mut(id) {
            tag.text.push(text.to_string());
        }
    }

    /// Store the resolved CSS of `id`. Only the first publication takes effect; returns
    /// whether this call stored the map.
    pub fn publish_css(&mut self, id: TagId, css: CssProperties) -> bool {
        let Some(tag) = self.get_mut(id) else {
            return false;
        };
        if tag.css_published {
            log::debug!(target: "tagflow.tree", "css of {:?} already published", id);
            return false;
        }
        tag.css = css;
        tag.css_published = true;
        true
    }
}

impl Index<TagId> for TagTree {
    type Output = Tag;

    fn index(&self, id: TagId) -> &Tag {
        &self.tags[id.index()]
    }
}

pub struct Ancestors<'t> {
    tree: &'t TagTree,
    next: Option<TagId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TagId;

    fn next(&mut self) -> Option<TagId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(tree: &mut TagTree, name: &str) -> TagId {
        tree.create(name, Attributes::new(), None)
    }

    #[test]
    fn append_sets_parent_and_order() {
        let mut tree = TagTree::new();
        let ul = tag(&mut tree, "ul");
        let a = tag(&mut tree, "li");
        let b = tag(&mut tree, "li");
        tree.append_child(ul, a);
        tree.append_child(ul, b);

        assert_eq!(tree.children(ul), &[a, b]);
        assert_eq!(tree.parent(a), Some(ul));
        assert_eq!(tree.last_child(ul), Some(b));
        assert_eq!(tree.roots(), vec![ul]);
    }

    #[test]
    fn reappending_keeps_old_parent_listing() {
        let mut tree = TagTree::new();
        let first = tag(&mut tree, "div");
        let second = tag(&mut tree, "div");
        let child = tag(&mut tree, "span");
        tree.append_child(first, child);
        tree.append_child(second, child);

        assert_eq!(tree.children(first), &[child]);
        assert_eq!(tree.children(second), &[child]);
        assert_eq!(tree.parent(child), Some(second));
    }

    #[test]
    fn detach_then_append_moves_the_tag() {
        let mut tree = TagTree::new();
        let first = tag(&mut tree, "div");
        let second = tag(&mut tree, "div");
        let child = tag(&mut tree, "span");
        tree.append_child(first, child);
        tree.detach(child);
        assert_eq!(tree.parent(child), None);
        tree.append_child(second, child);

        assert!(tree.children(first).is_empty());
        assert_eq!(tree.children(second), &[child]);
    }

    #[test]
    fn has_child_direct_and_recursive() {
        let mut tree = TagTree::new();
        let table = tag(&mut tree, "table");
        let tr = tag(&mut tree, "tr");
        let td = tag(&mut tree, "td");
        tree.append_child(table, tr);
        tree.append_child(tr, td);

        assert!(tree.has_child(table, "tr", false));
        assert!(!tree.has_child(table, "td", false));
        assert!(tree.has_child(table, "td", true));
        assert!(!tree.has_child(table, "th", true));
        assert_eq!(tree.children_named(table, "tr"), vec![tr]);
    }

    #[test]
    fn sibling_offsets() {
        let mut tree = TagTree::new();
        let parent = tag(&mut tree, "p");
        let kids: Vec<TagId> = ["a", "b", "c"].iter().map(|n| tag(&mut tree, n)).collect();
        for k in &kids {
            tree.append_child(parent, *k);
        }

        assert_eq!(tree.sibling(kids[1], -1), Some(kids[0]));
        assert_eq!(tree.sibling(kids[1], 1), Some(kids[2]));
        assert_eq!(tree.sibling(kids[0], 2), Some(kids[2]));
        assert_eq!(tree.sibling(kids[1], 0), Some(kids[1]));
        assert_eq!(tree.sibling(kids[0], -1), None);
        assert_eq!(tree.sibling(kids[2], 1), None);
        assert_eq!(tree.sibling(parent, 1), None);
    }

    #[test]
    fn ancestors_walk_to_the_root() {
        let mut tree = TagTree::new();
        let html = tag(&mut tree, "html");
        let body = tag(&mut tree, "body");
        let p = tag(&mut tree, "p");
        tree.append_child(html, body);
        tree.append_child(body, p);

        assert_eq!(tree.ancestors(p).collect::<Vec<_>>(), vec![body, html]);
        assert_eq!(tree.descendants(html), vec![html, body, p]);
    }

    #[test]
    fn css_is_published_once() {
        let mut tree = TagTree::new();
        let p = tag(&mut tree, "p");
        let first = CssProperties::from([("color".to_string(), "red".to_string())]);
        let second = CssProperties::from([("color".to_string(), "blue".to_string())]);

        assert!(tree.publish_css(p, first));
        assert!(!tree.publish_css(p, second));
        assert_eq!(tree[p].css().get("color").map(String::as_str), Some("red"));
        assert!(tree[p].is_css_published());
    }

    #[test]
    fn classes_split_on_whitespace() {
        let mut tree = TagTree::new();
        let attrs = Attributes::from([("class".to_string(), " a  b\tc ".to_string())]);
        let p = tree.create("p", attrs, None);
        assert_eq!(tree[p].classes().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
