//! Builds a [`TagTree`] from tokenizer events.

use std::convert::Infallible;

use crate::event::{Attributes, ParserListener};
use crate::tag::{TagId, TagTree};
use crate::tokenizer::Tokenizer;

/// Maintains the stack of open tags while events arrive.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: TagTree,
    open: Vec<TagId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tag as last child of the current open tag (or as a root) and open it.
    pub fn start(&mut self, name: &str, attributes: Attributes, namespace: Option<&str>) -> TagId {
        let id = self
            .tree
            .create(name, attributes, namespace.map(str::to_string));
        if let Some(parent) = self.current() {
            self.tree.append_child(parent, id);
        }
        self.open.push(id);
        id
    }

    /// Pop open tags down to and including the innermost tag named `name`.
    ///
    /// Returns every popped tag, innermost first. An end tag without a matching open tag is
    /// ignored and yields nothing.
    pub fn end(&mut self, name: &str) -> Vec<TagId> {
        let Some(position) = self
            .open
            .iter()
            .rposition(|id| self.tree[*id].name() == name)
        else {
            log::debug!(target: "tagflow.tree", "ignoring unmatched end tag {name:?}");
            return Vec::new();
        };
        let mut popped = self.open.split_off(position);
        popped.reverse();
        popped
    }

    /// Associate a text run with the current open tag.
    pub fn text(&mut self, text: &str) -> Option<TagId> {
        let current = self.current()?;
        self.tree.add_text(current, text);
        Some(current)
    }

    /// Close everything still open, innermost first.
    pub fn finish(&mut self) -> Vec<TagId> {
        let mut popped = std::mem::take(&mut self.open);
        popped.reverse();
        popped
    }

    pub fn current(&self) -> Option<TagId> {
        self.open.last().copied()
    }

    pub fn open_tags(&self) -> &[TagId] {
        &self.open
    }

    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TagTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> TagTree {
        self.tree
    }
}

impl ParserListener for TreeBuilder {
    type Error = Infallible;

    fn start_element(
        &mut self,
        name: &str,
        attributes: Attributes,
        namespace: Option<&str>,
    ) -> Result<(), Infallible> {
        self.start(name, attributes, namespace);
        Ok(())
    }

    fn end_element(&mut self, name: &str, _namespace: Option<&str>) -> Result<(), Infallible> {
        self.end(name);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Infallible> {
        TreeBuilder::text(self, text);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        self.finish();
        Ok(())
    }
}

/// Tokenize `input` with the default configuration and build its tag tree.
pub fn build_tag_tree(input: &str) -> TagTree {
    let mut tokenizer = Tokenizer::default();
    let mut builder = TreeBuilder::new();
    let result = tokenizer
        .push_str(input, &mut builder)
        .and_then(|()| tokenizer.finish(&mut builder));
    match result {
        Ok(()) => builder.into_tree(),
        Err(never) => match never {},
    }
}
