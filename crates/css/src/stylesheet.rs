//! Rule entries accumulated from stylesheet sources.

use std::sync::Arc;

use html::{CssProperties, TagId, TagTree};

use crate::declarations::{parse_declaration_block, split_selector_list};
use crate::selector::Selector;

/// One selector with the declarations of the rule it came from.
#[derive(Clone, Debug)]
pub struct RuleEntry {
    selector: Selector,
    declarations: CssProperties,
}

impl RuleEntry {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn declarations(&self) -> &CssProperties {
        &self.declarations
    }

    pub fn specificity(&self) -> u32 {
        self.selector.specificity()
    }
}

/// Rule entries of one or more stylesheet sources, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct CssFile {
    entries: Vec<RuleEntry>,
    persistent: bool,
}

impl CssFile {
    pub fn new(persistent: bool) -> Self {
        Self {
            entries: Vec::new(),
            persistent,
        }
    }

    /// Whether this file survives [`CssFiles::clear_transient`].
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add one entry for a single selector. Returns `false` when the selector is rejected.
    pub fn add(&mut self, selector: &str, declarations: CssProperties) -> bool {
        let Some(selector) = Selector::parse(selector) else {
            log::warn!(target: "tagflow.css", "dropping rule with invalid selector {selector:?}");
            return false;
        };
        self.entries.push(RuleEntry {
            selector,
            declarations,
        });
        true
    }

    /// Add a rule whose selector text may list several comma separated selectors. Each
    /// valid selector becomes its own entry. Returns how many entries were added.
    pub fn add_rule(&mut self, selectors: &str, body: &str) -> usize {
        let declarations = parse_declaration_block(body);
        if declarations.is_empty() {
            return 0;
        }
        split_selector_list(selectors)
            .into_iter()
            .filter(|s| self.add(s, declarations.clone()))
            .count()
    }

    /// Entries whose selector matches `id`, in declaration order.
    pub fn matching<'f>(&'f self, tree: &TagTree, id: TagId) -> Vec<&'f RuleEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.selector.matches(tree, id))
            .collect()
    }
}

/// The stylesheets in effect for a parse run. Persistent files are shared across runs.
#[derive(Clone, Debug, Default)]
pub struct CssFiles {
    files: Vec<Arc<CssFile>>,
}

impl CssFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: CssFile) {
        self.add_shared(Arc::new(file));
    }

    pub fn add_shared(&mut self, file: Arc<CssFile>) {
        log::debug!(
            target: "tagflow.css",
            "adding css file with {} entries (persistent: {})",
            file.len(),
            file.is_persistent()
        );
        self.files.push(file);
    }

    pub fn files(&self) -> &[Arc<CssFile>] {
        &self.files
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Drop every file that is not persistent.
    pub fn clear_transient(&mut self) {
        self.files.retain(|f| f.is_persistent());
    }

    /// Matching entries across all files, sorted by ascending specificity. Entries of equal
    /// specificity keep file then declaration order.
    pub fn matching<'f>(&'f self, tree: &TagTree, id: TagId) -> Vec<&'f RuleEntry> {
        let mut matched: Vec<&RuleEntry> = self
            .files
            .iter()
            .flat_map(|file| file.matching(tree, id))
            .collect();
        matched.sort_by_key(|entry| entry.specificity());
        matched
    }
}
