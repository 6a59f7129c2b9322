//! Turns tags and their text into element descriptions.

mod processors;

pub use processors::{
    AnchorProcessor, BlockProcessor, BreakProcessor, CellProcessor, IgnoredProcessor,
    ImageProcessor, InlineProcessor, ListItemProcessor, ListProcessor, RootProcessor,
    RowProcessor, RuleProcessor, TableProcessor, TagProcessor, TagProcessors,
    TransparentProcessor, paragraphs,
};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use html::{TagId, TagTree};

use crate::config::{PageSize, WorkerConfig};
use crate::context::{StageId, WorkerContext};
use crate::element::{Element, Image};
use crate::error::PipelineError;
use crate::process::ProcessObject;
use crate::resource::ResourceLocator;
use crate::stage::{NextStage, Stage};

/// Anchors and link targets met in a document.
#[derive(Clone, Debug, Default)]
pub struct LinkTable {
    anchors: Vec<String>,
    links: Vec<String>,
}

impl LinkTable {
    pub fn add_anchor(&mut self, name: &str) {
        if !self.has_anchor(name) {
            self.anchors.push(name.to_string());
        }
    }

    pub fn has_anchor(&self, name: &str) -> bool {
        self.anchors.iter().any(|a| a == name)
    }

    pub fn add_link(&mut self, href: &str) {
        self.links.push(href.to_string());
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Local links (`#name`) whose anchor never appeared.
    pub fn unresolved(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter_map(|l| l.strip_prefix('#'))
            .filter(|name| !self.has_anchor(name))
            .collect()
    }
}

#[derive(Debug)]
struct StackEntry {
    tag: TagId,
    collected: Vec<Element>,
}

#[derive(Debug)]
struct NestedScope {
    tag: TagId,
    context: HtmlContext,
}

/// Per-run state of [`HtmlStage`].
///
/// A clone shares the processor registry, the link table and the resource locator with
/// the original. It copies the page size and root tags, and starts with an empty image
/// cache and nothing buffered.
#[derive(Debug)]
pub struct HtmlContext {
    processors: Rc<TagProcessors>,
    links: Rc<RefCell<LinkTable>>,
    locator: Option<Rc<ResourceLocator>>,
    page_size: PageSize,
    root_tags: HashSet<String>,
    images: HashMap<String, Option<Vec<u8>>>,
    stack: Vec<StackEntry>,
    output: Vec<Element>,
    nested: Vec<NestedScope>,
}

impl Clone for HtmlContext {
    fn clone(&self) -> Self {
        Self {
            processors: Rc::clone(&self.processors),
            links: Rc::clone(&self.links),
            locator: self.locator.clone(),
            page_size: self.page_size,
            root_tags: self.root_tags.clone(),
            images: HashMap::new(),
            stack: Vec::new(),
            output: Vec::new(),
            nested: Vec::new(),
        }
    }
}

impl HtmlContext {
    pub fn links(&self) -> &Rc<RefCell<LinkTable>> {
        &self.links
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
    }

    pub fn root_tags(&self) -> &HashSet<String> {
        &self.root_tags
    }

    /// Number of cached image lookups.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    /// Bytes of the image at `source`, retrieved once per context. `None` without a
    /// locator or when retrieval fails.
    pub fn image_data(&mut self, source: &str) -> Option<Vec<u8>> {
        if let Some(cached) = self.images.get(source) {
            return cached.clone();
        }
        let data = self
            .locator
            .as_ref()
            .and_then(|locator| match locator.retrieve(source) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!(target: "tagflow.pipeline", "image {source} not loaded: {err}");
                    None
                }
            });
        self.images.insert(source.to_string(), data.clone());
        data
    }

    fn processor_for(&self, name: &str) -> Rc<dyn TagProcessor> {
        if let Some(processor) = self.processors.get(name) {
            return processor;
        }
        if self.root_tags.contains(name) {
            self.processors.root()
        } else {
            self.processors.fallback()
        }
    }

    /// Context events currently go to: the innermost nested scope or this one.
    fn active_mut(&mut self) -> &mut HtmlContext {
        match self.nested.len() {
            0 => self,
            n => &mut self.nested[n - 1].context,
        }
    }

    fn add(&mut self, elements: Vec<Element>) {
        match self.stack.last_mut() {
            Some(top) => top.collected.extend(elements),
            None => self.output.extend(elements),
        }
    }

    fn into_collected(mut self) -> Vec<Element> {
        let mut out = std::mem::take(&mut self.output);
        for entry in self.stack.drain(..) {
            out.extend(entry.collected);
        }
        out
    }
}

#[derive(Debug)]
pub struct HtmlStage {
    processors: Rc<TagProcessors>,
    locator: Option<Rc<ResourceLocator>>,
    page_size: PageSize,
    root_tags: HashSet<String>,
    next: Option<Box<dyn Stage>>,
}

impl HtmlStage {
    pub const ID: StageId = StageId("html");

    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            processors: Rc::new(TagProcessors::default()),
            locator: None,
            page_size: config.page_size,
            root_tags: config.root_tags.iter().cloned().collect(),
            next: None,
        }
    }

    pub fn with_processors(mut self, processors: TagProcessors) -> Self {
        self.processors = Rc::new(processors);
        self
    }

    /// Retrieve image bytes through `locator`.
    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = Some(Rc::new(locator));
        self
    }
}

impl Stage for HtmlStage {
    fn id(&self) -> StageId {
        Self::ID
    }

    fn set_next(&mut self, next: Box<dyn Stage>) {
        self.next = Some(next);
    }

    fn next_mut(&mut self) -> NextStage<'_> {
        self.next.as_deref_mut()
    }

    fn init(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        ctx.put(
            Self::ID,
            HtmlContext {
                processors: Rc::clone(&self.processors),
                links: Rc::default(),
                locator: self.locator.clone(),
                page_size: self.page_size,
                root_tags: self.root_tags.clone(),
                images: HashMap::new(),
                stack: Vec::new(),
                output: Vec::new(),
                nested: Vec::new(),
            },
        );
        Ok(())
    }

    fn open(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let root = ctx.local_mut::<HtmlContext>(Self::ID)?;
        let element = &tree[tag];
        let processor = root.active_mut().processor_for(element.name());
        if processor.nested_context() {
            log::debug!(target: "tagflow.pipeline", "nested context for <{}>", element.name());
            let context = root.active_mut().clone();
            root.nested.push(NestedScope { tag, context });
        }
        let active = root.active_mut();
        if processor.is_stack_owner() {
            active.stack.push(StackEntry {
                tag,
                collected: Vec::new(),
            });
        }
        let produced = processor.start(active, element);
        active.add(produced);
        po.add_elements(std::mem::take(&mut root.output));
        Ok(self.next.as_deref_mut())
    }

    fn content(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        text: &str,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let root = ctx.local_mut::<HtmlContext>(Self::ID)?;
        let element = &tree[tag];
        let active = root.active_mut();
        let processor = active.processor_for(element.name());
        let produced = processor.content(active, element, text);
        active.add(produced);
        po.add_elements(std::mem::take(&mut root.output));
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let root = ctx.local_mut::<HtmlContext>(Self::ID)?;
        let element = &tree[tag];
        let processor = root.active_mut().processor_for(element.name());
        let collected = if processor.nested_context() {
            if root.nested.last().is_some_and(|scope| scope.tag == tag) {
                root.nested
                    .pop()
                    .map(|scope| scope.context.into_collected())
                    .unwrap_or_default()
            } else {
                log::debug!(target: "tagflow.pipeline", "no nested scope open for <{}>", element.name());
                Vec::new()
            }
        } else if processor.is_stack_owner() {
            let active = root.active_mut();
            if active.stack.last().is_some_and(|entry| entry.tag == tag) {
                active
                    .stack
                    .pop()
                    .map(|entry| entry.collected)
                    .unwrap_or_default()
            } else {
                log::debug!(target: "tagflow.pipeline", "<{}> closed out of order", element.name());
                Vec::new()
            }
        } else {
            Vec::new()
        };
        let active = root.active_mut();
        let produced = processor.end(active, element, collected);
        active.add(produced);
        po.add_elements(std::mem::take(&mut root.output));
        Ok(self.next.as_deref_mut())
    }

    fn finish(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        let root = ctx.local_mut::<HtmlContext>(Self::ID)?;
        if !root.stack.is_empty() || !root.nested.is_empty() {
            log::debug!(
                target: "tagflow.pipeline",
                "{} open blocks and {} nested scopes discarded at finish",
                root.stack.len(),
                root.nested.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> HtmlContext {
        let mut ctx = WorkerContext::new();
        let mut stage = HtmlStage::new(&WorkerConfig::default());
        stage.init(&mut ctx).unwrap();
        ctx.local::<HtmlContext>(HtmlStage::ID).unwrap().clone()
    }

    #[test]
    fn clone_shares_links_but_not_images() {
        let mut original = context();
        original.image_data("a.png");
        original.links().borrow_mut().add_anchor("top");

        let mut nested = original.clone();
        assert_eq!(nested.cached_images(), 0);
        nested.links().borrow_mut().add_link("#top");
        nested.links().borrow_mut().add_link("#missing");
        nested.set_page_size(PageSize {
            width: 100.0,
            height: 100.0,
        });

        assert_eq!(original.cached_images(), 1);
        assert_eq!(original.links().borrow().links().len(), 2);
        assert_eq!(original.links().borrow().unresolved(), vec!["missing"]);
        assert_eq!(original.page_size(), PageSize::A4);
        assert!(nested.root_tags().contains("body"));
    }

    #[test]
    fn processor_lookup_falls_back() {
        let ctx = context();
        assert!(ctx.processor_for("td").nested_context());
        assert!(!ctx.processor_for("body").is_stack_owner());
        assert!(!ctx.processor_for("made-up").is_stack_owner());
    }
}
