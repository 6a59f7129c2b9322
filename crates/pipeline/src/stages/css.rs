//! Resolves and publishes the CSS of every tag as it opens.

use std::sync::{Arc, OnceLock};

use css::{CssFile, CssFileProcessor, CssFiles, InheritanceRules, StyleResolver, parse_css};
use html::{TagId, TagTree};

use crate::context::{StageId, WorkerContext};
use crate::error::PipelineError;
use crate::process::ProcessObject;
use crate::resource::ResourceLocator;
use crate::stage::{NextStage, Stage};

/// Persistent stylesheet every document starts from.
pub const DEFAULT_CSS: &str = "\
b, strong { font-weight: bold }
i, em, cite, var, dfn { font-style: italic }
u, ins { text-decoration: underline }
s, strike, del { text-decoration: line-through }
a { color: #0000ff; text-decoration: underline }
h1 { font-size: 24pt; font-weight: bold }
h2 { font-size: 18pt; font-weight: bold }
h3 { font-size: 14pt; font-weight: bold }
h4 { font-size: 12pt; font-weight: bold }
h5 { font-size: 10pt; font-weight: bold }
h6 { font-size: 8pt; font-weight: bold }
th { font-weight: bold; text-align: center }
pre, code, tt, kbd, samp { font-family: monospace }
center { text-align: center }
big { font-size: larger }
small { font-size: smaller }
";

/// Per-run state: the resolver with every stylesheet met so far.
#[derive(Clone, Debug)]
pub struct CssContext {
    resolver: StyleResolver,
    /// Text of the `<style>` element being read.
    style_text: Option<String>,
}

impl CssContext {
    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }
}

#[derive(Debug)]
pub struct CssResolverStage {
    resolver: StyleResolver,
    locator: Option<ResourceLocator>,
    default_charset: String,
    next: Option<Box<dyn Stage>>,
}

impl CssResolverStage {
    pub const ID: StageId = StageId("css-resolver");

    /// Stage resolving against `files` only.
    pub fn new(files: CssFiles) -> Self {
        Self {
            resolver: StyleResolver::new(files),
            locator: None,
            default_charset: "utf-8".to_string(),
            next: None,
        }
    }

    /// Stage resolving against [`DEFAULT_CSS`] followed by `files`.
    pub fn with_default_css(files: CssFiles) -> Self {
        let mut all = CssFiles::new();
        all.add_shared(default_css());
        for file in files.files() {
            all.add_shared(Arc::clone(file));
        }
        Self::new(all)
    }

    pub fn with_inheritance_rules(mut self, rules: impl InheritanceRules + 'static) -> Self {
        self.resolver = self.resolver.with_inheritance_rules(rules);
        self
    }

    /// Load `<link rel="stylesheet">` references through `locator`.
    pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = charset.into();
        self
    }

    fn load_linked(&self, tree: &TagTree, tag: TagId) -> Option<CssFile> {
        let tag = &tree[tag];
        let is_stylesheet = tag
            .attribute("rel")
            .is_some_and(|rel| rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
        let is_css = tag
            .attribute("type")
            .is_none_or(|t| t.trim().eq_ignore_ascii_case("text/css"));
        let href = tag.attribute("href")?;
        if !is_stylesheet || !is_css {
            return None;
        }
        let Some(locator) = &self.locator else {
            log::warn!(target: "tagflow.css", "no resource provider configured; skipping stylesheet {href}");
            return None;
        };
        match locator.retrieve(href) {
            Ok(bytes) => {
                let charset = tag.attribute("charset").unwrap_or(&self.default_charset);
                let mut processor = CssFileProcessor::new(false);
                processor.push_bytes(&bytes, Some(charset));
                Some(processor.finish())
            }
            Err(err) => {
                log::warn!(target: "tagflow.css", "stylesheet {href} not loaded: {err}");
                None
            }
        }
    }
}

/// [`DEFAULT_CSS`], parsed once per process and shared by every stage.
fn default_css() -> Arc<CssFile> {
    static PARSED: OnceLock<Arc<CssFile>> = OnceLock::new();
    Arc::clone(PARSED.get_or_init(|| Arc::new(parse_css(DEFAULT_CSS, true))))
}

impl Stage for CssResolverStage {
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
            CssContext {
                resolver: self.resolver.clone(),
                style_text: None,
            },
        );
        Ok(())
    }

    fn open(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        _po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let linked = match tree[tag].name() {
            "link" => self.load_linked(tree, tag),
            _ => None,
        };
        let local = ctx.local_mut::<CssContext>(Self::ID)?;
        if let Some(file) = linked {
            local.resolver.files_mut().add(file);
        }
        if tree[tag].name() == "style" {
            local.style_text = Some(String::new());
        }
        local.resolver.resolve_and_publish(tree, tag);
        Ok(self.next.as_deref_mut())
    }

    fn content(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        text: &str,
        _po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let local = ctx.local_mut::<CssContext>(Self::ID)?;
        if tree[tag].name() == "style" {
            if let Some(style) = &mut local.style_text {
                style.push_str(text);
            }
        }
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        _po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        let local = ctx.local_mut::<CssContext>(Self::ID)?;
        if tree[tag].name() == "style" {
            if let Some(style) = local.style_text.take() {
                let file = parse_css(&style, false);
                log::debug!(target: "tagflow.css", "<style> element added {} entries", file.len());
                local.resolver.files_mut().add(file);
            }
        }
        Ok(self.next.as_deref_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stylesheet_is_parsed_once_and_shared() {
        let first = CssResolverStage::with_default_css(CssFiles::new());
        let second = CssResolverStage::with_default_css(CssFiles::new());
        let a = &first.resolver.files().files()[0];
        let b = &second.resolver.files().files()[0];
        assert!(Arc::ptr_eq(a, b));
        assert!(a.is_persistent());
        assert!(!a.is_empty());
    }
}
