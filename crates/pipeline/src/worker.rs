//! Drives a pipeline from tokenizer events.

use css::CssFiles;
use html::{Attributes, ParserListener, TagId, TagTree, Tokenizer, TreeBuilder};

use crate::config::WorkerConfig;
use crate::context::RejectedElement;
use crate::error::PipelineError;
use crate::resource::ResourceLocator;
use crate::stage::{Pipeline, Stage};
use crate::stages::{CssResolverStage, DocumentBuilder, DocumentSinkStage, HtmlStage};

/// Outcome of a completed run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// Start tags seen.
    pub tags: usize,
    /// Elements the document builder refused while the run continued.
    pub rejected: Vec<RejectedElement>,
}

/// Builds the tag tree from tokenizer events and sends every tag through the pipeline.
///
/// A tag opens when its start tag arrives, receives its text runs as content, and closes
/// when it is popped from the open-tag stack, which includes tags closed implicitly by an
/// outer end tag or by the end of input.
#[derive(Debug)]
pub struct Worker {
    tokenizer: Tokenizer,
    builder: TreeBuilder,
    pipeline: Pipeline,
    tags: usize,
}

impl Worker {
    /// Initialize `pipeline` and wrap it in a worker.
    pub fn new(config: &WorkerConfig, mut pipeline: Pipeline) -> Result<Self, PipelineError> {
        pipeline.init()?;
        Ok(Self {
            tokenizer: Tokenizer::new(config.tokenizer.clone()),
            builder: TreeBuilder::new(),
            pipeline,
            tags: 0,
        })
    }

    /// Feed a chunk of markup. May be called any number of times before [`Worker::finish`].
    pub fn feed(&mut self, input: &str) -> Result<(), PipelineError> {
        let mut tokenizer = std::mem::take(&mut self.tokenizer);
        let result = tokenizer.push_str(input, self);
        self.tokenizer = tokenizer;
        result
    }

    /// Flush pending text, close every open tag and finish the pipeline.
    pub fn finish(&mut self) -> Result<RunReport, PipelineError> {
        let mut tokenizer = std::mem::take(&mut self.tokenizer);
        let result = tokenizer.finish(self);
        self.tokenizer = tokenizer;
        result?;
        Ok(RunReport {
            tags: self.tags,
            rejected: self.pipeline.context_mut().take_rejected(),
        })
    }

    /// Feed all of `input` and finish.
    pub fn parse(&mut self, input: &str) -> Result<RunReport, PipelineError> {
        self.feed(input)?;
        self.finish()
    }

    pub fn tree(&self) -> &TagTree {
        self.builder.tree()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn into_tree(self) -> TagTree {
        self.builder.into_tree()
    }

    fn close_all(&mut self, tags: Vec<TagId>) -> Result<(), PipelineError> {
        for tag in tags {
            self.pipeline.close(self.builder.tree_mut(), tag)?;
        }
        Ok(())
    }
}

impl ParserListener for Worker {
    type Error = PipelineError;

    fn start_element(
        &mut self,
        name: &str,
        attributes: Attributes,
        namespace: Option<&str>,
    ) -> Result<(), PipelineError> {
        self.tags += 1;
        let tag = self.builder.start(name, attributes, namespace);
        self.pipeline.open(self.builder.tree_mut(), tag)
    }

    fn end_element(&mut self, name: &str, _namespace: Option<&str>) -> Result<(), PipelineError> {
        let popped = self.builder.end(name);
        self.close_all(popped)
    }

    fn text(&mut self, text: &str) -> Result<(), PipelineError> {
        match self.builder.text(text) {
            Some(tag) => self.pipeline.content(self.builder.tree_mut(), tag, text),
            None => {
                log::debug!(target: "tagflow.pipeline", "text outside any tag dropped");
                Ok(())
            }
        }
    }

    fn close(&mut self) -> Result<(), PipelineError> {
        let open = self.builder.finish();
        self.close_all(open)?;
        self.pipeline.finish()
    }
}

/// CSS resolution, element production and the document sink, configured from `config`.
pub fn default_pipeline(
    config: &WorkerConfig,
    files: CssFiles,
    builder: impl DocumentBuilder + 'static,
    locator: Option<ResourceLocator>,
) -> Pipeline {
    let mut css = CssResolverStage::with_default_css(files).with_default_charset(config.default_charset.clone());
    let mut html = HtmlStage::new(config);
    if let Some(locator) = locator {
        css = css.with_locator(locator.clone());
        html = html.with_locator(locator);
    }
    let sink = DocumentSinkStage::new(builder).continue_on_error(config.continue_on_element_error);

    html.set_next(Box::new(sink));
    css.set_next(Box::new(html));
    Pipeline::new(Box::new(css))
}

/// Run `input` through the default pipeline without a resource provider.
pub fn parse_html(
    input: &str,
    config: &WorkerConfig,
    files: CssFiles,
    builder: impl DocumentBuilder + 'static,
) -> Result<RunReport, PipelineError> {
    let pipeline = default_pipeline(config, files, builder, None);
    Worker::new(config, pipeline)?.parse(input)
}
