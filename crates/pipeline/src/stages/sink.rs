//! Last stage: hands produced elements to the document builder.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use html::{TagId, TagTree};

use crate::context::{RejectedElement, StageId, WorkerContext};
use crate::element::Element;
use crate::error::{DocumentError, PipelineError};
use crate::process::{ProcessObject, Writable};
use crate::stage::{NextStage, Stage};

/// Collaborator that lays out and renders elements.
pub trait DocumentBuilder: fmt::Debug {
    fn add(&mut self, element: Element) -> Result<(), DocumentError>;

    /// No more elements will arrive.
    fn close(&mut self) -> Result<(), DocumentError> {
        Ok(())
    }
}

/// Document builder that keeps every element in memory. Clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct ElementCollector {
    elements: Rc<RefCell<Vec<Element>>>,
}

impl ElementCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> Vec<Element> {
        self.elements.borrow().clone()
    }

    pub fn take(&self) -> Vec<Element> {
        std::mem::take(&mut *self.elements.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }
}

impl DocumentBuilder for ElementCollector {
    fn add(&mut self, element: Element) -> Result<(), DocumentError> {
        self.elements.borrow_mut().push(element);
        Ok(())
    }
}

/// Per-run counters of the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkContext {
    pub added: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct DocumentSinkStage {
    builder: Box<dyn DocumentBuilder>,
    continue_on_error: bool,
    next: Option<Box<dyn Stage>>,
}

impl DocumentSinkStage {
    pub const ID: StageId = StageId("sink");

    pub fn new(builder: impl DocumentBuilder + 'static) -> Self {
        Self {
            builder: Box::new(builder),
            continue_on_error: false,
            next: None,
        }
    }

    /// Record rejected elements in the worker context instead of failing the run.
    pub fn continue_on_error(mut self, yes: bool) -> Self {
        self.continue_on_error = yes;
        self
    }

    fn write(&mut self, ctx: &mut WorkerContext, po: &mut ProcessObject) -> Result<(), PipelineError> {
        ctx.local::<SinkContext>(Self::ID)?;
        let elements: Vec<Element> = po.drain().flat_map(Writable::into_elements).collect();
        if elements.is_empty() {
            return Ok(());
        }
        let mut added = 0;
        let mut rejected = Vec::new();
        for element in elements {
            let kind = element.kind();
            match self.builder.add(element) {
                Ok(()) => added += 1,
                Err(err) if self.continue_on_error => {
                    log::warn!(target: "tagflow.sink", "{kind} rejected: {err}");
                    rejected.push(RejectedElement {
                        kind,
                        reason: err.reason,
                    });
                }
                Err(err) => {
                    log::error!(target: "tagflow.sink", "{kind} rejected: {err}");
                    return Err(PipelineError::ElementRejected { reason: err.reason });
                }
            }
        }
        let local = ctx.local_mut::<SinkContext>(Self::ID)?;
        local.added += added;
        local.rejected += rejected.len();
        for entry in rejected {
            ctx.record_rejection(entry);
        }
        Ok(())
    }
}

impl Stage for DocumentSinkStage {
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
        ctx.put(Self::ID, SinkContext::default());
        Ok(())
    }

    fn open(
        &mut self,
        ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.write(ctx, po)?;
        Ok(self.next.as_deref_mut())
    }

    fn content(
        &mut self,
        ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        _text: &str,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.write(ctx, po)?;
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.write(ctx, po)?;
        Ok(self.next.as_deref_mut())
    }

    fn finish(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        let local = ctx.local::<SinkContext>(Self::ID)?;
        log::debug!(
            target: "tagflow.sink",
            "document closed with {} elements, {} rejected",
            local.added,
            local.rejected
        );
        self.builder
            .close()
            .map_err(|err| PipelineError::ElementRejected { reason: err.reason })
    }
}
