use html::{TagId, TagTree};

use crate::context::{StageId, WorkerContext};
use crate::error::PipelineError;
use crate::process::ProcessObject;
use crate::stage::{Event, NextStage, Stage, drive, finish_chain, init_chain};

/// Passes every event to each delegate chain in registration order, then on to the next
/// stage unchanged.
///
/// Each delegate chain works on its own copy of the incoming process object, so the main
/// chain sees exactly what arrived here. Delegates of the same kind share one context.
#[derive(Debug, Default)]
pub struct ForwardingStage {
    delegates: Vec<Box<dyn Stage>>,
    next: Option<Box<dyn Stage>>,
}

impl ForwardingStage {
    pub const ID: StageId = StageId("forward");

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delegate; it may be the head of a chain of its own.
    pub fn add_delegate(&mut self, delegate: impl Stage + 'static) {
        self.delegates.push(Box::new(delegate));
    }

    pub fn with_delegate(mut self, delegate: impl Stage + 'static) -> Self {
        self.add_delegate(delegate);
        self
    }

    pub fn delegates(&self) -> usize {
        self.delegates.len()
    }

    fn forward(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        event: Event<'_>,
        po: &ProcessObject,
    ) -> Result<(), PipelineError> {
        for delegate in &mut self.delegates {
            let mut copy = po.clone();
            drive(&mut **delegate, ctx, tree, tag, event, &mut copy)?;
        }
        Ok(())
    }
}

impl Stage for ForwardingStage {
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
        for delegate in &mut self.delegates {
            init_chain(&mut **delegate, ctx)?;
        }
        Ok(())
    }

    fn open(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.forward(ctx, tree, tag, Event::Open, po)?;
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
        self.forward(ctx, tree, tag, Event::Content(text), po)?;
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.forward(ctx, tree, tag, Event::Close, po)?;
        Ok(self.next.as_deref_mut())
    }

    fn finish(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        for delegate in &mut self.delegates {
            finish_chain(&mut **delegate, ctx)?;
        }
        Ok(())
    }
}
