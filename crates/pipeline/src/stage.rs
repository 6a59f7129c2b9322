//! Stage chain and its lifecycle.

use std::fmt;

use html::{TagId, TagTree};

use crate::context::{StageId, WorkerContext};
use crate::error::PipelineError;
use crate::process::ProcessObject;

/// The stage an event moves on to, `None` at the end of the chain.
pub type NextStage<'s> = Option<&'s mut (dyn Stage + 'static)>;

/// One link of a pipeline.
///
/// Every event handler returns the stage that receives the event next; the driver keeps
/// calling until a handler returns `None`. `po` carries the output of the previous stage
/// and receives this stage's output.
pub trait Stage: fmt::Debug {
    fn id(&self) -> StageId;

    /// Attach the stage that follows this one.
    fn set_next(&mut self, next: Box<dyn Stage>);

    fn next_mut(&mut self) -> NextStage<'_>;

    /// Register this stage's context. Called once per run, in chain order, before events.
    fn init(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError>;

    fn open(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError>;

    fn content(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        text: &str,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError>;

    fn close(
        &mut self,
        ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError>;

    /// End of the run.
    fn finish(&mut self, _ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Initialized,
    Running,
    Closed,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Event<'e> {
    Open,
    Content(&'e str),
    Close,
}

/// Run `init` of `head` and every stage after it.
pub(crate) fn init_chain(head: &mut (dyn Stage + 'static), ctx: &mut WorkerContext) -> Result<(), PipelineError> {
    let mut current: NextStage<'_> = Some(head);
    while let Some(stage) = current {
        log::debug!(target: "tagflow.pipeline", "init {}", stage.id());
        stage.init(ctx)?;
        current = stage.next_mut();
    }
    Ok(())
}

/// Pass one event down the chain starting at `head` until a stage returns `None`.
pub(crate) fn drive(
    head: &mut (dyn Stage + 'static),
    ctx: &mut WorkerContext,
    tree: &mut TagTree,
    tag: TagId,
    event: Event<'_>,
    po: &mut ProcessObject,
) -> Result<(), PipelineError> {
    let mut current: NextStage<'_> = Some(head);
    while let Some(stage) = current {
        current = match event {
            Event::Open => stage.open(ctx, tree, tag, po)?,
            Event::Content(text) => stage.content(ctx, tree, tag, text, po)?,
            Event::Close => stage.close(ctx, tree, tag, po)?,
        };
    }
    Ok(())
}

pub(crate) fn finish_chain(head: &mut (dyn Stage + 'static), ctx: &mut WorkerContext) -> Result<(), PipelineError> {
    let mut current: NextStage<'_> = Some(head);
    while let Some(stage) = current {
        stage.finish(ctx)?;
        current = stage.next_mut();
    }
    Ok(())
}

/// A chain of stages with the worker context of the current run.
#[derive(Debug)]
pub struct Pipeline {
    head: Box<dyn Stage>,
    state: PipelineState,
    context: WorkerContext,
}

impl Pipeline {
    /// Pipeline running the chain that starts at `head`.
    pub fn new(head: Box<dyn Stage>) -> Self {
        Self {
            head,
            state: PipelineState::Uninitialized,
            context: WorkerContext::new(),
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn context(&self) -> &WorkerContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorkerContext {
        &mut self.context
    }

    /// Run `init` of every stage in chain order.
    pub fn init(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Uninitialized => {}
            PipelineState::Closed => return Err(PipelineError::Closed),
            _ => {
                log::debug!(target: "tagflow.pipeline", "init called twice; ignoring");
                return Ok(());
            }
        }
        init_chain(&mut *self.head, &mut self.context)?;
        self.state = PipelineState::Initialized;
        Ok(())
    }

    pub fn open(&mut self, tree: &mut TagTree, tag: TagId) -> Result<(), PipelineError> {
        self.dispatch(tree, tag, Event::Open)
    }

    pub fn content(&mut self, tree: &mut TagTree, tag: TagId, text: &str) -> Result<(), PipelineError> {
        self.dispatch(tree, tag, Event::Content(text))
    }

    pub fn close(&mut self, tree: &mut TagTree, tag: TagId) -> Result<(), PipelineError> {
        self.dispatch(tree, tag, Event::Close)
    }

    fn dispatch(&mut self, tree: &mut TagTree, tag: TagId, event: Event<'_>) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Uninitialized => return Err(PipelineError::NotInitialized),
            PipelineState::Closed => return Err(PipelineError::Closed),
            PipelineState::Initialized => self.state = PipelineState::Running,
            PipelineState::Running => {}
        }
        let mut po = ProcessObject::new();
        drive(&mut *self.head, &mut self.context, tree, tag, event, &mut po)?;
        if !po.is_empty() {
            log::debug!(
                target: "tagflow.pipeline",
                "{} writables left undrained at the end of the chain",
                po.len()
            );
        }
        Ok(())
    }

    /// Let every stage finish and close the pipeline. Further events fail with
    /// [`PipelineError::Closed`].
    pub fn finish(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Uninitialized => return Err(PipelineError::NotInitialized),
            PipelineState::Closed => return Err(PipelineError::Closed),
            _ => {}
        }
        self.state = PipelineState::Closed;
        finish_chain(&mut *self.head, &mut self.context)
    }
}

/// Collects stages in chain order and links them.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Link the stages. `None` when no stage was added.
    pub fn build(self) -> Option<Pipeline> {
        let mut next: Option<Box<dyn Stage>> = None;
        for mut stage in self.stages.into_iter().rev() {
            if let Some(following) = next.take() {
                stage.set_next(following);
            }
            next = Some(stage);
        }
        next.map(Pipeline::new)
    }
}
