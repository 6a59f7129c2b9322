//! Per-run state of a pipeline, keyed by stage.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::PipelineError;

/// Identity of a stage within a pipeline. Stages of the same kind share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(pub &'static str);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// State a stage keeps for the duration of a run.
///
/// Cloning produces the independent context used for nested processing. Each context type
/// decides per field what a clone shares (usually through `Rc`) and what it starts fresh.
pub trait StageContext: Any + fmt::Debug {
    fn clone_context(&self) -> Box<dyn StageContext>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + fmt::Debug> StageContext for T {
    fn clone_context(&self) -> Box<dyn StageContext> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An element the document builder refused while the run continued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedElement {
    pub kind: &'static str,
    pub reason: String,
}

/// Container of every stage-local context of one parse run.
#[derive(Debug, Default)]
pub struct WorkerContext {
    locals: HashMap<StageId, Box<dyn StageContext>>,
    rejected: Vec<RejectedElement>,
}

impl WorkerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the context of `stage`.
    pub fn put<T: StageContext>(&mut self, stage: StageId, context: T) {
        log::debug!(target: "tagflow.pipeline", "context registered for stage {stage}");
        self.locals.insert(stage, Box::new(context));
    }

    pub fn has_local(&self, stage: StageId) -> bool {
        self.locals.contains_key(&stage)
    }

    pub fn local<T: 'static>(&self, stage: StageId) -> Result<&T, PipelineError> {
        self.locals
            .get(&stage)
            .map(|local| &**local)
            .ok_or(PipelineError::MissingContext { stage })?
            .as_any()
            .downcast_ref::<T>()
            .ok_or(PipelineError::ContextType { stage })
    }

    pub fn local_mut<T: 'static>(&mut self, stage: StageId) -> Result<&mut T, PipelineError> {
        self.locals
            .get_mut(&stage)
            .map(|local| &mut **local)
            .ok_or(PipelineError::MissingContext { stage })?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(PipelineError::ContextType { stage })
    }

    /// Independent copy for a nested run: every stage context is cloned with its own
    /// sharing rules and the rejection log starts empty.
    pub fn fork(&self) -> WorkerContext {
        log::debug!(target: "tagflow.pipeline", "forking worker context ({} stages)", self.locals.len());
        WorkerContext {
            locals: self
                .locals
                .iter()
                .map(|(id, local)| (*id, (**local).clone_context()))
                .collect(),
            rejected: Vec::new(),
        }
    }

    pub fn record_rejection(&mut self, rejected: RejectedElement) {
        self.rejected.push(rejected);
    }

    pub fn rejected(&self) -> &[RejectedElement] {
        &self.rejected
    }

    pub fn take_rejected(&mut self) -> Vec<RejectedElement> {
        std::mem::take(&mut self.rejected)
    }
}
