//! Staged processing of parsed markup into structured document elements.
//!
//! A [`Worker`] feeds tokenizer events into a tag tree and sends every tag through a
//! [`Pipeline`] of [`Stage`]s. Stages keep their per-run state in the [`WorkerContext`]
//! and hand their output to the next stage through a [`ProcessObject`].

mod config;
mod context;
mod element;
mod error;
mod events;
mod process;
mod resource;
mod stage;
pub mod stages;
mod worker;

pub use crate::config::{PageSize, WorkerConfig};
pub use crate::context::{RejectedElement, StageContext, StageId, WorkerContext};
pub use crate::element::{
    Alignment, Cell, Chunk, Element, Image, List, Paragraph, Table, TextStyle,
};
pub use crate::error::{DocumentError, PipelineError, ResourceError};
pub use crate::events::{
    PageEventForwarder, PageEvents, SplitTableEvents, TableEventForwarder, TableEvents,
};
pub use crate::process::{ProcessObject, Writable};
pub use crate::resource::{MemoryProvider, ResourceLocator, ResourceProvider};
pub use crate::stage::{NextStage, Pipeline, PipelineBuilder, PipelineState, Stage};
pub use crate::stages::{
    CssResolverStage, DocumentBuilder, DocumentSinkStage, ElementCollector, ForwardingStage,
    HtmlStage,
};
pub use crate::worker::{RunReport, Worker, default_pipeline, parse_html};
