use std::cell::RefCell;
use std::rc::Rc;

use html::{Attributes, TagId, TagTree};
use pipeline::{
    Chunk, DocumentSinkStage, Element, ElementCollector, ForwardingStage, HtmlStage, NextStage, Pipeline, PipelineError,
    PipelineState, ProcessObject, Stage, StageId, TextStyle, WorkerConfig, WorkerContext,
    Writable,
};

type Log = Rc<RefCell<Vec<String>>>;

/// Emits one chunk per event naming the event and the tag.
#[derive(Debug, Default)]
struct Emitter {
    next: Option<Box<dyn Stage>>,
}

impl Emitter {
    fn emit(po: &mut ProcessObject, text: String) {
        po.add(Writable::Element(Element::Chunk(Chunk::new(text, TextStyle::default()))));
    }
}

impl Stage for Emitter {
    fn id(&self) -> StageId {
        StageId("emitter")
    }

    fn set_next(&mut self, next: Box<dyn Stage>) {
        self.next = Some(next);
    }

    fn next_mut(&mut self) -> NextStage<'_> {
        self.next.as_deref_mut()
    }

    fn init(&mut self, _ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        Ok(())
    }

    fn open(
        &mut self,
        _ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        Self::emit(po, format!("open {}", tree[tag].name()));
        Ok(self.next.as_deref_mut())
    }

    fn content(
        &mut self,
        _ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        text: &str,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        Self::emit(po, format!("content {} {text}", tree[tag].name()));
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        _ctx: &mut WorkerContext,
        tree: &mut TagTree,
        tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        Self::emit(po, format!("close {}", tree[tag].name()));
        Ok(self.next.as_deref_mut())
    }
}

/// Drains the process object and records the text of every chunk it held.
#[derive(Debug)]
struct Recorder {
    name: &'static str,
    log: Log,
    next: Option<Box<dyn Stage>>,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            next: None,
        }
    }

    fn record(&mut self, po: &mut ProcessObject) {
        for element in po.drain().flat_map(Writable::into_elements) {
            if let Element::Chunk(chunk) = element {
                self.log.borrow_mut().push(format!("{}: {}", self.name, chunk.text));
            }
        }
    }
}

impl Stage for Recorder {
    fn id(&self) -> StageId {
        StageId("recorder")
    }

    fn set_next(&mut self, next: Box<dyn Stage>) {
        self.next = Some(next);
    }

    fn next_mut(&mut self) -> NextStage<'_> {
        self.next.as_deref_mut()
    }

    fn init(&mut self, ctx: &mut WorkerContext) -> Result<(), PipelineError> {
        ctx.put(self.id(), 0usize);
        Ok(())
    }

    fn open(
        &mut self,
        _ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.record(po);
        Ok(self.next.as_deref_mut())
    }

    fn content(
        &mut self,
        _ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        _text: &str,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.record(po);
        Ok(self.next.as_deref_mut())
    }

    fn close(
        &mut self,
        _ctx: &mut WorkerContext,
        _tree: &mut TagTree,
        _tag: TagId,
        po: &mut ProcessObject,
    ) -> Result<NextStage<'_>, PipelineError> {
        self.record(po);
        Ok(self.next.as_deref_mut())
    }
}

fn small_tree() -> (TagTree, TagId, TagId) {
    let mut tree = TagTree::new();
    let div = tree.create("div", Attributes::new(), None);
    let p = tree.create("p", Attributes::new(), None);
    tree.append_child(div, p);
    (tree, div, p)
}

#[test]
fn forwarder_in_the_middle_delivers_every_event_in_order() {
    let log = Log::default();
    let mut pipeline = Pipeline::builder()
        .stage(Emitter::default())
        .stage(ForwardingStage::new())
        .stage(Recorder::new("sink", &log))
        .build()
        .unwrap();
    pipeline.init().unwrap();

    let (mut tree, div, p) = small_tree();
    pipeline.open(&mut tree, div).unwrap();
    pipeline.open(&mut tree, p).unwrap();
    pipeline.content(&mut tree, p, "hello").unwrap();
    pipeline.close(&mut tree, p).unwrap();
    pipeline.close(&mut tree, div).unwrap();
    pipeline.finish().unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "sink: open div",
            "sink: open p",
            "sink: content p hello",
            "sink: close p",
            "sink: close div",
        ]
    );
}

#[test]
fn delegates_see_a_copy_of_the_payload() {
    let log = Log::default();
    let forwarder = ForwardingStage::new()
        .with_delegate(Recorder::new("first", &log))
        .with_delegate(Recorder::new("second", &log));
    assert_eq!(forwarder.delegates(), 2);

    let mut pipeline = Pipeline::builder()
        .stage(Emitter::default())
        .stage(forwarder)
        .stage(Recorder::new("main", &log))
        .build()
        .unwrap();
    pipeline.init().unwrap();

    let (mut tree, div, _) = small_tree();
    pipeline.open(&mut tree, div).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["first: open div", "second: open div", "main: open div"]
    );
}

#[test]
fn stage_without_init_fails_loudly() {
    let mut stage = HtmlStage::new(&WorkerConfig::default());
    let mut ctx = WorkerContext::new();
    let (mut tree, div, _) = small_tree();
    let mut po = ProcessObject::new();

    let err = stage.open(&mut ctx, &mut tree, div, &mut po).unwrap_err();
    assert!(matches!(err, PipelineError::MissingContext { stage } if stage == HtmlStage::ID));
}

#[test]
fn sink_without_init_fails_even_with_nothing_to_write() {
    let mut stage = DocumentSinkStage::new(ElementCollector::new());
    let mut ctx = WorkerContext::new();
    let (mut tree, div, _) = small_tree();
    let mut po = ProcessObject::new();

    let err = stage.close(&mut ctx, &mut tree, div, &mut po).unwrap_err();
    assert!(matches!(err, PipelineError::MissingContext { stage } if stage == DocumentSinkStage::ID));

    stage.init(&mut ctx).unwrap();
    assert!(stage.close(&mut ctx, &mut tree, div, &mut po).unwrap().is_none());
}

#[test]
fn lifecycle_is_enforced() {
    let log = Log::default();
    let mut pipeline = Pipeline::builder()
        .stage(Recorder::new("only", &log))
        .build()
        .unwrap();
    let (mut tree, div, _) = small_tree();

    assert_eq!(pipeline.state(), PipelineState::Uninitialized);
    assert!(matches!(
        pipeline.open(&mut tree, div),
        Err(PipelineError::NotInitialized)
    ));

    pipeline.init().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Initialized);
    pipeline.init().unwrap();

    pipeline.open(&mut tree, div).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);

    pipeline.finish().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Closed);
    assert!(matches!(pipeline.close(&mut tree, div), Err(PipelineError::Closed)));
    assert!(matches!(pipeline.init(), Err(PipelineError::Closed)));
}

#[test]
fn empty_builder_builds_nothing() {
    assert!(Pipeline::builder().build().is_none());
}
