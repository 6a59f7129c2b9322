//! Tokenizer state definitions.

/// Top-level tokenizer state. Exactly one input character is consumed per step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizerState {
    /// Text outside of any open element.
    Outside,
    /// Saw `<`; the buffered characters decide between tag, comment, CDATA, doctype
    /// and processing instruction.
    TagOpenCandidate,
    TagName,
    TagAttributes,
    /// Saw `/` inside a start tag.
    SelfClosing,
    /// Text inside at least one open element.
    InsideTagBody,
    Comment,
    CData,
    /// `<!DOCTYPE ...>` and any other `<!...>` declaration.
    Doctype,
    ProcessingInstruction,
    EntityReference,
}

/// Position inside the attribute list of a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttributePhase {
    BeforeName,
    Name,
    AfterName,
    BeforeValue,
    Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Consumed,
    /// Process the same character again in the (new) current state.
    Reconsume,
}
