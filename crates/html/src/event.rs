//! Structural events emitted by the tokenizer.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;

/// Attribute map of a start tag. Keys keep the case they were written in.
pub type Attributes = HashMap<String, String>;

/// Receiver of tokenizer events.
///
/// Every callback may fail with the listener's own error type. The tokenizer stops at the
/// first error and hands it back to its caller unchanged.
pub trait ParserListener {
    type Error;

    fn start_element(
        &mut self,
        name: &str,
        attributes: Attributes,
        namespace: Option<&str>,
    ) -> Result<(), Self::Error>;

    fn end_element(&mut self, name: &str, namespace: Option<&str>) -> Result<(), Self::Error>;

    fn text(&mut self, text: &str) -> Result<(), Self::Error>;

    fn comment(&mut self, _comment: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Markup the tokenizer passes through without interpreting (doctype, declarations,
    /// processing instructions).
    fn unknown_text(&mut self, _text: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once by [`crate::Tokenizer::finish`] after pending text is flushed.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Owned copy of one listener callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    StartTag {
        name: String,
        namespace: Option<String>,
        /// Sorted by name so the event compares and prints deterministically.
        attributes: Vec<(String, String)>,
    },
    EndTag {
        name: String,
        namespace: Option<String>,
    },
    Text(String),
    Comment(String),
    Unknown(String),
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str, namespace: Option<&str>) -> fmt::Result {
    match namespace {
        Some(ns) => write!(f, "{ns}:{name}"),
        None => f.write_str(name),
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::StartTag {
                name,
                namespace,
                attributes,
            } => {
                f.write_str("StartTag(")?;
                write_name(f, name, namespace.as_deref())?;
                for (k, v) in attributes {
                    write!(f, " {k}={v:?}")?;
                }
                f.write_str(")")
            }
            Event::EndTag { name, namespace } => {
                f.write_str("EndTag(")?;
                write_name(f, name, namespace.as_deref())?;
                f.write_str(")")
            }
            Event::Text(text) => write!(f, "Text({text:?})"),
            Event::Comment(text) => write!(f, "Comment({text:?})"),
            Event::Unknown(text) => write!(f, "Unknown({text:?})"),
        }
    }
}

/// Listener that records every event it receives.
#[derive(Debug, Default)]
pub struct EventCollector {
    pub events: Vec<Event>,
    pub closed: bool,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl ParserListener for EventCollector {
    type Error = Infallible;

    fn start_element(
        &mut self,
        name: &str,
        attributes: Attributes,
        namespace: Option<&str>,
    ) -> Result<(), Infallible> {
        let mut attributes: Vec<(String, String)> = attributes.into_iter().collect();
        attributes.sort();
        self.events.push(Event::StartTag {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            attributes,
        });
        Ok(())
    }

    fn end_element(&mut self, name: &str, namespace: Option<&str>) -> Result<(), Infallible> {
        self.events.push(Event::EndTag {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Infallible> {
        self.events.push(Event::Text(text.to_string()));
        Ok(())
    }

    fn comment(&mut self, comment: &str) -> Result<(), Infallible> {
        self.events.push(Event::Comment(comment.to_string()));
        Ok(())
    }

    fn unknown_text(&mut self, text: &str) -> Result<(), Infallible> {
        self.events.push(Event::Unknown(text.to_string()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        self.closed = true;
        Ok(())
    }
}
