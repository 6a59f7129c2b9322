//! Character-driven markup tokenizer.
//!
//! The tokenizer consumes exactly one `char` per [`Tokenizer::feed`] call and keeps every
//! piece of pending state in explicit fields, so input may be split at any character
//! boundary without changing the emitted events.
//!
//! It is deliberately permissive: malformed tags, entities and declarations never abort,
//! they degrade to literal text.

mod states;
#[cfg(test)]
mod tests;

pub use states::TokenizerState;

use std::collections::HashSet;
use std::convert::Infallible;

use crate::entities::{MAX_REFERENCE_LEN, decode_entities, decode_entity};
use crate::event::{Attributes, Event, EventCollector, ParserListener};
use states::{AttributePhase, Step};

const DEFAULT_VERBATIM_TAGS: &[&str] = &["pre"];
const DEFAULT_RAW_TEXT_TAGS: &[&str] = &["style", "script"];
const DEFAULT_BLOCK_TAGS: &[&str] = &[
    "html", "head", "body", "title", "meta", "link", "style", "script", "div", "p", "h1", "h2",
    "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "table", "thead", "tbody",
    "tfoot", "tr", "td", "th", "caption", "hr", "br", "blockquote", "pre", "address", "center",
    "form", "section", "article", "header", "footer", "nav",
];
const DEFAULT_VOID_TAGS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

fn tag_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Tags whose text content is passed through without whitespace normalization.
    pub verbatim_tags: HashSet<String>,
    /// Tags whose content is raw text: no normalization, no entities, and `<` only
    /// matters when it starts the matching end tag.
    pub raw_text_tags: HashSet<String>,
    /// Tags next to which a pending collapsed space is dropped instead of emitted.
    pub block_tags: HashSet<String>,
    /// Tags that never have content; their start tag also emits the end tag.
    pub void_tags: HashSet<String>,
    /// Longest entity reference body buffered before giving up.
    pub max_entity_len: usize,
    pub lowercase_tag_names: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            verbatim_tags: tag_set(DEFAULT_VERBATIM_TAGS),
            raw_text_tags: tag_set(DEFAULT_RAW_TEXT_TAGS),
            block_tags: tag_set(DEFAULT_BLOCK_TAGS),
            void_tags: tag_set(DEFAULT_VOID_TAGS),
            max_entity_len: MAX_REFERENCE_LEN,
            lowercase_tag_names: true,
        }
    }
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub characters: u64,
    pub state_transitions: u64,
    pub events_emitted: u64,
}

#[derive(Debug)]
pub struct Tokenizer {
    config: TokenizerConfig,
    state: TokenizerState,
    /// Text state to resume after an entity reference.
    return_state: TokenizerState,
    text: String,
    pending_space: bool,
    /// Drop leading whitespace of the next text run (a block-ish tag was just emitted).
    suppress_space: bool,
    /// Scratch buffer for markup declarations, comments and entity names.
    buffer: String,
    tag_name: String,
    namespace: Option<String>,
    closing: bool,
    attributes: Attributes,
    attr_name: String,
    attr_value: String,
    attr_phase: AttributePhase,
    quote: Option<char>,
    depth: usize,
    verbatim_depth: usize,
    raw_text_tag: Option<String>,
    stats: TokenizerStats,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            state: TokenizerState::Outside,
            return_state: TokenizerState::Outside,
            text: String::new(),
            pending_space: false,
            suppress_space: false,
            buffer: String::new(),
            tag_name: String::new(),
            namespace: None,
            closing: false,
            attributes: Attributes::new(),
            attr_name: String::new(),
            attr_value: String::new(),
            attr_phase: AttributePhase::BeforeName,
            quote: None,
            depth: 0,
            verbatim_depth: 0,
            raw_text_tag: None,
            stats: TokenizerStats::default(),
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn state(&self) -> TokenizerState {
        self.state
    }

    /// Return a copy of current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Consume one character, emitting any events it completes.
    pub fn feed<L>(&mut self, ch: char, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        self.stats.characters = self.stats.characters.saturating_add(1);
        loop {
            let step = match self.state {
                TokenizerState::Outside | TokenizerState::InsideTagBody => self.step_text(ch),
                TokenizerState::TagOpenCandidate => self.step_tag_open(ch, listener)?,
                TokenizerState::TagName => self.step_tag_name(ch, listener)?,
                TokenizerState::TagAttributes => self.step_attributes(ch, listener)?,
                TokenizerState::SelfClosing => self.step_self_closing(ch, listener)?,
                TokenizerState::Comment => self.step_comment(ch, listener)?,
                TokenizerState::CData => self.step_cdata(ch),
                TokenizerState::Doctype => self.step_doctype(ch, listener)?,
                TokenizerState::ProcessingInstruction => {
                    self.step_processing_instruction(ch, listener)?
                }
                TokenizerState::EntityReference => self.step_entity(ch),
            };
            if step == Step::Consumed {
                return Ok(());
            }
        }
    }

    pub fn push_str<L>(&mut self, input: &str, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        for ch in input.chars() {
            self.feed(ch, listener)?;
        }
        Ok(())
    }

    /// Flush whatever is pending at end of input and close the listener.
    ///
    /// Unterminated entities and tag openers become literal text, an unterminated comment
    /// is emitted as is, and a half-written tag is dropped.
    pub fn finish<L>(&mut self, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        match self.state {
            TokenizerState::EntityReference => {
                let literal = format!("&{}", self.buffer);
                self.push_text_str(&literal);
            }
            TokenizerState::TagOpenCandidate => {
                let literal = format!("<{}", self.buffer);
                self.push_text_str(&literal);
            }
            TokenizerState::Comment => {
                self.flush_text(false, listener)?;
                let comment = std::mem::take(&mut self.buffer);
                self.stats.events_emitted += 1;
                listener.comment(&comment)?;
            }
            TokenizerState::CData => {
                let cdata = std::mem::take(&mut self.buffer);
                self.push_raw_text(&cdata);
            }
            TokenizerState::TagName
            | TokenizerState::TagAttributes
            | TokenizerState::SelfClosing => {
                log::trace!(target: "tagflow.tokenizer", "dropping unterminated tag {:?}", self.tag_name);
                self.reset_tag();
            }
            TokenizerState::Doctype | TokenizerState::ProcessingInstruction => {
                self.buffer.clear();
            }
            TokenizerState::Outside | TokenizerState::InsideTagBody => {}
        }
        self.buffer.clear();
        self.flush_text(false, listener)?;
        self.transition_to(TokenizerState::Outside);
        listener.close()
    }

    fn transition_to(&mut self, next: TokenizerState) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "tagflow.tokenizer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                self.stats.characters
            );
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    fn body_state(&self) -> TokenizerState {
        if self.depth == 0 {
            TokenizerState::Outside
        } else {
            TokenizerState::InsideTagBody
        }
    }

    fn in_verbatim(&self) -> bool {
        self.verbatim_depth > 0 || self.raw_text_tag.is_some()
    }

    fn push_text_char(&mut self, ch: char) {
        if self.in_verbatim() {
            self.text.push(ch);
            return;
        }
        if ch.is_ascii_whitespace() {
            if !(self.text.is_empty() && self.suppress_space) {
                self.pending_space = true;
            }
            return;
        }
        if self.pending_space {
            self.text.push(' ');
            self.pending_space = false;
        }
        self.suppress_space = false;
        self.text.push(ch);
    }

    fn push_text_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.push_text_char(ch);
        }
    }

    /// Append text without whitespace normalization (CDATA sections).
    fn push_raw_text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.pending_space {
            self.text.push(' ');
            self.pending_space = false;
        }
        self.suppress_space = false;
        self.text.push_str(s);
    }

    /// Emit the pending text run. A trailing collapsed space survives only when the markup
    /// that follows is not block-ish.
    fn flush_text<L>(&mut self, before_block: bool, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if self.pending_space && !before_block {
            self.text.push(' ');
        }
        self.pending_space = false;
        if self.text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        self.stats.events_emitted += 1;
        log::trace!(target: "tagflow.tokenizer", "text {:?}", text);
        listener.text(&text)
    }

    fn is_block(&self, name: &str) -> bool {
        self.config.block_tags.contains(name)
    }

    fn reset_tag(&mut self) {
        self.tag_name.clear();
        self.namespace = None;
        self.closing = false;
        self.attributes.clear();
        self.attr_name.clear();
        self.attr_value.clear();
        self.attr_phase = AttributePhase::BeforeName;
        self.quote = None;
    }

    fn push_name_char(&mut self, ch: char) {
        if self.config.lowercase_tag_names {
            self.tag_name.push(ch.to_ascii_lowercase());
        } else {
            self.tag_name.push(ch);
        }
    }

    fn step_text(&mut self, ch: char) -> Step {
        match ch {
            '<' => {
                self.buffer.clear();
                self.transition_to(TokenizerState::TagOpenCandidate);
            }
            '&' if self.raw_text_tag.is_none() => {
                self.buffer.clear();
                self.return_state = self.state;
                self.transition_to(TokenizerState::EntityReference);
            }
            _ => self.push_text_char(ch),
        }
        Step::Consumed
    }

    /// Give up on a `<` that does not start markup: it and everything buffered after it
    /// become text, and the current character is processed again as text.
    fn abandon_tag_open(&mut self) -> Step {
        let literal = format!("<{}", self.buffer);
        self.buffer.clear();
        self.push_text_str(&literal);
        let back = self.body_state();
        self.transition_to(back);
        Step::Reconsume
    }

    fn step_tag_open<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if let Some(raw) = self.raw_text_tag.clone() {
            return Ok(self.step_raw_text_end(ch, &raw));
        }

        if self.buffer.is_empty() {
            match ch {
                '!' => self.buffer.push(ch),
                '?' => self.transition_to(TokenizerState::ProcessingInstruction),
                '/' => {
                    self.reset_tag();
                    self.closing = true;
                    self.transition_to(TokenizerState::TagName);
                }
                c if c.is_alphabetic() || c == '_' => {
                    self.reset_tag();
                    self.push_name_char(c);
                    self.transition_to(TokenizerState::TagName);
                }
                _ => return Ok(self.abandon_tag_open()),
            }
            return Ok(Step::Consumed);
        }

        if ch == '>' {
            // `<!>` or a declaration shorter than its keyword.
            let text = format!("<{}>", self.buffer);
            self.buffer.clear();
            self.emit_unknown(&text, listener)?;
            return Ok(Step::Consumed);
        }

        self.buffer.push(ch);
        if self.buffer == "!--" {
            self.buffer.clear();
            self.transition_to(TokenizerState::Comment);
        } else if self.buffer == "![CDATA[" {
            self.buffer.clear();
            self.transition_to(TokenizerState::CData);
        } else if self.buffer.eq_ignore_ascii_case("!DOCTYPE") {
            self.transition_to(TokenizerState::Doctype);
        } else if !("!--".starts_with(self.buffer.as_str())
            || "![CDATA[".starts_with(self.buffer.as_str())
            || is_ascii_prefix_ignore_case("!DOCTYPE", &self.buffer))
        {
            // Any other `<!...>` declaration is passed through like a doctype.
            self.transition_to(TokenizerState::Doctype);
        }
        Ok(Step::Consumed)
    }

    /// Inside raw text only `</name` followed by whitespace, `/` or `>` ends the element.
    fn step_raw_text_end(&mut self, ch: char, raw: &str) -> Step {
        let expected_len = raw.len() + 1;
        if self.buffer.len() < expected_len {
            let expected = if self.buffer.is_empty() {
                Some('/')
            } else {
                raw[self.buffer.len() - 1..].chars().next()
            };
            return match expected {
                Some(e) if e.eq_ignore_ascii_case(&ch) => {
                    self.buffer.push(ch);
                    Step::Consumed
                }
                _ => self.abandon_tag_open(),
            };
        }
        if ch.is_ascii_whitespace() || ch == '/' || ch == '>' {
            self.buffer.clear();
            self.reset_tag();
            self.closing = true;
            self.tag_name.push_str(raw);
            self.transition_to(TokenizerState::TagName);
            return Step::Reconsume;
        }
        self.abandon_tag_open()
    }

    fn step_tag_name<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        match ch {
            // Only the first `:` separates the prefix; later ones belong to the name.
            ':' if self.namespace.is_none() => {
                self.namespace = Some(std::mem::take(&mut self.tag_name));
            }
            c if c.is_ascii_whitespace() => {
                self.attr_phase = AttributePhase::BeforeName;
                self.transition_to(TokenizerState::TagAttributes);
            }
            '/' => {
                if !self.closing {
                    self.transition_to(TokenizerState::SelfClosing);
                }
            }
            '>' => self.emit_tag(false, listener)?,
            c => self.push_name_char(c),
        }
        Ok(Step::Consumed)
    }

    fn step_attributes<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        match self.attr_phase {
            AttributePhase::BeforeName => match ch {
                c if c.is_ascii_whitespace() => {}
                '/' => {
                    if !self.closing {
                        self.transition_to(TokenizerState::SelfClosing);
                    }
                }
                '>' => self.emit_tag(false, listener)?,
                c => {
                    self.attr_name.push(c);
                    self.attr_phase = AttributePhase::Name;
                }
            },
            AttributePhase::Name => match ch {
                '=' => self.attr_phase = AttributePhase::BeforeValue,
                c if c.is_ascii_whitespace() => self.attr_phase = AttributePhase::AfterName,
                '/' | '>' => {
                    self.commit_attribute();
                    return Ok(Step::Reconsume);
                }
                c => self.attr_name.push(c),
            },
            AttributePhase::AfterName => match ch {
                c if c.is_ascii_whitespace() => {}
                '=' => self.attr_phase = AttributePhase::BeforeValue,
                _ => {
                    self.commit_attribute();
                    return Ok(Step::Reconsume);
                }
            },
            AttributePhase::BeforeValue => match ch {
                c if c.is_ascii_whitespace() => {}
                '"' | '\'' => {
                    self.quote = Some(ch);
                    self.attr_phase = AttributePhase::Value;
                }
                '>' => {
                    self.commit_attribute();
                    return Ok(Step::Reconsume);
                }
                _ => {
                    self.quote = None;
                    self.attr_phase = AttributePhase::Value;
                    return Ok(Step::Reconsume);
                }
            },
            AttributePhase::Value => match self.quote {
                Some(q) if ch == q => self.commit_attribute(),
                Some(_) => self.attr_value.push(ch),
                None if ch.is_ascii_whitespace() => self.commit_attribute(),
                None if ch == '>' => {
                    self.commit_attribute();
                    return Ok(Step::Reconsume);
                }
                None => self.attr_value.push(ch),
            },
        }
        Ok(Step::Consumed)
    }

    /// Store the current attribute. Valueless attributes map to the empty string and the
    /// first occurrence of a duplicated name wins.
    fn commit_attribute(&mut self) {
        let name = std::mem::take(&mut self.attr_name);
        let raw = std::mem::take(&mut self.attr_value);
        self.attr_phase = AttributePhase::BeforeName;
        self.quote = None;
        if name.is_empty() || self.closing {
            return;
        }
        self.attributes
            .entry(name)
            .or_insert_with(|| decode_entities(&raw));
    }

    fn step_self_closing<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if ch == '>' {
            self.emit_tag(true, listener)?;
            return Ok(Step::Consumed);
        }
        // `<a/b>`: the slash was not the end of the tag after all.
        self.attr_phase = AttributePhase::BeforeName;
        self.transition_to(TokenizerState::TagAttributes);
        Ok(Step::Reconsume)
    }

    fn emit_tag<L>(&mut self, self_closing: bool, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        let name = std::mem::take(&mut self.tag_name);
        let namespace = self.namespace.take();
        let attributes = std::mem::take(&mut self.attributes);
        let closing = self.closing;
        self.reset_tag();

        let block = self.is_block(&name);
        self.flush_text(block, listener)?;

        if name.is_empty() {
            // `</>` carries nothing to close.
        } else if closing {
            self.emit_end_tag(&name, namespace.as_deref(), listener)?;
        } else {
            self.emit_start_tag(&name, attributes, namespace.as_deref(), self_closing, listener)?;
        }
        self.suppress_space = block && !self.in_verbatim();
        let back = self.body_state();
        self.transition_to(back);
        Ok(())
    }

    fn emit_start_tag<L>(
        &mut self,
        name: &str,
        attributes: Attributes,
        namespace: Option<&str>,
        self_closing: bool,
        listener: &mut L,
    ) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        log::trace!(target: "tagflow.tokenizer", "start tag {name:?}");
        self.stats.events_emitted += 1;
        listener.start_element(name, attributes, namespace)?;

        if self_closing || self.config.void_tags.contains(name) {
            self.stats.events_emitted += 1;
            return listener.end_element(name, namespace);
        }
        self.depth += 1;
        if self.config.verbatim_tags.contains(name) {
            self.verbatim_depth += 1;
        }
        if self.raw_text_tag.is_none() && self.config.raw_text_tags.contains(name) {
            self.raw_text_tag = Some(name.to_string());
        }
        Ok(())
    }

    fn emit_end_tag<L>(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        listener: &mut L,
    ) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if self.config.void_tags.contains(name) {
            // The start tag already closed it.
            return Ok(());
        }
        log::trace!(target: "tagflow.tokenizer", "end tag {name:?}");
        self.depth = self.depth.saturating_sub(1);
        if self.config.verbatim_tags.contains(name) {
            self.verbatim_depth = self.verbatim_depth.saturating_sub(1);
        }
        if self.raw_text_tag.as_deref() == Some(name) {
            self.raw_text_tag = None;
        }
        self.stats.events_emitted += 1;
        listener.end_element(name, namespace)
    }

    fn emit_unknown<L>(&mut self, text: &str, listener: &mut L) -> Result<(), L::Error>
    where
        L: ParserListener + ?Sized,
    {
        self.flush_text(false, listener)?;
        let back = self.body_state();
        self.transition_to(back);
        self.stats.events_emitted += 1;
        listener.unknown_text(text)
    }

    fn step_comment<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if ch == '>' && self.buffer.ends_with("--") {
            self.buffer.truncate(self.buffer.len() - 2);
            let comment = std::mem::take(&mut self.buffer);
            self.flush_text(false, listener)?;
            let back = self.body_state();
            self.transition_to(back);
            self.stats.events_emitted += 1;
            listener.comment(&comment)?;
        } else {
            self.buffer.push(ch);
        }
        Ok(Step::Consumed)
    }

    fn step_cdata(&mut self, ch: char) -> Step {
        if ch == '>' && self.buffer.ends_with("]]") {
            self.buffer.truncate(self.buffer.len() - 2);
            let cdata = std::mem::take(&mut self.buffer);
            self.push_raw_text(&cdata);
            let back = self.body_state();
            self.transition_to(back);
        } else {
            self.buffer.push(ch);
        }
        Step::Consumed
    }

    fn step_doctype<L>(&mut self, ch: char, listener: &mut L) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if ch == '>' {
            let text = format!("<{}>", self.buffer);
            self.buffer.clear();
            self.emit_unknown(&text, listener)?;
        } else {
            self.buffer.push(ch);
        }
        Ok(Step::Consumed)
    }

    fn step_processing_instruction<L>(
        &mut self,
        ch: char,
        listener: &mut L,
    ) -> Result<Step, L::Error>
    where
        L: ParserListener + ?Sized,
    {
        if ch == '>' && self.buffer.ends_with('?') {
            let text = format!("<?{}>", self.buffer);
            self.buffer.clear();
            self.emit_unknown(&text, listener)?;
        } else {
            self.buffer.push(ch);
        }
        Ok(Step::Consumed)
    }

    fn step_entity(&mut self, ch: char) -> Step {
        if ch == ';' {
            let reference = std::mem::take(&mut self.buffer);
            match decode_entity(&reference) {
                Some(decoded) => self.push_text_char(decoded),
                None => {
                    log::trace!(target: "tagflow.tokenizer", "unknown entity &{reference};");
                    let literal = format!("&{reference};");
                    self.push_text_str(&literal);
                }
            }
            self.transition_to(self.return_state);
            return Step::Consumed;
        }
        let fits = self.buffer.len() < self.config.max_entity_len;
        if fits && (ch.is_ascii_alphanumeric() || ch == '#') {
            self.buffer.push(ch);
            return Step::Consumed;
        }
        let literal = format!("&{}", self.buffer);
        self.buffer.clear();
        self.push_text_str(&literal);
        self.transition_to(self.return_state);
        Step::Reconsume
    }
}

fn is_ascii_prefix_ignore_case(full: &str, prefix: &str) -> bool {
    full.len() >= prefix.len()
        && full.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Tokenize a complete document with the default configuration and collect every event.
pub fn tokenize(input: &str) -> Vec<Event> {
    tokenize_with(input, TokenizerConfig::default())
}

pub fn tokenize_with(input: &str, config: TokenizerConfig) -> Vec<Event> {
    let mut tokenizer = Tokenizer::new(config);
    let mut collector = EventCollector::new();
    let result: Result<(), Infallible> = tokenizer
        .push_str(input, &mut collector)
        .and_then(|()| tokenizer.finish(&mut collector));
    match result {
        Ok(()) => collector.into_events(),
        Err(never) => match never {},
    }
}
