//! Character-driven stylesheet scanner filling a [`CssFile`].

use encoding_rs::{Encoding, UTF_8};

use crate::stylesheet::CssFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScannerState {
    /// Collecting selector text.
    Rule,
    /// Collecting a declaration block.
    Properties,
    Comment,
    /// Inside a quoted string of a selector or declaration block.
    Text,
    /// Skipping an at-rule up to its `;` or the end of its block.
    AtRule,
}

/// Feeds stylesheet text one character at a time into a [`CssFile`].
///
/// Comments and `<!--`/`-->` markers are removed, at-rules (`@media`, `@import`,
/// `@font-face`, ...) are skipped whole, and each complete `selectors { declarations }`
/// block becomes rule entries.
#[derive(Debug)]
pub struct CssFileProcessor {
    state: ScannerState,
    /// State to resume after a comment or string.
    resume: ScannerState,
    selectors: String,
    body: String,
    quote: char,
    /// The previous string character was an unescaped backslash.
    escaped: bool,
    previous: Option<char>,
    at_depth: usize,
    file: CssFile,
}

impl CssFileProcessor {
    pub fn new(persistent: bool) -> Self {
        Self {
            state: ScannerState::Rule,
            resume: ScannerState::Rule,
            selectors: String::new(),
            body: String::new(),
            quote: '"',
            escaped: false,
            previous: None,
            at_depth: 0,
            file: CssFile::new(persistent),
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    fn buffer(&mut self) -> &mut String {
        match self.resume {
            ScannerState::Properties => &mut self.body,
            _ => &mut self.selectors,
        }
    }

    pub fn process(&mut self, ch: char) {
        match self.state {
            ScannerState::Rule | ScannerState::Properties => self.process_code(ch),
            ScannerState::Comment => {
                if self.previous == Some('*') && ch == '/' {
                    self.state = self.resume;
                    self.previous = None;
                    return;
                }
            }
            ScannerState::Text => {
                self.buffer().push(ch);
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == self.quote {
                    self.state = self.resume;
                }
            }
            ScannerState::AtRule => match ch {
                '{' => self.at_depth += 1,
                '}' => {
                    self.at_depth = self.at_depth.saturating_sub(1);
                    if self.at_depth == 0 {
                        self.state = ScannerState::Rule;
                    }
                }
                ';' if self.at_depth == 0 => self.state = ScannerState::Rule,
                _ => {}
            },
        }
        self.previous = Some(ch);
    }

    fn process_code(&mut self, ch: char) {
        self.resume = self.state;
        if ch == '*' && self.previous == Some('/') {
            self.buffer().pop();
            self.state = ScannerState::Comment;
            // `/*/` must not end the comment it opens.
            self.previous = None;
            return;
        }
        match (self.state, ch) {
            (_, '"' | '\'') => {
                self.quote = ch;
                self.escaped = false;
                self.buffer().push(ch);
                self.state = ScannerState::Text;
            }
            (ScannerState::Rule, '@') if self.selectors.trim().is_empty() => {
                self.selectors.clear();
                self.at_depth = 0;
                self.state = ScannerState::AtRule;
            }
            (ScannerState::Rule, '{') => self.state = ScannerState::Properties,
            (ScannerState::Rule, '}') => self.selectors.clear(),
            (ScannerState::Properties, '}') => {
                let selectors = std::mem::take(&mut self.selectors);
                let body = std::mem::take(&mut self.body);
                let added = self.file.add_rule(selectors.trim(), &body);
                log::trace!(target: "tagflow.css", "rule {:?}: {added} entries", selectors.trim());
                self.state = ScannerState::Rule;
            }
            (ScannerState::Rule, c) => {
                self.selectors.push(c);
                // `<!--` and `-->` wrap legacy stylesheets and are ignored between rules.
                for marker in ["<!--", "-->"] {
                    if self.selectors.ends_with(marker) {
                        self.selectors.truncate(self.selectors.len() - marker.len());
                    }
                }
            }
            (_, c) => self.body.push(c),
        }
    }

    pub fn push_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.process(ch);
        }
    }

    /// Decode `bytes` with the named character set (UTF-8 when unknown or absent; a byte
    /// order mark wins) and scan the result.
    pub fn push_bytes(&mut self, bytes: &[u8], charset: Option<&str>) {
        let encoding = charset
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .unwrap_or(UTF_8);
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!(
                target: "tagflow.css",
                "stylesheet bytes were not valid {}; replacement characters inserted",
                used.name()
            );
        }
        self.push_str(&text);
    }

    /// Finish scanning. An unterminated trailing rule is dropped.
    pub fn finish(self) -> CssFile {
        if self.state != ScannerState::Rule || !self.selectors.trim().is_empty() {
            log::debug!(target: "tagflow.css", "dropping unterminated rule at end of stylesheet");
        }
        self.file
    }
}

/// Scan a complete stylesheet.
pub fn parse_css(text: &str, persistent: bool) -> CssFile {
    let mut processor = CssFileProcessor::new(persistent);
    processor.push_str(text);
    processor.finish()
}
