use html::Tag;
use memchr::memmem;

pub const SPECIFICITY_ID: u32 = 65_536;
pub const SPECIFICITY_CLASS: u32 = 256;
pub const SPECIFICITY_ATTRIBUTE: u32 = 256;
pub const SPECIFICITY_TAG: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    AdjacentSibling,
    /// `a ~ b`
    GeneralSibling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[a=v]`
    Exact,
    /// `[a~=v]`: one of the whitespace separated words
    Includes,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
    /// `[a|=v]`: exactly `v` or starting with `v-`
    DashMatch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorItem {
    Universal,
    Tag(String),
    Class(String),
    Id(String),
    Attribute {
        name: String,
        operator: Option<AttributeOperator>,
        value: Option<String>,
    },
    /// Recognized so the selector parses, never matches.
    Pseudo(String),
    Combinator(Combinator),
}

impl SelectorItem {
    /// Whether this single item accepts `tag`. Combinators never match on their own.
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            SelectorItem::Universal => true,
            SelectorItem::Tag(name) => tag.name().eq_ignore_ascii_case(name),
            SelectorItem::Class(class) => tag.classes().any(|c| c == class),
            SelectorItem::Id(id) => tag.attribute("id") == Some(id.as_str()),
            SelectorItem::Attribute {
                name,
                operator,
                value,
            } => {
                let Some(actual) = attribute_ignore_case(tag, name) else {
                    return false;
                };
                match (operator, value) {
                    (Some(op), Some(expected)) => attribute_matches(*op, actual, expected),
                    _ => true,
                }
            }
            SelectorItem::Pseudo(_) | SelectorItem::Combinator(_) => false,
        }
    }

    pub fn specificity(&self) -> u32 {
        match self {
            SelectorItem::Id(_) => SPECIFICITY_ID,
            SelectorItem::Class(_) => SPECIFICITY_CLASS,
            SelectorItem::Attribute { .. } => SPECIFICITY_ATTRIBUTE,
            SelectorItem::Tag(_) => SPECIFICITY_TAG,
            SelectorItem::Universal | SelectorItem::Pseudo(_) | SelectorItem::Combinator(_) => 0,
        }
    }
}

fn attribute_ignore_case<'t>(tag: &'t Tag, name: &str) -> Option<&'t str> {
    tag.attribute(name).or_else(|| {
        tag.attributes()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    })
}

fn attribute_matches(op: AttributeOperator, actual: &str, expected: &str) -> bool {
    match op {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttributeOperator::Substring => {
            !expected.is_empty() && memmem::find(actual.as_bytes(), expected.as_bytes()).is_some()
        }
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}

/// A parsed selector chain, e.g. `div.note > p[lang|=en]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    text: String,
    items: Vec<SelectorItem>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Selector> {
        let items = Parser::new(text.trim()).parse()?;
        Some(Selector {
            text: text.trim().to_string(),
            items,
        })
    }

    /// The selector as written (trimmed).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn items(&self) -> &[SelectorItem] {
        &self.items
    }

    pub fn specificity(&self) -> u32 {
        self.items.iter().map(SelectorItem::specificity).sum()
    }

    /// Compound selectors from left to right, each with the combinator that links it to the
    /// compound on its left (`None` for the leftmost).
    pub fn compounds(&self) -> Vec<(Option<Combinator>, &[SelectorItem])> {
        let mut out = Vec::new();
        let mut start = 0;
        let mut pending = None;
        for (i, item) in self.items.iter().enumerate() {
            if let SelectorItem::Combinator(c) = item {
                out.push((pending, &self.items[start..i]));
                pending = Some(*c);
                start = i + 1;
            }
        }
        out.push((pending, &self.items[start..]));
        out
    }

    /// Whether the rightmost compound accepts `tag`, ignoring combinators.
    pub fn matches_subject(&self, tag: &Tag) -> bool {
        self.compounds()
            .last()
            .is_some_and(|(_, items)| items.iter().all(|item| item.matches(tag)))
    }
}

/// Parse a single selector; `None` when any part of the input falls outside the grammar.
pub fn parse_selector(text: &str) -> Option<Selector> {
    Selector::parse(text)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    items: Vec<SelectorItem>,
    /// Whether the current compound already has a tag or universal component.
    compound_has_tag: bool,
    compound_empty: bool,
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            items: Vec::new(),
            compound_has_tag: false,
            compound_empty: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn name(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        (self.pos > start).then(|| self.input[start..self.pos].to_string())
    }

    fn push_combinator(&mut self, combinator: Combinator) -> Option<()> {
        if self.compound_empty {
            return None;
        }
        self.items.push(SelectorItem::Combinator(combinator));
        self.compound_empty = true;
        self.compound_has_tag = false;
        Some(())
    }

    fn parse(mut self) -> Option<Vec<SelectorItem>> {
        if self.input.is_empty() {
            return None;
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() {
                self.skip_whitespace();
                match self.peek() {
                    Some('>' | '+' | '~') | None => {}
                    Some(_) => self.push_combinator(Combinator::Descendant)?,
                }
                continue;
            }
            match ch {
                '>' | '+' | '~' => {
                    self.bump();
                    let combinator = match ch {
                        '>' => Combinator::Child,
                        '+' => Combinator::AdjacentSibling,
                        _ => Combinator::GeneralSibling,
                    };
                    self.push_combinator(combinator)?;
                    self.skip_whitespace();
                    if matches!(self.peek(), Some('>' | '+' | '~') | None) {
                        return None;
                    }
                }
                '*' => {
                    self.bump();
                    self.simple(SelectorItem::Universal)?;
                }
                '.' => {
                    self.bump();
                    let name = self.name()?;
                    self.simple(SelectorItem::Class(name))?;
                }
                '#' => {
                    self.bump();
                    let name = self.name()?;
                    self.simple(SelectorItem::Id(name))?;
                }
                '[' => {
                    self.bump();
                    let item = self.attribute()?;
                    self.simple(item)?;
                }
                ':' => {
                    let item = self.pseudo()?;
                    self.simple(item)?;
                }
                c if c.is_alphabetic() || c == '_' => {
                    let name = self.name()?;
                    self.simple(SelectorItem::Tag(name))?;
                }
                _ => return None,
            }
        }
        if self.compound_empty {
            return None;
        }
        Some(self.items)
    }

    fn simple(&mut self, item: SelectorItem) -> Option<()> {
        let is_tag = matches!(item, SelectorItem::Tag(_) | SelectorItem::Universal);
        if is_tag && (self.compound_has_tag || !self.compound_empty) {
            // A tag or `*` must lead its compound and appear once.
            return None;
        }
        self.compound_has_tag |= is_tag;
        self.compound_empty = false;
        self.items.push(item);
        Some(())
    }

    fn attribute(&mut self) -> Option<SelectorItem> {
        self.skip_whitespace();
        let name = self.name()?;
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Some(SelectorItem::Attribute {
                name,
                operator: None,
                value: None,
            });
        }
        let operator = match self.bump()? {
            '=' => AttributeOperator::Exact,
            prefix => {
                let op = match prefix {
                    '~' => AttributeOperator::Includes,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    '|' => AttributeOperator::DashMatch,
                    _ => return None,
                };
                if self.bump()? != '=' {
                    return None;
                }
                op
            }
        };
        self.skip_whitespace();
        let value = match self.peek()? {
            quote @ ('"' | '\'') => {
                self.bump();
                let start = self.pos;
                let len = self.input[start..].find(quote)?;
                self.pos = start + len + 1;
                self.input[start..start + len].to_string()
            }
            _ => self.name()?,
        };
        self.skip_whitespace();
        if self.bump()? != ']' {
            return None;
        }
        Some(SelectorItem::Attribute {
            name,
            operator: Some(operator),
            value: Some(value),
        })
    }

    /// `:name`, `::name` or `:name(args)` with balanced parentheses.
    fn pseudo(&mut self) -> Option<SelectorItem> {
        let start = self.pos;
        self.bump();
        if self.peek() == Some(':') {
            self.bump();
        }
        self.name()?;
        if self.peek() == Some('(') {
            let mut depth = 0usize;
            loop {
                match self.bump()? {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(SelectorItem::Pseudo(self.input[start..self.pos].to_string()))
    }
}
