//! Tag processors: per-tag conversion of markup into element descriptions.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use css::values::{DEFAULT_FONT_SIZE_PT, Length, parse_length};
use html::Tag;

use super::HtmlContext;
use crate::element::{Alignment, Cell, Chunk, Element, Image, List, Paragraph, Table, TextStyle};

/// Converts one kind of tag into elements.
///
/// Elements returned from any hook go to the innermost open stack owner, or out of the
/// stage when there is none. A stack owner receives everything produced between its start
/// and end as `collected` in [`TagProcessor::end`].
pub trait TagProcessor: fmt::Debug {
    fn start(&self, _ctx: &mut HtmlContext, _tag: &Tag) -> Vec<Element> {
        Vec::new()
    }

    fn content(&self, _ctx: &mut HtmlContext, tag: &Tag, text: &str) -> Vec<Element> {
        text_chunk(tag, text).map(Element::Chunk).into_iter().collect()
    }

    fn end(&self, _ctx: &mut HtmlContext, _tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        collected
    }

    fn is_stack_owner(&self) -> bool {
        false
    }

    /// Process the content of this tag in a clone of the current context.
    fn nested_context(&self) -> bool {
        false
    }
}

fn text_chunk(tag: &Tag, text: &str) -> Option<Chunk> {
    (!text.is_empty()).then(|| Chunk::new(text, TextStyle::from_css(tag.css())))
}

/// Group loose chunks and line breaks into paragraphs; other elements pass through in
/// order. Paragraphs holding only whitespace are dropped.
pub fn paragraphs(collected: Vec<Element>, heading: Option<u8>, alignment: Alignment) -> Vec<Element> {
    fn flush(chunks: &mut Vec<Chunk>, out: &mut Vec<Element>, heading: Option<u8>, alignment: Alignment) {
        let chunks = std::mem::take(chunks);
        if chunks.iter().any(|c| !c.text.trim().is_empty()) {
            out.push(Element::Paragraph(Paragraph {
                chunks,
                heading,
                alignment,
            }));
        }
    }

    let mut out = Vec::new();
    let mut chunks: Vec<Chunk> = Vec::new();
    for element in collected {
        match element {
            Element::Chunk(chunk) => chunks.push(chunk),
            Element::LineBreak => {
                let style = chunks.last().map(|c| c.style.clone()).unwrap_or_default();
                chunks.push(Chunk::new("\n", style));
            }
            other => {
                flush(&mut chunks, &mut out, heading, alignment);
                out.push(other);
            }
        }
    }
    flush(&mut chunks, &mut out, heading, alignment);
    out
}

/// Text of inline tags such as `span` or `b`. Also used for unknown tags.
#[derive(Debug)]
pub struct InlineProcessor;

impl TagProcessor for InlineProcessor {}

/// Tags whose content, nested tags included, never reaches the document.
#[derive(Debug)]
pub struct IgnoredProcessor;

impl TagProcessor for IgnoredProcessor {
    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }

    fn end(&self, _ctx: &mut HtmlContext, _tag: &Tag, _collected: Vec<Element>) -> Vec<Element> {
        Vec::new()
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

/// Structural tags (`thead`, `tbody`, ...) that only pass on what their children produce.
#[derive(Debug)]
pub struct TransparentProcessor;

impl TagProcessor for TransparentProcessor {
    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }
}

/// Root tags: loose text directly inside them becomes a paragraph.
#[derive(Debug)]
pub struct RootProcessor;

impl TagProcessor for RootProcessor {
    fn content(&self, _ctx: &mut HtmlContext, tag: &Tag, text: &str) -> Vec<Element> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let chunks = text_chunk(tag, text).into_iter().map(Element::Chunk).collect();
        paragraphs(chunks, None, Alignment::from_css(tag.css()))
    }
}

/// Paragraph-like blocks.
#[derive(Debug)]
pub struct BlockProcessor {
    pub heading: Option<u8>,
}

impl TagProcessor for BlockProcessor {
    fn end(&self, _ctx: &mut HtmlContext, tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        paragraphs(collected, self.heading, Alignment::from_css(tag.css()))
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct BreakProcessor;

impl TagProcessor for BreakProcessor {
    fn start(&self, _ctx: &mut HtmlContext, _tag: &Tag) -> Vec<Element> {
        vec![Element::LineBreak]
    }
}

#[derive(Debug)]
pub struct RuleProcessor;

impl TagProcessor for RuleProcessor {
    fn start(&self, _ctx: &mut HtmlContext, _tag: &Tag) -> Vec<Element> {
        vec![Element::HorizontalRule]
    }
}

/// `<a>`: registers anchors and links in the shared link table.
#[derive(Debug)]
pub struct AnchorProcessor;

impl TagProcessor for AnchorProcessor {
    fn start(&self, ctx: &mut HtmlContext, tag: &Tag) -> Vec<Element> {
        let mut links = ctx.links().borrow_mut();
        if let Some(name) = tag.attribute("name").or_else(|| tag.attribute("id")) {
            links.add_anchor(name);
        }
        if let Some(href) = tag.attribute("href") {
            links.add_link(href);
        }
        Vec::new()
    }

    fn content(&self, _ctx: &mut HtmlContext, tag: &Tag, text: &str) -> Vec<Element> {
        let Some(mut chunk) = text_chunk(tag, text) else {
            return Vec::new();
        };
        chunk.link = tag.attribute("href").map(str::to_string);
        chunk.anchor = tag
            .attribute("name")
            .or_else(|| tag.attribute("id"))
            .map(str::to_string);
        vec![Element::Chunk(chunk)]
    }
}

#[derive(Debug)]
pub struct ImageProcessor;

impl ImageProcessor {
    fn dimension(value: Option<&String>, page_width: f32) -> Option<f32> {
        match parse_length(value?)? {
            Length::Percent(p) => Some(page_width * p / 100.0),
            length => Some(length.to_pt(DEFAULT_FONT_SIZE_PT)),
        }
    }
}

impl TagProcessor for ImageProcessor {
    fn start(&self, ctx: &mut HtmlContext, tag: &Tag) -> Vec<Element> {
        let Some(source) = tag.attribute("src").map(str::trim).filter(|s| !s.is_empty()) else {
            log::debug!(target: "tagflow.pipeline", "<img> without src ignored");
            return Vec::new();
        };
        let page_width = ctx.page_size().width;
        let mut width = Self::dimension(tag.css().get("width"), page_width);
        let mut height = Self::dimension(tag.css().get("height"), page_width);
        if let Some(w) = width.filter(|w| *w > page_width) {
            let scale = page_width / w;
            width = Some(page_width);
            height = height.map(|h| h * scale);
        }
        let data = ctx.image_data(source);
        vec![Element::Image(Image {
            source: source.to_string(),
            alt: tag.attribute("alt").map(str::to_string),
            width_pt: width,
            height_pt: height,
            data,
        })]
    }

    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }
}

#[derive(Debug)]
pub struct ListProcessor {
    pub ordered: bool,
}

impl TagProcessor for ListProcessor {
    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }

    fn end(&self, _ctx: &mut HtmlContext, _tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        let items = collected
            .into_iter()
            .map(|element| match element {
                Element::ListItem(content) => content,
                other => vec![other],
            })
            .collect();
        vec![Element::List(List {
            ordered: self.ordered,
            items,
        })]
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct ListItemProcessor;

impl TagProcessor for ListItemProcessor {
    fn end(&self, _ctx: &mut HtmlContext, tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        vec![Element::ListItem(paragraphs(
            collected,
            None,
            Alignment::from_css(tag.css()),
        ))]
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct TableProcessor;

impl TagProcessor for TableProcessor {
    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }

    fn end(&self, _ctx: &mut HtmlContext, _tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        let mut table = Table::default();
        for element in collected {
            match element {
                Element::Row(cells) => table.rows.push(cells),
                Element::Cell(cell) => table.rows.push(vec![cell]),
                other => log::debug!(
                    target: "tagflow.pipeline",
                    "dropping {} outside of table cells",
                    other.kind()
                ),
            }
        }
        table.header_rows = table
            .rows
            .iter()
            .take_while(|row| !row.is_empty() && row.iter().all(|c| c.header))
            .count();
        vec![Element::Table(table)]
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct RowProcessor;

impl TagProcessor for RowProcessor {
    fn content(&self, _ctx: &mut HtmlContext, _tag: &Tag, _text: &str) -> Vec<Element> {
        Vec::new()
    }

    fn end(&self, _ctx: &mut HtmlContext, _tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        let cells = collected
            .into_iter()
            .filter_map(|element| match element {
                Element::Cell(cell) => Some(cell),
                _ => None,
            })
            .collect();
        vec![Element::Row(cells)]
    }

    fn is_stack_owner(&self) -> bool {
        true
    }
}

/// `td`/`th`: the cell content is built in its own nested context.
#[derive(Debug)]
pub struct CellProcessor;

impl TagProcessor for CellProcessor {
    fn end(&self, _ctx: &mut HtmlContext, tag: &Tag, collected: Vec<Element>) -> Vec<Element> {
        let span = |name: &str| {
            tag.attribute(name)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1)
        };
        let alignment = Alignment::from_css(tag.css());
        vec![Element::Cell(Cell {
            header: tag.name() == "th",
            colspan: span("colspan"),
            rowspan: span("rowspan"),
            alignment,
            elements: paragraphs(collected, None, alignment),
        })]
    }

    fn nested_context(&self) -> bool {
        true
    }
}

/// Tag name to processor registry.
#[derive(Debug)]
pub struct TagProcessors {
    processors: HashMap<String, Rc<dyn TagProcessor>>,
    fallback: Rc<dyn TagProcessor>,
    root: Rc<dyn TagProcessor>,
}

impl TagProcessors {
    /// Registry without any tag specific processor.
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
            fallback: Rc::new(InlineProcessor),
            root: Rc::new(RootProcessor),
        }
    }

    pub fn register(&mut self, names: &[&str], processor: impl TagProcessor + 'static) {
        let processor: Rc<dyn TagProcessor> = Rc::new(processor);
        for name in names {
            self.processors
                .insert(name.to_ascii_lowercase(), Rc::clone(&processor));
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn TagProcessor>> {
        self.processors.get(name).cloned()
    }

    pub(crate) fn fallback(&self) -> Rc<dyn TagProcessor> {
        Rc::clone(&self.fallback)
    }

    pub(crate) fn root(&self) -> Rc<dyn TagProcessor> {
        Rc::clone(&self.root)
    }
}

impl Default for TagProcessors {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            &["head", "title", "style", "script", "meta", "link", "base", "noscript"],
            IgnoredProcessor,
        );
        registry.register(
            &["p", "div", "blockquote", "pre", "address", "center", "dt", "dd", "section", "article"],
            BlockProcessor { heading: None },
        );
        for level in 1..=6u8 {
            let name = format!("h{level}");
            registry.register(&[name.as_str()], BlockProcessor { heading: Some(level) });
        }
        registry.register(&["br"], BreakProcessor);
        registry.register(&["hr"], RuleProcessor);
        registry.register(&["a"], AnchorProcessor);
        registry.register(&["img"], ImageProcessor);
        registry.register(&["ul", "dl"], ListProcessor { ordered: false });
        registry.register(&["ol"], ListProcessor { ordered: true });
        registry.register(&["li"], ListItemProcessor);
        registry.register(&["table"], TableProcessor);
        registry.register(&["thead", "tbody", "tfoot"], TransparentProcessor);
        registry.register(&["tr"], RowProcessor);
        registry.register(&["td", "th"], CellProcessor);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Element {
        Element::Chunk(Chunk::new(text, TextStyle::default()))
    }

    #[test]
    fn paragraphs_group_runs_around_blocks() {
        let out = paragraphs(
            vec![
                chunk("a "),
                chunk("b"),
                Element::LineBreak,
                chunk("c"),
                Element::HorizontalRule,
                chunk(" "),
                chunk("d"),
            ],
            Some(2),
            Alignment::Center,
        );
        assert_eq!(out.len(), 3);
        match &out[0] {
            Element::Paragraph(p) => {
                assert_eq!(p.text(), "a b\nc");
                assert_eq!(p.heading, Some(2));
                assert_eq!(p.alignment, Alignment::Center);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(out[1], Element::HorizontalRule);
        assert!(matches!(&out[2], Element::Paragraph(p) if p.text() == " d"));
    }

    #[test]
    fn whitespace_only_paragraphs_are_dropped() {
        assert!(paragraphs(vec![chunk(" "), chunk("\t")], None, Alignment::Left).is_empty());
    }

    #[test]
    fn registry_lookup() {
        let registry = TagProcessors::default();
        assert!(registry.get("td").is_some_and(|p| p.nested_context()));
        assert!(registry.get("h3").is_some_and(|p| p.is_stack_owner()));
        assert!(registry.get("blink").is_none());

        let mut custom = TagProcessors::empty();
        custom.register(&["X-Note"], BlockProcessor { heading: None });
        assert!(custom.get("x-note").is_some());
    }
}
