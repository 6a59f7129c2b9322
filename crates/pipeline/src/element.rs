//! Document element descriptions handed to the external document builder.

use css::values::{DEFAULT_FONT_SIZE_PT, font_size_to_pt, parse_color};
use html::CssProperties;

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size_pt: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<(u8, u8, u8, u8)>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            bold: false,
            italic: false,
            underline: false,
            color: None,
        }
    }
}

impl TextStyle {
    /// Read the text related properties of a resolved CSS map. Values that do not parse
    /// leave the default in place.
    pub fn from_css(css: &CssProperties) -> Self {
        let get = |name: &str| css.get(name).map(|v| v.trim().to_ascii_lowercase());
        let bold = match get("font-weight").as_deref() {
            Some("bold" | "bolder") => true,
            Some(w) => w.parse::<u32>().is_ok_and(|w| w >= 600),
            None => false,
        };
        Self {
            font_family: css
                .get("font-family")
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty()),
            font_size_pt: get("font-size")
                .and_then(|v| font_size_to_pt(&v, DEFAULT_FONT_SIZE_PT))
                .unwrap_or(DEFAULT_FONT_SIZE_PT),
            bold,
            italic: matches!(get("font-style").as_deref(), Some("italic" | "oblique")),
            underline: get("text-decoration").is_some_and(|d| d.contains("underline")),
            color: get("color").and_then(|c| parse_color(&c)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn from_css(css: &CssProperties) -> Self {
        match css.get("text-align").map(|a| a.trim().to_ascii_lowercase()).as_deref() {
            Some("center" | "middle") => Alignment::Center,
            Some("right") => Alignment::Right,
            Some("justify") => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// A run of text sharing one style.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub style: TextStyle,
    /// Target of a link the run belongs to.
    pub link: Option<String>,
    /// Name of an anchor placed at the run.
    pub anchor: Option<String>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
            anchor: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub chunks: Vec<Chunk>,
    /// 1 to 6 for headings.
    pub heading: Option<u8>,
    pub alignment: Alignment,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<Vec<Element>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    /// Reference as written in the markup.
    pub source: String,
    pub alt: Option<String>,
    pub width_pt: Option<f32>,
    pub height_pt: Option<f32>,
    /// Bytes delivered by the resource collaborator, when one is configured.
    pub data: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub header: bool,
    pub colspan: u32,
    pub rowspan: u32,
    pub alignment: Alignment,
    pub elements: Vec<Element>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    /// Leading rows made of header cells only.
    pub header_rows: usize,
}

/// One structured document element.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Chunk(Chunk),
    Paragraph(Paragraph),
    LineBreak,
    HorizontalRule,
    List(List),
    ListItem(Vec<Element>),
    Image(Image),
    Table(Table),
    Row(Vec<Cell>),
    Cell(Cell),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Chunk(_) => "chunk",
            Element::Paragraph(_) => "paragraph",
            Element::LineBreak => "line-break",
            Element::HorizontalRule => "horizontal-rule",
            Element::List(_) => "list",
            Element::ListItem(_) => "list-item",
            Element::Image(_) => "image",
            Element::Table(_) => "table",
            Element::Row(_) => "row",
            Element::Cell(_) => "cell",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css(pairs: &[(&str, &str)]) -> CssProperties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn text_style_from_css() {
        let style = TextStyle::from_css(&css(&[
            ("font-weight", "700"),
            ("font-style", "Italic"),
            ("text-decoration", "underline overline"),
            ("font-size", "18pt"),
            ("color", "#ff0000"),
            ("font-family", " Courier "),
        ]));
        assert!(style.bold && style.italic && style.underline);
        assert_eq!(style.font_size_pt, 18.0);
        assert_eq!(style.color, Some((255, 0, 0, 255)));
        assert_eq!(style.font_family.as_deref(), Some("Courier"));
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let style = TextStyle::from_css(&css(&[("font-size", "huge"), ("color", "nope")]));
        assert_eq!(style, TextStyle::default());
        assert_eq!(Alignment::from_css(&css(&[("text-align", "CENTER")])), Alignment::Center);
        assert_eq!(Alignment::from_css(&CssProperties::new()), Alignment::Left);
    }
}
