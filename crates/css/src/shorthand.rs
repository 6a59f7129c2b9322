//! Expansion of shorthand properties into their longhand parts.

use crate::values::{Length, font_size_keyword, is_color, is_length, parse_length};

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];
const BORDER_WIDTH_KEYWORDS: &[&str] = &["thin", "medium", "thick"];
const LIST_STYLE_TYPES: &[&str] = &[
    "disc",
    "circle",
    "square",
    "decimal",
    "lower-roman",
    "upper-roman",
    "lower-alpha",
    "upper-alpha",
    "lower-latin",
    "upper-latin",
    "lower-greek",
    "none",
];
const FONT_WEIGHTS: &[&str] = &[
    "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800", "900",
];

/// Expand `name: value` into the declarations it stands for. Properties that are not
/// shorthands come back unchanged.
pub fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    let expanded = match name {
        "margin" | "padding" => four_sides(value, |side| format!("{name}-{side}")),
        "border-width" => four_sides(value, |side| format!("border-{side}-width")),
        "border-style" => four_sides(value, |side| format!("border-{side}-style")),
        "border-color" => four_sides(value, |side| format!("border-{side}-color")),
        "border" => Some(border(value, &SIDES)),
        "border-top" => Some(border(value, &["top"])),
        "border-right" => Some(border(value, &["right"])),
        "border-bottom" => Some(border(value, &["bottom"])),
        "border-left" => Some(border(value, &["left"])),
        "font" => font(value),
        "list-style" => Some(list_style(value)),
        "background" => Some(background(value)),
        _ => None,
    };
    match expanded {
        Some(list) if !list.is_empty() => list,
        _ => vec![(name.to_string(), value.to_string())],
    }
}

// input: "1px 2px"
// output: top=1px right=2px bottom=1px left=2px
fn four_sides(
    value: &str,
    key: impl Fn(&str) -> String,
) -> Option<Vec<(String, String)>> {
    let parts: Vec<&str> = value.split_ascii_whitespace().collect();
    let [top, right, bottom, left] = match parts.as_slice() {
        [all] => [*all; 4],
        [v, h] => [*v, *h, *v, *h],
        [t, h, b] => [*t, *h, *b, *h],
        [t, r, b, l] => [*t, *r, *b, *l],
        _ => return None,
    };
    Some(
        SIDES
            .iter()
            .zip([top, right, bottom, left])
            .map(|(side, v)| (key(side), v.to_string()))
            .collect(),
    )
}

// input: "1px solid red"
// output: border-<side>-width=1px, border-<side>-style=solid, border-<side>-color=red
fn border(value: &str, sides: &[&str]) -> Vec<(String, String)> {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for part in value.split_ascii_whitespace() {
        let lower = part.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) {
            style = Some(lower);
        } else if BORDER_WIDTH_KEYWORDS.contains(&lower.as_str()) || is_length(part) {
            width = Some(part.to_string());
        } else if is_color(part) {
            color = Some(part.to_string());
        }
    }
    let mut out = Vec::new();
    for side in sides {
        if let Some(w) = &width {
            out.push((format!("border-{side}-width"), w.clone()));
        }
        if let Some(s) = &style {
            out.push((format!("border-{side}-style"), s.clone()));
        }
        if let Some(c) = &color {
            out.push((format!("border-{side}-color"), c.clone()));
        }
    }
    out
}

fn is_font_size(token: &str) -> bool {
    let size = token.split('/').next().unwrap_or(token);
    // Bare numbers are weights here, not sizes.
    matches!(parse_length(size), Some(len) if !matches!(len, Length::Number(_)))
        || font_size_keyword(size).is_some()
        || matches!(size.to_ascii_lowercase().as_str(), "larger" | "smaller")
}

// input: "italic bold 12px/1.2 'Times New Roman', serif"
// output: font-style=italic font-weight=bold font-size=12px line-height=1.2 font-family=...
fn font(value: &str) -> Option<Vec<(String, String)>> {
    let tokens: Vec<&str> = value.split_ascii_whitespace().collect();
    let size_index = tokens.iter().position(|t| is_font_size(t))?;
    let mut out = Vec::new();
    for token in &tokens[..size_index] {
        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "italic" | "oblique" => out.push(("font-style".to_string(), lower)),
            "small-caps" => out.push(("font-variant".to_string(), lower)),
            w if FONT_WEIGHTS.contains(&w) => out.push(("font-weight".to_string(), lower)),
            _ => {}
        }
    }
    let size = tokens[size_index];
    match size.split_once('/') {
        Some((font_size, line_height)) => {
            out.push(("font-size".to_string(), font_size.to_string()));
            out.push(("line-height".to_string(), line_height.to_string()));
        }
        None => out.push(("font-size".to_string(), size.to_string())),
    }
    let family = tokens[size_index + 1..].join(" ");
    if !family.is_empty() {
        out.push(("font-family".to_string(), family));
    }
    Some(out)
}

fn list_style(value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for part in value.split_ascii_whitespace() {
        let lower = part.to_ascii_lowercase();
        if LIST_STYLE_TYPES.contains(&lower.as_str()) {
            out.push(("list-style-type".to_string(), lower));
        } else if lower == "inside" || lower == "outside" {
            out.push(("list-style-position".to_string(), lower));
        } else if lower.starts_with("url(") {
            out.push(("list-style-image".to_string(), part.to_string()));
        }
    }
    out
}

fn background(value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for part in value.split_ascii_whitespace() {
        if part.to_ascii_lowercase().starts_with("url(") {
            out.push(("background-image".to_string(), part.to_string()));
        } else if is_color(part) {
            out.push(("background-color".to_string(), part.to_string()));
        }
    }
    out
}
