//! Declarations implied by presentational markup attributes.

use html::{CssProperties, Tag};

use crate::values::{format_pt, parse_length};

/// `<font size>` steps 1 to 7 in points.
const FONT_SIZES_PT: [f32; 7] = [8.0, 10.0, 12.0, 14.0, 18.0, 24.0, 36.0];
const BASE_FONT_SIZE_STEP: i32 = 3;

fn attribute<'t>(tag: &'t Tag, name: &str) -> Option<&'t str> {
    tag.attributes()
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// `width="40"` means pixels.
fn dimension(value: &str) -> String {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{value}px")
    } else {
        value.to_string()
    }
}

// input: "5", "+2", "-1"
// output: Some(18pt), Some(18pt), Some(10pt)
fn font_size_step(value: &str) -> Option<String> {
    let step = match value.as_bytes().first()? {
        b'+' => BASE_FONT_SIZE_STEP.saturating_add(value[1..].trim().parse::<i32>().ok()?),
        b'-' => BASE_FONT_SIZE_STEP.saturating_sub(value[1..].trim().parse::<i32>().ok()?),
        _ => value.parse::<i32>().ok()?,
    };
    let index = step.clamp(1, FONT_SIZES_PT.len() as i32) as usize - 1;
    Some(format_pt(FONT_SIZES_PT[index]))
}

/// Declarations for the presentational attributes of `tag`. Inline `style` is not
/// included; the resolver applies it after these.
pub fn attribute_declarations(tag: &Tag) -> CssProperties {
    let mut css = CssProperties::new();
    let name = tag.name().to_ascii_lowercase();

    if let Some(align) = attribute(tag, "align") {
        // On images and tables `align` floats the box instead of aligning its text.
        let property = match name.as_str() {
            "img" | "table" => "float",
            _ => "text-align",
        };
        css.insert(property.to_string(), align.to_ascii_lowercase());
    }
    if let Some(valign) = attribute(tag, "valign") {
        css.insert("vertical-align".to_string(), valign.to_ascii_lowercase());
    }
    if let Some(bgcolor) = attribute(tag, "bgcolor") {
        css.insert("background-color".to_string(), bgcolor.to_string());
    }
    for property in ["width", "height"] {
        if let Some(value) = attribute(tag, property) {
            css.insert(property.to_string(), dimension(value));
        }
    }

    match name.as_str() {
        "table" => {
            if let Some(border) = attribute(tag, "border") {
                let width = dimension(border);
                let visible = parse_length(&width).is_some_and(|len| len.to_pt(0.0) > 0.0);
                for side in ["top", "right", "bottom", "left"] {
                    css.insert(format!("border-{side}-width"), width.clone());
                    if visible {
                        css.insert(format!("border-{side}-style"), "solid".to_string());
                    }
                }
            }
        }
        "font" | "basefont" => {
            if let Some(color) = attribute(tag, "color") {
                css.insert("color".to_string(), color.to_string());
            }
            if let Some(face) = attribute(tag, "face") {
                css.insert("font-family".to_string(), face.to_string());
            }
            if let Some(size) = attribute(tag, "size").and_then(font_size_step) {
                css.insert("font-size".to_string(), size);
            }
        }
        "body" => {
            if let Some(text) = attribute(tag, "text") {
                css.insert("color".to_string(), text.to_string());
            }
        }
        _ => {}
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::build_tag_tree;

    fn declarations(markup: &str) -> CssProperties {
        let tree = build_tag_tree(markup);
        attribute_declarations(&tree[tree.roots()[0]])
    }

    #[test]
    fn alignment_and_colors() {
        let css = declarations("<td align=CENTER valign=top bgcolor=#eee>x</td>");
        assert_eq!(css["text-align"], "center");
        assert_eq!(css["vertical-align"], "top");
        assert_eq!(css["background-color"], "#eee");
    }

    #[test]
    fn image_align_floats() {
        let css = declarations("<img align=left width=40 height=50%>");
        assert_eq!(css["float"], "left");
        assert_eq!(css["width"], "40px");
        assert_eq!(css["height"], "50%");
        assert!(!css.contains_key("text-align"));
    }

    #[test]
    fn table_border() {
        let css = declarations("<table border=1></table>");
        assert_eq!(css["border-left-width"], "1px");
        assert_eq!(css["border-top-style"], "solid");

        let none = declarations("<table border=0></table>");
        assert_eq!(none["border-left-width"], "0px");
        assert!(!none.contains_key("border-left-style"));
    }

    #[test]
    fn font_attributes() {
        let css = declarations("<font color=red face=Arial size=5>x</font>");
        assert_eq!(css["color"], "red");
        assert_eq!(css["font-family"], "Arial");
        assert_eq!(css["font-size"], "18pt");

        assert_eq!(declarations("<font size=+1>x</font>")["font-size"], "14pt");
        assert_eq!(declarations("<font size=-2>x</font>")["font-size"], "8pt");
        assert_eq!(declarations("<font size=99>x</font>")["font-size"], "36pt");
        assert!(!declarations("<font size=big>x</font>").contains_key("font-size"));
    }

    #[test]
    fn extreme_relative_font_sizes_clamp() {
        assert_eq!(declarations("<font size=+2147483647>x</font>")["font-size"], "36pt");
        assert_eq!(declarations("<font size=-2147483648>x</font>")["font-size"], "8pt");
        assert_eq!(declarations("<font size=-2147483647>x</font>")["font-size"], "8pt");
    }

    #[test]
    fn body_text_color_and_plain_tags() {
        assert_eq!(declarations("<body text=navy></body>")["color"], "navy");
        assert!(declarations("<p style=\"color: red\">x</p>").is_empty());
    }
}
