use html::CssProperties;

use crate::shorthand::expand_shorthand;

/// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

/// Marker value that pulls the parent's resolved value through.
pub const INHERIT: &str = "inherit";

// input: "color: red; font-family: 'a;b'"
// output: ["color: red", " font-family: 'a;b'"]
fn split_outside_quotes(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut paren = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => paren += 1,
            (None, ')' | ']') => paren = paren.saturating_sub(1),
            (None, c) if c == separator && paren == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

pub(crate) fn split_selector_list(input: &str) -> Vec<&str> {
    split_outside_quotes(input, ',')
}

fn strip_important(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    match lower.rfind('!') {
        Some(bang) if lower[bang + 1..].trim() == "important" => value[..bang].trim_end(),
        _ => value,
    }
}

// input: "color: red; font-size: 12px;"
// output: vec![Declaration { name: "color", value: "red" }, Declaration { name: "font-size", value: "12px" }]
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    split_outside_quotes(input, ';')
        .into_iter()
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = strip_important(v.trim()).to_string();
            if value.is_empty() {
                return None;
            }
            Some(Declaration { name, value })
        })
        .collect()
}

/// Parse a declaration block into a property map, expanding shorthands. Later declarations
/// overwrite earlier ones.
pub fn parse_declaration_block(input: &str) -> CssProperties {
    let mut map = CssProperties::new();
    for declaration in parse_declarations(input) {
        for (name, value) in expand_shorthand(&declaration.name, &declaration.value) {
            map.insert(name, value);
        }
    }
    map
}
