/// Font size assumed when no ancestor defines one, in points.
pub const DEFAULT_FONT_SIZE_PT: f32 = 12.0;

/// A CSS length with its unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Px(f32),
    Pt(f32),
    Pc(f32),
    In(f32),
    Cm(f32),
    Mm(f32),
    Em(f32),
    Ex(f32),
    Percent(f32),
    /// A bare number, read as points.
    Number(f32),
}

impl Length {
    /// Convert to points. Relative units resolve against `font_size_pt`.
    pub fn to_pt(self, font_size_pt: f32) -> f32 {
        match self {
            Length::Px(v) => v * 0.75,
            Length::Pt(v) | Length::Number(v) => v,
            Length::Pc(v) => v * 12.0,
            Length::In(v) => v * 72.0,
            Length::Cm(v) => v * 72.0 / 2.54,
            Length::Mm(v) => v * 72.0 / 25.4,
            Length::Em(v) => v * font_size_pt,
            Length::Ex(v) => v * font_size_pt / 2.0,
            Length::Percent(v) => v * font_size_pt / 100.0,
        }
    }

    pub fn is_relative(self) -> bool {
        matches!(self, Length::Em(_) | Length::Ex(_) | Length::Percent(_))
    }
}

// input: "12px", "1.5em", "50%", "0", "10"
// output: Some(Length::Px(12.0)), ...
pub fn parse_length(value: &str) -> Option<Length> {
    let v = value.trim().to_ascii_lowercase();
    const UNITS: [(&str, fn(f32) -> Length); 9] = [
        ("px", Length::Px),
        ("pt", Length::Pt),
        ("pc", Length::Pc),
        ("in", Length::In),
        ("cm", Length::Cm),
        ("mm", Length::Mm),
        ("em", Length::Em),
        ("ex", Length::Ex),
        ("%", Length::Percent),
    ];
    for (unit, make) in UNITS {
        if let Some(num) = v.strip_suffix(unit) {
            let num = num.trim().parse::<f32>().ok()?;
            return num.is_finite().then(|| make(num));
        }
    }
    let num = v.parse::<f32>().ok()?;
    num.is_finite().then_some(Length::Number(num))
}

pub fn is_length(value: &str) -> bool {
    parse_length(value).is_some()
}

/// Absolute `font-size` keywords in points.
pub fn font_size_keyword(value: &str) -> Option<f32> {
    let pt = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => 6.75,
        "x-small" => 7.5,
        "small" => 10.0,
        "medium" => 12.0,
        "large" => 13.5,
        "x-large" => 18.0,
        "xx-large" => 24.0,
        _ => return None,
    };
    Some(pt)
}

/// Format a point value the way resolved CSS stores it, e.g. `18pt` or `10.5pt`.
pub fn format_pt(pt: f32) -> String {
    let rounded = (pt * 100.0).round() / 100.0;
    format!("{rounded}pt")
}

/// Resolve a `font-size` value to points given the parent's size.
///
/// Handles lengths, absolute keywords and `larger`/`smaller`. Anything else yields `None`.
pub fn font_size_to_pt(value: &str, parent_pt: f32) -> Option<f32> {
    let v = value.trim().to_ascii_lowercase();
    match v.as_str() {
        "larger" => return Some(parent_pt * 1.5),
        "smaller" => return Some(parent_pt / 1.5),
        _ => {}
    }
    if let Some(pt) = font_size_keyword(&v) {
        return Some(pt);
    }
    parse_length(&v).map(|len| len.to_pt(parent_pt))
}

pub fn parse_color(value: &str) -> Option<(u8, u8, u8, u8)> {
    let s = value.trim().to_ascii_lowercase();
    // HEX
    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            return Some((r, g, b, 255));
        } else if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some((r, g, b, 255));
        }
        return None;
    }

    // rgb(r, g, b)
    if let Some(args) = s
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let mut parts = args.split(',').map(|p| p.trim().parse::<u8>().ok());
        let (r, g, b) = (parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        return Some((r, g, b, 255));
    }

    let named = match s.as_str() {
        "black" => (0, 0, 0, 255),
        "blue" => (0, 0, 255, 255),
        "cyan" | "aqua" => (0, 255, 255, 255),
        "fuchsia" | "magenta" => (255, 0, 255, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "green" => (0, 128, 0, 255),
        "lime" => (0, 255, 0, 255),
        "maroon" => (128, 0, 0, 255),
        "navy" => (0, 0, 128, 255),
        "olive" => (128, 128, 0, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "red" => (255, 0, 0, 255),
        "silver" => (192, 192, 192, 255),
        "teal" => (0, 128, 128, 255),
        "white" => (255, 255, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "transparent" => (0, 0, 0, 0),
        _ => return None,
    };
    Some(named)
}

pub fn is_color(value: &str) -> bool {
    parse_color(value).is_some()
}
