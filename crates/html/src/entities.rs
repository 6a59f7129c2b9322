//! Character reference decoding.
//!
//! Named references cover the HTML 4 Latin-1, special and symbol sets. Numeric references
//! accept decimal (`#169`) and hexadecimal (`#xA9`) forms. Anything else is reported as
//! unknown and callers keep the raw reference text.

/// Names for U+00A0..=U+00FF, in code point order.
const LATIN1: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc",
    "uuml", "yacute", "thorn", "yuml",
];

const NAMED: &[(&str, char)] = &[
    ("quot", '"'),
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("apos", '\''),
    ("OElig", '\u{0152}'),
    ("oelig", '\u{0153}'),
    ("Scaron", '\u{0160}'),
    ("scaron", '\u{0161}'),
    ("Yuml", '\u{0178}'),
    ("fnof", '\u{0192}'),
    ("circ", '\u{02C6}'),
    ("tilde", '\u{02DC}'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("zwnj", '\u{200C}'),
    ("zwj", '\u{200D}'),
    ("lrm", '\u{200E}'),
    ("rlm", '\u{200F}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201A}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("bdquo", '\u{201E}'),
    ("dagger", '\u{2020}'),
    ("Dagger", '\u{2021}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    ("permil", '\u{2030}'),
    ("prime", '\u{2032}'),
    ("Prime", '\u{2033}'),
    ("lsaquo", '\u{2039}'),
    ("rsaquo", '\u{203A}'),
    ("oline", '\u{203E}'),
    ("frasl", '\u{2044}'),
    ("euro", '\u{20AC}'),
    ("trade", '\u{2122}'),
    ("larr", '\u{2190}'),
    ("uarr", '\u{2191}'),
    ("rarr", '\u{2192}'),
    ("darr", '\u{2193}'),
    ("harr", '\u{2194}'),
    ("lArr", '\u{21D0}'),
    ("rArr", '\u{21D2}'),
    ("hArr", '\u{21D4}'),
    ("forall", '\u{2200}'),
    ("part", '\u{2202}'),
    ("exist", '\u{2203}'),
    ("empty", '\u{2205}'),
    ("nabla", '\u{2207}'),
    ("isin", '\u{2208}'),
    ("notin", '\u{2209}'),
    ("ni", '\u{220B}'),
    ("prod", '\u{220F}'),
    ("sum", '\u{2211}'),
    ("minus", '\u{2212}'),
    ("radic", '\u{221A}'),
    ("infin", '\u{221E}'),
    ("and", '\u{2227}'),
    ("or", '\u{2228}'),
    ("cap", '\u{2229}'),
    ("cup", '\u{222A}'),
    ("int", '\u{222B}'),
    ("ne", '\u{2260}'),
    ("equiv", '\u{2261}'),
    ("le", '\u{2264}'),
    ("ge", '\u{2265}'),
    ("loz", '\u{25CA}'),
    ("spades", '\u{2660}'),
    ("clubs", '\u{2663}'),
    ("hearts", '\u{2665}'),
    ("diams", '\u{2666}'),
    ("Alpha", '\u{0391}'),
    ("Beta", '\u{0392}'),
    ("Gamma", '\u{0393}'),
    ("Delta", '\u{0394}'),
    ("Epsilon", '\u{0395}'),
    ("Zeta", '\u{0396}'),
    ("Eta", '\u{0397}'),
    ("Theta", '\u{0398}'),
    ("Iota", '\u{0399}'),
    ("Kappa", '\u{039A}'),
    ("Lambda", '\u{039B}'),
    ("Mu", '\u{039C}'),
    ("Nu", '\u{039D}'),
    ("Xi", '\u{039E}'),
    ("Omicron", '\u{039F}'),
    ("Pi", '\u{03A0}'),
    ("Rho", '\u{03A1}'),
    ("Sigma", '\u{03A3}'),
    ("Tau", '\u{03A4}'),
    ("Upsilon", '\u{03A5}'),
    ("Phi", '\u{03A6}'),
    ("Chi", '\u{03A7}'),
    ("Psi", '\u{03A8}'),
    ("Omega", '\u{03A9}'),
    ("alpha", '\u{03B1}'),
    ("beta", '\u{03B2}'),
    ("gamma", '\u{03B3}'),
    ("delta", '\u{03B4}'),
    ("epsilon", '\u{03B5}'),
    ("zeta", '\u{03B6}'),
    ("eta", '\u{03B7}'),
    ("theta", '\u{03B8}'),
    ("iota", '\u{03B9}'),
    ("kappa", '\u{03BA}'),
    ("lambda", '\u{03BB}'),
    ("mu", '\u{03BC}'),
    ("nu", '\u{03BD}'),
    ("xi", '\u{03BE}'),
    ("omicron", '\u{03BF}'),
    ("pi", '\u{03C0}'),
    ("rho", '\u{03C1}'),
    ("sigmaf", '\u{03C2}'),
    ("sigma", '\u{03C3}'),
    ("tau", '\u{03C4}'),
    ("upsilon", '\u{03C5}'),
    ("phi", '\u{03C6}'),
    ("chi", '\u{03C7}'),
    ("psi", '\u{03C8}'),
    ("omega", '\u{03C9}'),
];

/// Longest reference body (the text between `&` and `;`) the tokenizer buffers.
pub const MAX_REFERENCE_LEN: usize = 7;

/// Decode a single character reference body such as `amp`, `#169` or `#xA9`.
///
/// Returns `None` for unknown names, malformed numerics and values that are not
/// Unicode scalar values.
pub fn decode_entity(reference: &str) -> Option<char> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let value = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            Some(_) => return None,
            None if !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit()) => {
                numeric.parse::<u32>().ok()?
            }
            None => return None,
        };
        return char::from_u32(value);
    }

    if let Some(index) = LATIN1.iter().position(|name| *name == reference) {
        return char::from_u32(0xA0 + index as u32);
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == reference)
        .map(|(_, ch)| *ch)
}

/// Decode every well-formed reference in `s`, leaving unknown or unterminated ones as written.
///
/// Used for attribute values, which the tokenizer collects whole rather than per character.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let body_len = after
            .char_indices()
            .take_while(|(_, ch)| ch.is_ascii_alphanumeric() || *ch == '#')
            .map(|(i, ch)| i + ch.len_utf8())
            .last()
            .unwrap_or(0);
        let terminated = after[body_len..].starts_with(';');
        let decoded = if terminated && body_len > 0 && body_len <= MAX_REFERENCE_LEN {
            decode_entity(&after[..body_len])
        } else {
            None
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &after[body_len + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_references() {
        assert_eq!(decode_entity("amp"), Some('&'));
        assert_eq!(decode_entity("nbsp"), Some('\u{00A0}'));
        assert_eq!(decode_entity("copy"), Some('©'));
        assert_eq!(decode_entity("yuml"), Some('ÿ'));
        assert_eq!(decode_entity("Omicron"), Some('Ο'));
        assert_eq!(decode_entity("euro"), Some('€'));
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entity("#215"), Some('×'));
        assert_eq!(decode_entity("#xD7"), Some('×'));
        assert_eq!(decode_entity("#XD7"), Some('×'));
    }

    #[test]
    fn rejects_unknown_and_malformed_references() {
        assert_eq!(decode_entity("zzzz"), None);
        assert_eq!(decode_entity("AMP"), None);
        assert_eq!(decode_entity("#"), None);
        assert_eq!(decode_entity("#x"), None);
        assert_eq!(decode_entity("#xZZ"), None);
        assert_eq!(decode_entity("#55296"), None);
        assert_eq!(decode_entity("#12a"), None);
    }

    #[test]
    fn bulk_decode_keeps_unknown_and_unterminated_references() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("x &zzzz; y"), "x &zzzz; y");
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&&amp;"), "&&");
        assert_eq!(decode_entities("q=1&r=2"), "q=1&r=2");
        assert_eq!(decode_entities("café &eacute;"), "café é");
    }

    #[test]
    fn bulk_decode_is_idempotent_on_unknown_references() {
        for sample in ["&", "&&", "&;", "&#;", "&#x;", "&unknown;", "&#xZZ;"] {
            assert_eq!(decode_entities(sample), sample);
        }
    }
}
