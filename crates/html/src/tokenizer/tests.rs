use super::{Tokenizer, TokenizerConfig, TokenizerState, tokenize};
use crate::event::{Event, EventCollector};

fn texts(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

fn fmt_all(events: &[Event]) -> Vec<String> {
    events.iter().map(ToString::to_string).collect()
}

#[test]
fn collapses_whitespace_runs_in_body_text() {
    let events = tokenize("<span>a   b</span>");
    assert_eq!(texts(&events), vec!["a b"]);
}

#[test]
fn newlines_and_tabs_collapse_to_single_space() {
    let events = tokenize("<b>one\n\t two</b>");
    assert_eq!(texts(&events), vec!["one two"]);
}

#[test]
fn pre_preserves_whitespace_exactly() {
    let events = tokenize("<pre>  a   b\n  c </pre>");
    assert_eq!(texts(&events), vec!["  a   b\n  c "]);
}

#[test]
fn spaces_next_to_block_tags_are_dropped() {
    let events = tokenize("<div>\n  <p>  hello  </p>\n</div>");
    assert_eq!(texts(&events), vec!["hello"]);
}

#[test]
fn spaces_next_to_inline_tags_survive() {
    let events = tokenize("<p>a <b>bold</b> c</p>");
    assert_eq!(texts(&events), vec!["a ", "bold", " c"]);
}

#[test]
fn line_break_drops_following_space() {
    let events = tokenize("<p>one<br> two</p>");
    assert_eq!(
        fmt_all(&events),
        vec![
            "StartTag(p)",
            "Text(\"one\")",
            "StartTag(br)",
            "EndTag(br)",
            "Text(\"two\")",
            "EndTag(p)",
        ]
    );
}

#[test]
fn unknown_entity_is_preserved_literally() {
    let first = tokenize("<p>x &zzzz; y</p>");
    assert_eq!(texts(&first), vec!["x &zzzz; y"]);

    let again = tokenize(&format!("<p>{}</p>", texts(&first)[0]));
    assert_eq!(texts(&again), vec!["x &zzzz; y"]);
}

#[test]
fn known_entities_decode() {
    let events = tokenize("<p>&lt;a&gt; &amp; &#169; &#xE9;</p>");
    assert_eq!(texts(&events), vec!["<a> & © é"]);
}

#[test]
fn entity_longer_than_limit_is_left_alone() {
    let events = tokenize("<p>&abcdefghij;</p>");
    assert_eq!(texts(&events), vec!["&abcdefghij;"]);
}

#[test]
fn bare_ampersand_followed_by_space_is_text() {
    let events = tokenize("<p>fish & chips</p>");
    assert_eq!(texts(&events), vec!["fish & chips"]);
}

#[test]
fn ampersand_before_tag_keeps_the_tag() {
    let events = tokenize("<p>a&<b>x</b></p>");
    assert_eq!(
        fmt_all(&events),
        vec![
            "StartTag(p)",
            "Text(\"a&\")",
            "StartTag(b)",
            "Text(\"x\")",
            "EndTag(b)",
            "EndTag(p)",
        ]
    );
}

#[test]
fn attributes_in_every_quoting_style() {
    let events = tokenize("<a href=\"x.html\" class='k' id=u checked title=\"a &amp; b\">t</a>");
    assert_eq!(
        events[0].to_string(),
        "StartTag(a checked=\"\" class=\"k\" href=\"x.html\" id=\"u\" title=\"a & b\")"
    );
}

#[test]
fn duplicate_attribute_keeps_first_value() {
    let events = tokenize("<p class=a class=b>x</p>");
    assert_eq!(events[0].to_string(), "StartTag(p class=\"a\")");
}

#[test]
fn attribute_names_keep_case_and_tag_names_lowercase() {
    let events = tokenize("<DIV dataValue=1></DIV>");
    assert_eq!(
        fmt_all(&events),
        vec!["StartTag(div dataValue=\"1\")", "EndTag(div)"]
    );
}

#[test]
fn self_closing_emits_start_and_end() {
    let events = tokenize("<x/><y a=1 />");
    assert_eq!(
        fmt_all(&events),
        vec!["StartTag(x)", "EndTag(x)", "StartTag(y a=\"1\")", "EndTag(y)"]
    );
}

#[test]
fn void_end_tag_is_ignored() {
    let events = tokenize("<p><img src=a.png></img>x</p>");
    assert_eq!(
        fmt_all(&events),
        vec![
            "StartTag(p)",
            "StartTag(img src=\"a.png\")",
            "EndTag(img)",
            "Text(\"x\")",
            "EndTag(p)",
        ]
    );
}

#[test]
fn namespace_prefix_is_split_from_name() {
    let events = tokenize("<svg:rect width=2></svg:rect>");
    assert_eq!(
        events[0],
        Event::StartTag {
            name: "rect".to_string(),
            namespace: Some("svg".to_string()),
            attributes: vec![("width".to_string(), "2".to_string())],
        }
    );
    assert_eq!(events[1].to_string(), "EndTag(svg:rect)");
}

#[test]
fn only_the_first_colon_splits_the_prefix() {
    let events = tokenize("<a:b:c>x</a:b:c>");
    assert_eq!(
        events[0],
        Event::StartTag {
            name: "b:c".to_string(),
            namespace: Some("a".to_string()),
            attributes: Vec::new(),
        }
    );
    assert_eq!(events[2].to_string(), "EndTag(a:b:c)");
}

#[test]
fn comments_including_empty_comment() {
    let events = tokenize("<p>a<!-- note -->b<!---->c</p>");
    assert_eq!(
        fmt_all(&events),
        vec![
            "StartTag(p)",
            "Text(\"a\")",
            "Comment(\" note \")",
            "Text(\"b\")",
            "Comment(\"\")",
            "Text(\"c\")",
            "EndTag(p)",
        ]
    );
}

#[test]
fn comment_may_contain_markup() {
    let events = tokenize("<!-- <p>not a tag</p> -->");
    assert_eq!(fmt_all(&events), vec!["Comment(\" <p>not a tag</p> \")"]);
}

#[test]
fn cdata_is_appended_as_text() {
    let events = tokenize("<p>x<![CDATA[a < b  c]]>y</p>");
    assert_eq!(texts(&events), vec!["xa < b  cy"]);
}

#[test]
fn doctype_and_processing_instruction_pass_through() {
    let events = tokenize("<?xml version=\"1.0\"?><!DOCTYPE html><html></html>");
    assert_eq!(
        fmt_all(&events),
        vec![
            "Unknown(\"<?xml version=\\\"1.0\\\"?>\")",
            "Unknown(\"<!DOCTYPE html>\")",
            "StartTag(html)",
            "EndTag(html)",
        ]
    );
}

#[test]
fn other_declarations_pass_through() {
    let events = tokenize("<!ENTITY x \"y\">");
    assert_eq!(fmt_all(&events), vec!["Unknown(\"<!ENTITY x \\\"y\\\">\")"]);
}

#[test]
fn style_content_is_raw_text() {
    let events = tokenize("<style>p > a { color: red; }  &amp;</style>");
    assert_eq!(texts(&events), vec!["p > a { color: red; }  &amp;"]);
    assert_eq!(events.last().map(ToString::to_string).as_deref(), Some("EndTag(style)"));
}

#[test]
fn script_ends_only_at_matching_end_tag() {
    let events = tokenize("<script>if (a < b) { x = \"</scr\" + \"ipt>\"; }</SCRIPT>");
    assert_eq!(
        texts(&events),
        vec!["if (a < b) { x = \"</scr\" + \"ipt>\"; }"]
    );
    assert_eq!(events.last().map(ToString::to_string).as_deref(), Some("EndTag(script)"));
}

#[test]
fn stray_less_than_is_text() {
    let events = tokenize("<p>1 < 2</p>");
    assert_eq!(texts(&events), vec!["1 < 2"]);
}

#[test]
fn split_input_yields_identical_events() {
    let input = "<p class=\"warn\">caf&eacute;   <b>bold</b><!-- c --></p><pre> x  y </pre>";
    let whole = tokenize(input);

    for split in 0..input.len() {
        if !input.is_char_boundary(split) {
            continue;
        }
        let mut tokenizer = Tokenizer::default();
        let mut collector = EventCollector::new();
        tokenizer.push_str(&input[..split], &mut collector).unwrap();
        tokenizer.push_str(&input[split..], &mut collector).unwrap();
        tokenizer.finish(&mut collector).unwrap();
        assert_eq!(collector.events, whole, "split at {split}");
    }
}

#[test]
fn finish_flushes_pending_text_and_closes_listener() {
    let mut tokenizer = Tokenizer::default();
    let mut collector = EventCollector::new();
    tokenizer.push_str("tail &amp", &mut collector).unwrap();
    assert_eq!(tokenizer.state(), TokenizerState::EntityReference);
    assert!(collector.events.is_empty());

    tokenizer.finish(&mut collector).unwrap();
    assert_eq!(texts(&collector.events), vec!["tail &amp"]);
    assert!(collector.closed);
    assert_eq!(tokenizer.state(), TokenizerState::Outside);
}

#[test]
fn unterminated_tag_is_dropped_at_finish() {
    let events = tokenize("text <div class=");
    assert_eq!(fmt_all(&events), vec!["Text(\"text \")"]);
}

#[test]
fn states_progress_through_a_tag() {
    let mut tokenizer = Tokenizer::default();
    let mut collector = EventCollector::new();
    let mut seen = Vec::new();
    for ch in "<a b>".chars() {
        tokenizer.feed(ch, &mut collector).unwrap();
        seen.push(tokenizer.state());
    }
    assert_eq!(
        seen,
        vec![
            TokenizerState::TagOpenCandidate,
            TokenizerState::TagName,
            TokenizerState::TagAttributes,
            TokenizerState::TagAttributes,
            TokenizerState::InsideTagBody,
        ]
    );
}

#[test]
fn stats_count_characters_and_events() {
    let mut tokenizer = Tokenizer::default();
    let mut collector = EventCollector::new();
    tokenizer.push_str("<p>hi</p>", &mut collector).unwrap();
    tokenizer.finish(&mut collector).unwrap();
    let stats = tokenizer.stats();
    assert_eq!(stats.characters, 9);
    assert_eq!(stats.events_emitted, 3);
    assert!(stats.state_transitions > 0);
}

#[test]
fn custom_config_can_keep_case_and_add_verbatim_tags() {
    let mut config = TokenizerConfig::default();
    config.lowercase_tag_names = false;
    config.verbatim_tags.insert("code".to_string());
    let events = super::tokenize_with("<Code>a   b</Code><code>a   b</code>", config);
    assert_eq!(
        fmt_all(&events),
        vec![
            "StartTag(Code)",
            "Text(\"a b\")",
            "EndTag(Code)",
            "StartTag(code)",
            "Text(\"a   b\")",
            "EndTag(code)",
        ]
    );
}
