//! Cascade and inheritance: turns matched rules, markup attributes and the parent's
//! resolved CSS into the resolved CSS of one tag.

use std::sync::Arc;

use html::{CssProperties, TagId, TagTree};

use crate::attributes::attribute_declarations;
use crate::declarations::{INHERIT, parse_declaration_block};
use crate::inheritance::{InheritAll, InheritanceRules};
use crate::stylesheet::CssFiles;
use crate::values::{
    DEFAULT_FONT_SIZE_PT, Length, font_size_keyword, font_size_to_pt, format_pt, parse_length,
};

/// Resolves CSS for tags of a [`TagTree`] against a set of stylesheets.
///
/// Resolution of a tag reads the published CSS of its parent, so parents have to be
/// resolved and published first (document order does that).
#[derive(Clone, Debug)]
pub struct StyleResolver {
    files: CssFiles,
    rules: Arc<dyn InheritanceRules>,
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new(CssFiles::new())
    }
}

impl StyleResolver {
    pub fn new(files: CssFiles) -> Self {
        Self {
            files,
            rules: Arc::new(InheritAll),
        }
    }

    pub fn with_inheritance_rules(mut self, rules: impl InheritanceRules + 'static) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn files(&self) -> &CssFiles {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut CssFiles {
        &mut self.files
    }

    /// Compute the resolved CSS of `id` without storing it.
    pub fn resolve(&self, tree: &TagTree, id: TagId) -> CssProperties {
        let Some(tag) = tree.get(id) else {
            return CssProperties::new();
        };
        let parent = tree.parent(id).and_then(|p| tree.get(p));

        // 1. stylesheet entries, lowest specificity first
        let mut css = CssProperties::new();
        for entry in self.files.matching(tree, id) {
            for (property, value) in entry.declarations() {
                css.insert(property.clone(), value.clone());
            }
        }

        // 2. presentational attributes, then inline style
        let mut own = attribute_declarations(tag);
        let inline = tag
            .attributes()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("style"))
            .map(|(_, v)| v.as_str());
        if let Some(style) = inline {
            own.extend(parse_declaration_block(style));
        }
        for (property, value) in own {
            if css.get(&property).is_some_and(|v| v.eq_ignore_ascii_case(INHERIT)) {
                continue;
            }
            css.insert(property, value);
        }

        let parent_font_pt = parent
            .and_then(|p| p.css().get("font-size"))
            .and_then(|v| font_size_to_pt(v, DEFAULT_FONT_SIZE_PT))
            .unwrap_or(DEFAULT_FONT_SIZE_PT);
        if let Some(size) = css.get_mut("font-size") {
            if is_relative_font_size(size) {
                if let Some(pt) = font_size_to_pt(size, parent_font_pt) {
                    *size = format_pt(pt);
                }
            }
        }

        // 3. inheritance
        if let Some(parent) = parent {
            let inherit_tag = self.rules.inherit_tag(tag.name());
            for (property, value) in parent.css() {
                let copy = match css.get(property) {
                    Some(current) => current.eq_ignore_ascii_case(INHERIT),
                    None => {
                        inherit_tag
                            && self
                                .rules
                                .inherit_property(tag.name(), parent.name(), property)
                    }
                };
                if copy {
                    css.insert(property.clone(), value.clone());
                }
            }
        }
        css.retain(|property, value| {
            let keep = !value.eq_ignore_ascii_case(INHERIT);
            if !keep {
                log::trace!(target: "tagflow.css", "{property}: inherit without a parent value");
            }
            keep
        });
        css
    }

    /// Resolve `id` and publish the result on the tag. Returns `false` when the tag had
    /// already been published.
    pub fn resolve_and_publish(&self, tree: &mut TagTree, id: TagId) -> bool {
        let css = self.resolve(tree, id);
        tree.publish_css(id, css)
    }

    /// Resolve and publish every tag of `tree`, parents before children.
    pub fn resolve_tree(&self, tree: &mut TagTree) {
        for root in tree.roots() {
            for id in tree.descendants(root) {
                self.resolve_and_publish(tree, id);
            }
        }
    }
}

fn is_relative_font_size(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    v == "larger"
        || v == "smaller"
        || font_size_keyword(&v).is_some()
        || parse_length(&v).is_some_and(Length::is_relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inheritance::HtmlInheritanceRules;
    use crate::scanner::parse_css;
    use html::build_tag_tree;

    fn resolver(css: &str) -> StyleResolver {
        let mut files = CssFiles::new();
        files.add(parse_css(css, false));
        StyleResolver::new(files)
    }

    /// Resolve the whole tree and return the css of the first tag named `name`.
    fn css_of(resolver: &StyleResolver, markup: &str, name: &str) -> CssProperties {
        let mut tree = build_tag_tree(markup);
        resolver.resolve_tree(&mut tree);
        let id = tree
            .roots()
            .into_iter()
            .flat_map(|r| tree.descendants(r))
            .find(|id| tree[*id].name() == name)
            .unwrap();
        tree[id].css().clone()
    }

    #[derive(Debug)]
    struct InheritNothing;

    impl InheritanceRules for InheritNothing {
        fn inherit_tag(&self, _tag: &str) -> bool {
            false
        }

        fn inherit_property(&self, _tag: &str, _parent: &str, _property: &str) -> bool {
            false
        }
    }

    #[test]
    fn inline_beats_specific_beats_general() {
        let r = resolver("p.warn { color: blue } p { color: red }");
        let green = css_of(&r, "<p class=\"warn\" style=\"color: green\">t</p>", "p");
        assert_eq!(green["color"], "green");
        assert_eq!(css_of(&r, "<p class=\"warn\">t</p>", "p")["color"], "blue");
        assert_eq!(css_of(&r, "<p>t</p>", "p")["color"], "red");
    }

    #[test]
    fn attributes_lose_to_inline_style() {
        let r = StyleResolver::default();
        let css = css_of(&r, "<td align=left style=\"text-align: right\">x</td>", "td");
        assert_eq!(css["text-align"], "right");
    }

    #[test]
    fn parent_values_flow_down() {
        let r = resolver("span { color: navy }");
        let css = css_of(&r, "<div style=\"font-size: 12\"><p>x<span>y</span></p></div>", "span");
        assert_eq!(css["font-size"], "12");
        assert_eq!(css["color"], "navy");
    }

    #[test]
    fn explicit_inherit_ignores_policy() {
        let markup = "<div style=\"font-size: 12\"><p>x</p></div>";
        let all = resolver("p { font-size: inherit }");
        let none = resolver("p { font-size: inherit }").with_inheritance_rules(InheritNothing);
        assert_eq!(css_of(&all, markup, "p")["font-size"], "12");
        assert_eq!(css_of(&none, markup, "p")["font-size"], "12");
        assert!(!css_of(&StyleResolver::default().with_inheritance_rules(InheritNothing), markup, "p")
            .contains_key("font-size"));
    }

    #[test]
    fn stylesheet_inherit_shields_from_inline() {
        let r = resolver("p { color: inherit }");
        let css = css_of(&r, "<div style=\"color: red\"><p style=\"color: green\">x</p></div>", "p");
        assert_eq!(css["color"], "red");
    }

    #[test]
    fn inherit_keyword_ignores_case() {
        let r = resolver("p { color: INHERIT; font-size: Inherit }");
        let css = css_of(&r, "<div style=\"color: red\"><p style=\"color: green\">x</p></div>", "p");
        assert_eq!(css["color"], "red");
        assert!(!css.contains_key("font-size"));
    }

    #[test]
    fn inherit_without_parent_value_is_dropped() {
        let r = resolver("p { color: inherit; margin-top: 0 }");
        let css = css_of(&r, "<p>x</p>", "p");
        assert!(!css.contains_key("color"));
        assert_eq!(css["margin-top"], "0");
    }

    #[test]
    fn relative_font_sizes_use_parent_size() {
        let r = resolver("div { font-size: 18pt } p { font-size: 1.5em } b { font-size: smaller }");
        let markup = "<div><p>x<b>y</b></p></div>";
        assert_eq!(css_of(&r, markup, "p")["font-size"], "27pt");
        assert_eq!(css_of(&r, markup, "b")["font-size"], "18pt");

        let top = resolver("p { font-size: 50% }");
        assert_eq!(css_of(&top, "<p>x</p>", "p")["font-size"], "6pt");
    }

    #[test]
    fn html_rules_keep_margins_local() {
        let r = resolver("div { margin-left: 4px; color: red }")
            .with_inheritance_rules(HtmlInheritanceRules);
        let css = css_of(&r, "<div><p>x</p></div>", "p");
        assert_eq!(css["color"], "red");
        assert!(!css.contains_key("margin-left"));
    }

    #[test]
    fn selectors_of_every_kind_combine() {
        let r = resolver("dummy { key1: value1 } .aklass { key3: value3 } #dumid { key4: value4 }");
        let css = css_of(&r, "<dummy class=\"aklass\" id=\"dumid\"></dummy>", "dummy");
        assert_eq!(css["key1"], "value1");
        assert_eq!(css["key3"], "value3");
        assert_eq!(css["key4"], "value4");
    }

    #[test]
    fn published_css_is_not_replaced() {
        let r = resolver("p { color: red }");
        let mut tree = build_tag_tree("<p>x</p>");
        let p = tree.roots()[0];
        assert!(r.resolve_and_publish(&mut tree, p));
        let other = resolver("p { color: blue }");
        assert!(!other.resolve_and_publish(&mut tree, p));
        assert_eq!(tree[p].css()["color"], "red");
    }
}
