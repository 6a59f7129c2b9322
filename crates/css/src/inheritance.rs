//! Policies deciding which resolved properties flow from a parent tag to its children.

/// Injectable inheritance policy consulted by [`crate::StyleResolver`].
///
/// A property reaches a child only when both checks allow it and the child has no value
/// of its own. An explicit `inherit` value bypasses the policy.
pub trait InheritanceRules: std::fmt::Debug {
    /// Whether `tag` takes over anything from its parent at all.
    fn inherit_tag(&self, tag: &str) -> bool;

    /// Whether `property` of `parent` flows down into `tag`.
    fn inherit_property(&self, tag: &str, parent: &str, property: &str) -> bool;
}

/// Everything is inherited.
#[derive(Clone, Copy, Debug, Default)]
pub struct InheritAll;

impl InheritanceRules for InheritAll {
    fn inherit_tag(&self, _tag: &str) -> bool {
        true
    }

    fn inherit_property(&self, _tag: &str, _parent: &str, _property: &str) -> bool {
        true
    }
}

/// Properties no tag passes down.
const NOT_INHERITED: &[&str] = &[
    "width",
    "height",
    "min-width",
    "max-width",
    "min-height",
    "max-height",
    "display",
    "position",
    "float",
    "clear",
    "vertical-align",
    "page-break-before",
    "page-break-after",
    "page-break-inside",
];
const NOT_INHERITED_PREFIXES: &[&str] = &["margin", "padding", "border", "background"];

/// Properties a `table` does not take from its parent.
const PARENT_TO_TABLE: &[&str] = &[
    "line-height",
    "font-size",
    "font-style",
    "font-weight",
    "text-indent",
];

/// Properties rows and sections do not take from their `table`.
const TABLE_TO_CONTENT: &[&str] = &["text-align", "color"];

/// Inheritance close to what HTML rendering expects: box model, background and sizing
/// properties stay on the tag that declares them, and tables cut some font properties.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlInheritanceRules;

impl InheritanceRules for HtmlInheritanceRules {
    fn inherit_tag(&self, _tag: &str) -> bool {
        true
    }

    fn inherit_property(&self, tag: &str, parent: &str, property: &str) -> bool {
        if NOT_INHERITED.contains(&property)
            || NOT_INHERITED_PREFIXES
                .iter()
                .any(|prefix| property.starts_with(prefix))
        {
            return false;
        }
        if tag == "table" && PARENT_TO_TABLE.contains(&property) {
            return false;
        }
        if parent == "table" && TABLE_TO_CONTENT.contains(&property) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_all_allows_everything() {
        assert!(InheritAll.inherit_tag("td"));
        assert!(InheritAll.inherit_property("p", "div", "margin-top"));
    }

    #[test]
    fn html_rules_keep_box_properties_local() {
        let rules = HtmlInheritanceRules;
        assert!(!rules.inherit_property("p", "div", "margin-left"));
        assert!(!rules.inherit_property("p", "div", "border-top-width"));
        assert!(!rules.inherit_property("p", "div", "background-color"));
        assert!(!rules.inherit_property("p", "div", "width"));
        assert!(rules.inherit_property("p", "div", "color"));
        assert!(rules.inherit_property("p", "div", "font-size"));
    }

    #[test]
    fn html_rules_cut_table_boundaries() {
        let rules = HtmlInheritanceRules;
        assert!(!rules.inherit_property("table", "body", "font-size"));
        assert!(rules.inherit_property("table", "body", "color"));
        assert!(!rules.inherit_property("tr", "table", "text-align"));
        assert!(rules.inherit_property("tr", "table", "font-family"));
    }
}
