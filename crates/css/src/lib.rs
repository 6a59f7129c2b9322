//! Selector matching, stylesheet scanning and the cascade that resolves CSS for tags.

mod attributes;
mod cascade;
mod declarations;
mod inheritance;
mod matching;
mod scanner;
mod selector;
mod shorthand;
mod stylesheet;
pub mod values;

// Re-exports so other crates can just use `css::...` nicely.
pub use attributes::attribute_declarations;
pub use cascade::StyleResolver;
pub use declarations::{Declaration, INHERIT, parse_declaration_block, parse_declarations};
pub use inheritance::{HtmlInheritanceRules, InheritAll, InheritanceRules};
pub use scanner::{CssFileProcessor, ScannerState, parse_css};
pub use selector::{
    AttributeOperator, Combinator, SPECIFICITY_ATTRIBUTE, SPECIFICITY_CLASS, SPECIFICITY_ID,
    SPECIFICITY_TAG, Selector, SelectorItem, parse_selector,
};
pub use shorthand::expand_shorthand;
pub use stylesheet::{CssFile, CssFiles, RuleEntry};
