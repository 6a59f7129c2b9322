//! Matching a selector chain against a tag and its surroundings in the tree.

use html::{TagId, TagTree};

use crate::selector::{Combinator, Selector, SelectorItem};

impl Selector {
    /// Whether this selector matches `id`, walking ancestors and preceding siblings as the
    /// combinators require.
    pub fn matches(&self, tree: &TagTree, id: TagId) -> bool {
        let compounds = self.compounds();
        match_compound(&compounds, compounds.len() - 1, tree, id)
    }
}

fn compound_matches(items: &[SelectorItem], tree: &TagTree, id: TagId) -> bool {
    let Some(tag) = tree.get(id) else {
        return false;
    };
    items.iter().all(|item| item.matches(tag))
}

fn match_compound(
    compounds: &[(Option<Combinator>, &[SelectorItem])],
    index: usize,
    tree: &TagTree,
    id: TagId,
) -> bool {
    let (combinator, items) = compounds[index];
    if !compound_matches(items, tree, id) {
        return false;
    }
    let Some(combinator) = combinator else {
        return true;
    };
    let left = index - 1;
    match combinator {
        Combinator::Child => tree
            .parent(id)
            .is_some_and(|parent| match_compound(compounds, left, tree, parent)),
        Combinator::Descendant => tree
            .ancestors(id)
            .any(|ancestor| match_compound(compounds, left, tree, ancestor)),
        Combinator::AdjacentSibling => tree
            .sibling(id, -1)
            .is_some_and(|sibling| match_compound(compounds, left, tree, sibling)),
        Combinator::GeneralSibling => (1..)
            .map_while(|back: isize| tree.sibling(id, -back))
            .any(|sibling| match_compound(compounds, left, tree, sibling)),
    }
}

#[cfg(test)]
mod tests {
    use crate::selector::parse_selector;
    use html::{TagId, TagTree, build_tag_tree};

    fn find(tree: &TagTree, name: &str, nth: usize) -> TagId {
        tree.roots()
            .into_iter()
            .flat_map(|root| tree.descendants(root))
            .filter(|id| tree[*id].name() == name)
            .nth(nth)
            .unwrap_or_else(|| panic!("no {name} #{nth}"))
    }

    fn matches(selector: &str, tree: &TagTree, id: TagId) -> bool {
        parse_selector(selector).unwrap().matches(tree, id)
    }

    #[test]
    fn descendant_and_child() {
        let tree = build_tag_tree("<div class=box><section><p>x</p></section></div>");
        let p = find(&tree, "p", 0);

        assert!(matches("div p", &tree, p));
        assert!(matches(".box p", &tree, p));
        assert!(matches("section > p", &tree, p));
        assert!(!matches("div > p", &tree, p));
        assert!(matches("div > section > p", &tree, p));
        assert!(!matches("span p", &tree, p));
    }

    #[test]
    fn sibling_combinators() {
        let tree = build_tag_tree("<ul><li class=a>1</li><li class=b>2</li><li class=c>3</li></ul>");
        let third = find(&tree, "li", 2);

        assert!(matches(".b + li", &tree, third));
        assert!(!matches(".a + li", &tree, third));
        assert!(matches(".a ~ li", &tree, third));
        assert!(matches("li ~ .c", &tree, third));
        assert!(!matches(".c ~ li", &tree, third));
    }

    #[test]
    fn descendant_backtracks_over_ancestors() {
        let tree = build_tag_tree("<div class=x><div><span><b>t</b></span></div></div>");
        let b = find(&tree, "b", 0);
        assert!(matches("div.x div span b", &tree, b));
        assert!(matches("div.x > div b", &tree, b));
        assert!(!matches("div.x > span b", &tree, b));
    }
}
