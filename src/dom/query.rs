//! Selector queries over a [`Document`].

use super::{Document, NodeId};
use crate::selector::{Selector, Step};

impl Document {
    /// Every element selected by `selector`, in document order.
    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// First direct child of `anchor` matching `step`.
    pub fn find_child(&self, anchor: NodeId, step: &Step) -> Option<NodeId> {
        self.child_elements(anchor)
            .find(|child| self.element(*child).is_some_and(|e| step.matches(e)))
    }

    /// End of the first complete child path `anchor > steps[0] > steps[1] ...`.
    ///
    /// Paths are explored depth-first in document order, so the result is
    /// the first matching element in document order. Returns `None` for an
    /// empty `steps`.
    pub fn find_path(&self, anchor: NodeId, steps: &[Step]) -> Option<NodeId> {
        if steps.is_empty() {
            return None;
        }

        let mut stack = vec![(anchor, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth == steps.len() {
                return Some(node);
            }
            let step = &steps[depth];
            let matching: Vec<NodeId> = self
                .child_elements(node)
                .filter(|child| self.element(*child).is_some_and(|e| step.matches(e)))
                .collect();
            stack.extend(matching.into_iter().rev().map(|child| (child, depth + 1)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(concat!(
            "<r>",
            r#"<u id="1"><alt origin="mt"/><alt origin="mt"><t>second</t></alt></u>"#,
            r#"<u id="2"><t>main</t></u>"#,
            "</r>"
        ))
        .unwrap()
    }

    fn first(doc: &Document, selector: &str) -> NodeId {
        doc.select_all(&Selector::parse(selector).unwrap())[0]
    }

    #[test]
    fn test_select_all_in_document_order() {
        let doc = doc();
        let units = doc.select_all(&Selector::parse("u").unwrap());
        let ids: Vec<_> = units
            .iter()
            .map(|u| doc.element(*u).unwrap().attr("id").unwrap().into_owned())
            .collect();
        assert_eq!(ids, ["1", "2"]);

        let nested = doc.select_all(&Selector::parse("r t").unwrap());
        assert_eq!(nested.len(), 2);
        assert_eq!(doc.text(first(&doc, "u#2 > t")), "main");
    }

    #[test]
    fn test_find_child_takes_first() {
        let doc = doc();
        let unit = first(&doc, "u");
        let selector = Selector::parse(r#"alt[origin="mt"]"#).unwrap();
        let first = doc.find_child(unit, &selector.steps()[0]).unwrap();
        assert!(!doc.has_content(first));
    }

    #[test]
    fn test_find_path_searches_all_branches() {
        let doc = doc();
        let unit = first(&doc, "u");
        let selector = Selector::parse(r#"alt[origin="mt"] > t"#).unwrap();
        let found = doc.find_path(unit, selector.steps()).unwrap();
        assert_eq!(doc.text(found), "second");

        let missing = Selector::parse("alt > x").unwrap();
        assert_eq!(doc.find_path(unit, missing.steps()), None);
        assert_eq!(doc.find_path(unit, &[]), None);
    }

    #[test]
    fn test_find_path_is_child_only() {
        let doc = doc();
        let root = first(&doc, "r");
        let selector = Selector::parse("t").unwrap();
        assert_eq!(doc.find_path(root, selector.steps()), None);
    }
}
