use std::collections::VecDeque;

use crate::element::Element;

/// Item exchanged between stages.
#[derive(Clone, Debug, PartialEq)]
pub enum Writable {
    Element(Element),
    Elements(Vec<Element>),
}

impl Writable {
    pub fn into_elements(self) -> Vec<Element> {
        match self {
            Writable::Element(e) => vec![e],
            Writable::Elements(list) => list,
        }
    }
}

/// FIFO queue of writables filled by one stage and drained by the next. A fresh queue is
/// used for every event.
#[derive(Clone, Debug, Default)]
pub struct ProcessObject {
    queue: VecDeque<Writable>,
}

impl ProcessObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, writable: Writable) {
        self.queue.push_back(writable);
    }

    /// Queue `elements` as one writable. Nothing is queued for an empty list.
    pub fn add_elements(&mut self, mut elements: Vec<Element>) {
        match elements.len() {
            0 => {}
            1 => self.add(Writable::Element(elements.remove(0))),
            _ => self.add(Writable::Elements(elements)),
        }
    }

    pub fn poll(&mut self) -> Option<Writable> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Writable> + '_ {
        self.queue.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_and_grouping() {
        let mut po = ProcessObject::new();
        po.add_elements(Vec::new());
        assert!(po.is_empty());
        po.add_elements(vec![Element::LineBreak]);
        po.add_elements(vec![Element::HorizontalRule, Element::LineBreak]);
        assert_eq!(po.len(), 2);
        assert_eq!(po.poll(), Some(Writable::Element(Element::LineBreak)));
        let rest: Vec<Element> = po.drain().flat_map(Writable::into_elements).collect();
        assert_eq!(rest, vec![Element::HorizontalRule, Element::LineBreak]);
        assert!(po.poll().is_none());
    }
}
