//! Multiplexers for rendering events raised by the document builder.
//!
//! The document builder owns layout, so these events originate outside the pipeline. A
//! forwarder lets several listeners observe them; extended events only reach listeners
//! that were registered with the matching capability.

use std::fmt;

use crate::config::PageSize;
use crate::element::Table;

/// Observer of table layout.
pub trait TableEvents: fmt::Debug {
    /// A table (or the part of it on the current page) was laid out.
    fn table_layout(&mut self, table: &Table, header_rows: usize, page: u32);
}

/// Observer of table layout that also wants to know about page splits.
pub trait SplitTableEvents: TableEvents {
    /// The table is about to be split over a page break.
    fn split_table(&mut self, table: &Table, page: u32);

    /// The split finished; `remaining_rows` moved to the next page.
    fn after_split_table(&mut self, _table: &Table, _remaining_rows: usize, _page: u32) {}
}

#[derive(Debug)]
enum TableListener {
    Layout(Box<dyn TableEvents>),
    Split(Box<dyn SplitTableEvents>),
}

/// Forwards table events to every registered listener in registration order.
#[derive(Debug, Default)]
pub struct TableEventForwarder {
    listeners: Vec<TableListener>,
}

impl TableEventForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: impl TableEvents + 'static) {
        self.listeners.push(TableListener::Layout(Box::new(listener)));
    }

    /// Register a listener that also receives split events.
    pub fn add_splitting(&mut self, listener: impl SplitTableEvents + 'static) {
        self.listeners.push(TableListener::Split(Box::new(listener)));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn split_listeners(&self) -> usize {
        self.listeners
            .iter()
            .filter(|l| matches!(l, TableListener::Split(_)))
            .count()
    }
}

impl TableEvents for TableEventForwarder {
    fn table_layout(&mut self, table: &Table, header_rows: usize, page: u32) {
        for listener in &mut self.listeners {
            match listener {
                TableListener::Layout(l) => l.table_layout(table, header_rows, page),
                TableListener::Split(l) => l.table_layout(table, header_rows, page),
            }
        }
    }
}

impl SplitTableEvents for TableEventForwarder {
    fn split_table(&mut self, table: &Table, page: u32) {
        for listener in &mut self.listeners {
            if let TableListener::Split(l) = listener {
                l.split_table(table, page);
            }
        }
    }

    fn after_split_table(&mut self, table: &Table, remaining_rows: usize, page: u32) {
        for listener in &mut self.listeners {
            if let TableListener::Split(l) = listener {
                l.after_split_table(table, remaining_rows, page);
            }
        }
    }
}

/// Observer of page and document lifecycle events. Every method defaults to doing nothing.
pub trait PageEvents: fmt::Debug {
    fn open_document(&mut self, _page_size: PageSize) {}
    fn start_page(&mut self, _page: u32) {}
    fn end_page(&mut self, _page: u32) {}
    fn close_document(&mut self, _pages: u32) {}
    /// A paragraph starts at vertical position `y` (points from the top).
    fn paragraph(&mut self, _page: u32, _y: f32) {}
    fn chapter(&mut self, _page: u32, _title: &str) {}
}

/// Forwards page events to every registered listener in registration order.
#[derive(Debug, Default)]
pub struct PageEventForwarder {
    listeners: Vec<Box<dyn PageEvents>>,
}

impl PageEventForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: impl PageEvents + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl PageEvents for PageEventForwarder {
    fn open_document(&mut self, page_size: PageSize) {
        self.listeners.iter_mut().for_each(|l| l.open_document(page_size));
    }

    fn start_page(&mut self, page: u32) {
        self.listeners.iter_mut().for_each(|l| l.start_page(page));
    }

    fn end_page(&mut self, page: u32) {
        self.listeners.iter_mut().for_each(|l| l.end_page(page));
    }

    fn close_document(&mut self, pages: u32) {
        self.listeners.iter_mut().for_each(|l| l.close_document(pages));
    }

    fn paragraph(&mut self, page: u32, y: f32) {
        self.listeners.iter_mut().for_each(|l| l.paragraph(page, y));
    }

    fn chapter(&mut self, page: u32, title: &str) {
        self.listeners.iter_mut().for_each(|l| l.chapter(page, title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl TableEvents for Recorder {
        fn table_layout(&mut self, _table: &Table, header_rows: usize, page: u32) {
            self.log
                .borrow_mut()
                .push(format!("{}:layout:{header_rows}:{page}", self.name));
        }
    }

    impl SplitTableEvents for Recorder {
        fn split_table(&mut self, _table: &Table, page: u32) {
            self.log.borrow_mut().push(format!("{}:split:{page}", self.name));
        }
    }

    impl PageEvents for Recorder {
        fn start_page(&mut self, page: u32) {
            self.log.borrow_mut().push(format!("{}:start:{page}", self.name));
        }

        fn chapter(&mut self, _page: u32, title: &str) {
            self.log.borrow_mut().push(format!("{}:chapter:{title}", self.name));
        }
    }

    #[test]
    fn split_events_reach_only_split_listeners() {
        let log = Log::default();
        let mut forwarder = TableEventForwarder::new();
        forwarder.add(Recorder { name: "a", log: Rc::clone(&log) });
        forwarder.add_splitting(Recorder { name: "b", log: Rc::clone(&log) });
        assert_eq!(forwarder.split_listeners(), 1);

        let table = Table::default();
        forwarder.table_layout(&table, 1, 2);
        forwarder.split_table(&table, 2);
        forwarder.after_split_table(&table, 3, 2);
        assert_eq!(
            *log.borrow(),
            vec!["a:layout:1:2", "b:layout:1:2", "b:split:2"]
        );
    }

    #[test]
    fn page_events_in_registration_order() {
        let log = Log::default();
        let mut forwarder = PageEventForwarder::new();
        forwarder.add(Recorder { name: "first", log: Rc::clone(&log) });
        forwarder.add(Recorder { name: "second", log: Rc::clone(&log) });

        forwarder.open_document(PageSize::A4);
        forwarder.start_page(1);
        forwarder.chapter(1, "Intro");
        forwarder.end_page(1);
        assert_eq!(
            *log.borrow(),
            vec![
                "first:start:1",
                "second:start:1",
                "first:chapter:Intro",
                "second:chapter:Intro"
            ]
        );
    }
}
