use super::replacer::Replacer;
use crate::storage::page::PageId;
use std::collections::{HashMap, VecDeque};

/// Least-recently-used replacement order.
///
/// Recency order is total by construction: every admission or touch moves
/// the page to the back of the queue, so the front is always the unique
/// least recently used page.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Queue of resident pages, least recently used at the front.
    queue: VecDeque<PageId>,
    /// Map to track position in the queue for removal.
    index: HashMap<PageId, usize>,
}

impl LruReplacer {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            index: HashMap::new(),
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, &page_id) in self.queue.iter().enumerate() {
            self.index.insert(page_id, idx);
        }
    }
}

impl Replacer for LruReplacer {
    fn touch(&mut self, page_id: PageId) {
        if let Some(&idx) = self.index.get(&page_id) {
            self.queue.remove(idx);
        }
        self.queue.push_back(page_id);
        self.rebuild_index();
    }

    fn victim(&mut self) -> Option<PageId> {
        let page_id = self.queue.pop_front()?;
        self.index.remove(&page_id);
        self.rebuild_index();
        Some(page_id)
    }

    fn remove(&mut self, page_id: PageId) {
        if let Some(&idx) = self.index.get(&page_id) {
            self.queue.remove(idx);
            self.rebuild_index();
        }
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
