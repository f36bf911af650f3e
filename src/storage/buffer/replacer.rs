use crate::storage::page::PageId;
use std::fmt::Debug;

/// Ordering oracle behind the buffer pool's replacement decision.
///
/// Tracks recency over resident page identities; never performs I/O itself.
pub trait Replacer: Send + Debug {
    /// Mark a page as most recently used, admitting it if unseen.
    fn touch(&mut self, page_id: PageId);

    /// Select and remove the page to evict. Returns None if none is tracked.
    fn victim(&mut self) -> Option<PageId>;

    /// Drop a page from the ordering (explicit eviction or discard).
    fn remove(&mut self, page_id: PageId);

    /// Number of pages currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
