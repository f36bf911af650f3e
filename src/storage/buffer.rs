pub mod lru;
pub mod replacer;

use crate::storage::disk::HeapFile;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId, TableId};
use crate::transaction::{Permission, TransactionId};
use dashmap::DashMap;
use log::{debug, trace};
use lru::LruReplacer;
use parking_lot::{Mutex, RwLock};
use replacer::Replacer;
use std::collections::HashMap;
use std::sync::Arc;

/// A resident page. The pool hands out one shared handle per page identity;
/// callers lock it for reading or writing according to the permission they
/// requested.
pub type SharedPage = Arc<RwLock<HeapPage>>;

/// Process-wide, capacity-bounded page cache.
///
/// The pool is the single mediator between callers and page storage: every
/// page access goes through [`get_page`](BufferPool::get_page), which serves
/// resident pages and loads missing ones from their owning heap file,
/// evicting per the replacement policy when full. Cloning the pool clones a
/// handle to the same shared state.
///
/// The identity map and the recency order are mutated together under one
/// lock, so concurrent misses for the same identity never double-load and
/// eviction never races with a fetch re-admitting the victim.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    files: DashMap<TableId, Arc<HeapFile>>,
    cache: Mutex<CacheState>,
    capacity: usize,
}

struct CacheState {
    pages: HashMap<PageId, SharedPage>,
    replacer: Box<dyn Replacer>,
}

impl BufferPool {
    /// Default number of resident pages.
    pub const DEFAULT_CAPACITY: usize = 50;

    /// Creates a pool bounded to `capacity` resident pages, with LRU
    /// replacement.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_replacer(capacity, Box::new(LruReplacer::new()))
    }

    /// Creates a pool with an explicit replacement policy.
    pub fn with_replacer(capacity: usize, replacer: Box<dyn Replacer>) -> Self {
        assert!(capacity > 0, "buffer pool capacity must be at least 1");
        Self {
            inner: Arc::new(BufferPoolInner {
                files: DashMap::new(),
                cache: Mutex::new(CacheState {
                    pages: HashMap::with_capacity(capacity),
                    replacer,
                }),
                capacity,
            }),
        }
    }

    /// Registers a heap file as the owner of its table's pages. Cache misses
    /// for that table load through it; flushes and evictions write through
    /// it.
    pub fn register_file(&self, file: Arc<HeapFile>) -> TableId {
        let table_id = file.table_id();
        self.inner.files.insert(table_id, file);
        table_id
    }

    fn file(&self, table_id: TableId) -> StorageResult<Arc<HeapFile>> {
        self.inner
            .files
            .get(&table_id)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::UnknownTable(table_id))
    }

    /// Returns the resident page for `page_id`, loading it from its owning
    /// heap file on a miss and evicting first if the pool is full. Fails
    /// with `CacheFull` when no resident page can be evicted because every
    /// one is locked by a caller.
    ///
    /// `perm` is a concurrency-control hint for an external lock manager;
    /// the pool itself does not enforce it.
    pub fn get_page(
        &self,
        txn: TransactionId,
        page_id: PageId,
        perm: Permission,
    ) -> StorageResult<SharedPage> {
        let mut cache = self.inner.cache.lock();

        if let Some(page) = cache.pages.get(&page_id).cloned() {
            cache.replacer.touch(page_id);
            trace!("{} hit on page {} ({})", txn, page_id, perm);
            return Ok(page);
        }

        trace!("{} miss on page {} ({})", txn, page_id, perm);
        if cache.pages.len() >= self.inner.capacity {
            self.evict_locked(&mut cache).map_err(|e| match e {
                StorageError::NoEvictable => StorageError::CacheFull,
                e => e,
            })?;
        }

        let file = self.file(page_id.table)?;
        let page = Arc::new(RwLock::new(file.read_page(page_id)?));
        cache.pages.insert(page_id, page.clone());
        cache.replacer.touch(page_id);
        Ok(page)
    }

    /// Writes a resident dirty page back to its heap file and clears its
    /// dirty flag. A no-op if the page is clean or not resident.
    pub fn flush_page(&self, page_id: PageId) -> StorageResult<()> {
        let page = {
            let cache = self.inner.cache.lock();
            match cache.pages.get(&page_id).cloned() {
                Some(page) => page,
                None => return Ok(()),
            }
        };
        self.flush_shared(page_id, &page)
    }

    /// Flushes every resident dirty page.
    pub fn flush_all_pages(&self) -> StorageResult<()> {
        let resident: Vec<(PageId, SharedPage)> = {
            let cache = self.inner.cache.lock();
            cache
                .pages
                .iter()
                .map(|(id, page)| (*id, page.clone()))
                .collect()
        };
        for (page_id, page) in resident {
            self.flush_shared(page_id, &page)?;
        }
        Ok(())
    }

    fn flush_shared(&self, page_id: PageId, page: &SharedPage) -> StorageResult<()> {
        let mut guard = page.write();
        if guard.is_dirty() {
            let file = self.file(page_id.table)?;
            file.write_page(&guard)?;
            guard.clear_dirty();
            debug!("flushed page {}", page_id);
        }
        Ok(())
    }

    /// Evicts one page per the replacement policy, flushing it first if
    /// dirty. Fails with `NoEvictable` if nothing is resident or every
    /// resident page is currently locked by a caller.
    pub fn evict_page(&self) -> StorageResult<()> {
        let mut cache = self.inner.cache.lock();
        self.evict_locked(&mut cache)
    }

    fn evict_locked(&self, cache: &mut CacheState) -> StorageResult<()> {
        // Candidates whose page lock a caller currently holds are skipped,
        // not evicted.
        let mut busy = Vec::new();
        let outcome = loop {
            let Some(victim) = cache.replacer.victim() else {
                break Err(StorageError::NoEvictable);
            };
            let Some(page) = cache.pages.get(&victim).cloned() else {
                break Ok(victim);
            };

            // Never wait on a page lock here: blocking under the cache
            // mutex would wedge every other fetch behind a caller's guard.
            let Some(mut guard) = page.try_write() else {
                busy.push(victim);
                continue;
            };

            if guard.is_dirty() {
                match self.file(victim.table).and_then(|f| f.write_page(&guard)) {
                    Ok(()) => guard.clear_dirty(),
                    Err(e) => {
                        // The victim stays resident with its recency entry.
                        cache.replacer.touch(victim);
                        break Err(e);
                    }
                }
            }
            break Ok(victim);
        };

        // A skipped page is in active use; it stays resident and counts as
        // recently used.
        for page_id in busy {
            cache.replacer.touch(page_id);
        }

        let victim = outcome?;
        cache.pages.remove(&victim);
        debug!("evicted page {}", victim);
        Ok(())
    }

    /// Drops a resident page without flushing it, abandoning any in-memory
    /// modifications. Used when a transaction's writes must not reach disk.
    pub fn discard_page(&self, page_id: PageId) {
        let mut cache = self.inner.cache.lock();
        cache.pages.remove(&page_id);
        cache.replacer.remove(page_id);
        debug!("discarded page {}", page_id);
    }

    /// Number of pages currently resident.
    pub fn resident_count(&self) -> usize {
        self.inner.cache.lock().pages.len()
    }

    /// Whether `page_id` is currently resident.
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.inner.cache.lock().pages.contains_key(&page_id)
    }
}
