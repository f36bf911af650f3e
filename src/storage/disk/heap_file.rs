use crate::access::scan::TupleIterator;
use crate::access::tuple::{Tuple, TupleDesc};
use crate::storage::buffer::BufferPool;
use crate::storage::disk::PAGE_SIZE;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId, TableId};
use crate::transaction::{Permission, TransactionId};
use log::debug;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One table's on-disk pages: a flat sequence of fixed-size blocks in a
/// single file, rows placed in any free slot.
///
/// The file mutex serializes seeks, exact-block reads and writes, and page
/// allocation, so two concurrent "no room, grow the file" paths cannot
/// assign the same page number.
pub struct HeapFile {
    file: Mutex<File>,
    desc: Arc<TupleDesc>,
    table_id: TableId,
    path: PathBuf,
}

impl HeapFile {
    /// Creates a new, empty heap file, truncating any existing file at
    /// `path`.
    pub fn create(path: &Path, desc: Arc<TupleDesc>) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Self::from_file(file, path, desc)
    }

    /// Opens a heap file, creating it if absent.
    pub fn open(path: &Path, desc: Arc<TupleDesc>) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Self::from_file(file, path, desc)
    }

    fn from_file(file: File, path: &Path, desc: Arc<TupleDesc>) -> StorageResult<Self> {
        let path = path.canonicalize()?;
        let table_id = Self::derive_table_id(&path);
        Ok(Self {
            file: Mutex::new(file),
            desc,
            table_id,
            path,
        })
    }

    /// Hashes a canonical path into a table identifier. Deterministic for a
    /// given path, so every heap file over the same file agrees on the id;
    /// distinct paths collide only with hash probability.
    fn derive_table_id(canonical: &Path) -> TableId {
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        TableId(hasher.finish())
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages currently in the file, recomputed from the file
    /// length so concurrent growth is observed.
    pub fn page_count(&self) -> StorageResult<u32> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Reads and deserializes one page. Fails with `PageNotFound` if the
    /// page number is outside `0..page_count()` or the table does not match.
    pub fn read_page(&self, page_id: PageId) -> StorageResult<HeapPage> {
        if page_id.table != self.table_id {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut buf = vec![0u8; PAGE_SIZE];
        {
            let mut file = self.file.lock();
            let len = file.metadata()?.len();
            let offset = page_id.page_no as u64 * PAGE_SIZE as u64;
            if offset + PAGE_SIZE as u64 > len {
                return Err(StorageError::PageNotFound(page_id));
            }
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
        }

        HeapPage::from_bytes(page_id, self.desc.clone(), &buf)
    }

    /// Serializes and writes one page at its offset. Writing the page number
    /// equal to the current page count extends the file by one block; any
    /// larger number fails with `PageNotFound`.
    pub fn write_page(&self, page: &HeapPage) -> StorageResult<()> {
        let page_id = page.id();
        if page_id.table != self.table_id {
            return Err(StorageError::PageNotFound(page_id));
        }

        let bytes = page.to_bytes()?;
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_count = len / PAGE_SIZE as u64;
        if page_id.page_no as u64 > page_count {
            return Err(StorageError::PageNotFound(page_id));
        }

        file.seek(SeekFrom::Start(page_id.page_no as u64 * PAGE_SIZE as u64))?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(())
    }

    /// Appends one all-zero page and returns its identity. The file mutex is
    /// held across the length check and the write, so allocation is atomic.
    fn append_empty_page(&self) -> StorageResult<PageId> {
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_no = (len / PAGE_SIZE as u64) as u32;

        file.seek(SeekFrom::Start(len))?;
        file.write_all(&vec![0u8; PAGE_SIZE])?;
        file.sync_all()?;

        let page_id = PageId::new(self.table_id, page_no);
        debug!("allocated page {}", page_id);
        Ok(page_id)
    }

    /// Inserts a tuple into the first page with a free slot, growing the
    /// file by one page if every existing page is full. Every page is
    /// acquired through the cache. Returns the pages mutated.
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        pool: &BufferPool,
        tuple: Tuple,
    ) -> StorageResult<Vec<PageId>> {
        if tuple.desc() != &self.desc {
            return Err(StorageError::SchemaMismatch);
        }

        // Existing pages are probed under write permission, which serializes
        // inserts across the whole file.
        for page_no in 0..self.page_count()? {
            let page_id = PageId::new(self.table_id, page_no);
            let page = pool.get_page(txn, page_id, Permission::ReadWrite)?;
            let mut guard = page.write();
            if guard.empty_slot_count() > 0 {
                guard.insert(tuple)?;
                guard.mark_dirty(txn);
                return Ok(vec![page_id]);
            }
        }

        // All pages full. The empty page reaches disk before the fetch, so
        // the cache's miss-triggered load finds it.
        let page_id = self.append_empty_page()?;
        let page = pool.get_page(txn, page_id, Permission::ReadWrite)?;
        let mut guard = page.write();
        guard.insert(tuple)?;
        guard.mark_dirty(txn);
        Ok(vec![page_id])
    }

    /// Deletes a tuple from the page named by its record identity, acquired
    /// through the cache. Returns the pages mutated.
    pub fn delete_tuple(
        &self,
        txn: TransactionId,
        pool: &BufferPool,
        tuple: &Tuple,
    ) -> StorageResult<Vec<PageId>> {
        let rid = tuple.record_id().ok_or(StorageError::TupleNotFound)?;
        if rid.page_id.table != self.table_id {
            return Err(StorageError::TupleNotFound);
        }

        let page = pool.get_page(txn, rid.page_id, Permission::ReadWrite)?;
        let mut guard = page.write();
        guard.delete(tuple)?;
        guard.mark_dirty(txn);
        Ok(vec![rid.page_id])
    }

    /// A lazy, restartable scan of all tuples in ascending (page, slot)
    /// order, reading every page through the cache with read-only
    /// permission.
    pub fn iterator(self: &Arc<Self>, txn: TransactionId, pool: &BufferPool) -> HeapFileIterator {
        HeapFileIterator {
            file: self.clone(),
            pool: pool.clone(),
            txn,
            state: ScanState::Closed,
        }
    }
}

impl std::fmt::Debug for HeapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("table_id", &self.table_id)
            .field("path", &self.path)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Closed,
    OnPage { page_no: u32, slot: u16 },
    Exhausted,
}

/// Cursor over one heap file's tuples.
///
/// The scan position is an explicit state machine: `Closed` before `open`
/// and after `close`, `OnPage` while positioned at a candidate slot, and
/// `Exhausted` after the last page's last tuple. Pages are re-fetched from
/// the cache on every step, so the iterator holds no page state of its own.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: BufferPool,
    txn: TransactionId,
    state: ScanState,
}

impl HeapFileIterator {
    /// Finds the next occupied slot at or after the current position,
    /// advancing across page boundaries.
    fn advance_to_occupied(&mut self) -> StorageResult<Option<(u32, u16)>> {
        loop {
            let (page_no, slot) = match self.state {
                ScanState::Closed | ScanState::Exhausted => return Ok(None),
                ScanState::OnPage { page_no, slot } => (page_no, slot),
            };

            let page_id = PageId::new(self.file.table_id(), page_no);
            let page = self.pool.get_page(self.txn, page_id, Permission::ReadOnly)?;
            let found = page
                .read()
                .iter()
                .filter_map(|t| t.record_id())
                .map(|rid| rid.slot)
                .find(|&s| s >= slot);

            if let Some(s) = found {
                self.state = ScanState::OnPage { page_no, slot: s };
                return Ok(Some((page_no, s)));
            }

            if page_no + 1 < self.file.page_count()? {
                self.state = ScanState::OnPage {
                    page_no: page_no + 1,
                    slot: 0,
                };
            } else {
                self.state = ScanState::Exhausted;
                return Ok(None);
            }
        }
    }
}

impl TupleIterator for HeapFileIterator {
    fn open(&mut self) -> StorageResult<()> {
        self.state = if self.file.page_count()? == 0 {
            ScanState::Exhausted
        } else {
            ScanState::OnPage { page_no: 0, slot: 0 }
        };
        Ok(())
    }

    fn has_next(&mut self) -> StorageResult<bool> {
        Ok(self.advance_to_occupied()?.is_some())
    }

    fn next(&mut self) -> StorageResult<Tuple> {
        let (page_no, slot) = self
            .advance_to_occupied()?
            .ok_or(StorageError::NoSuchElement)?;

        let page_id = PageId::new(self.file.table_id(), page_no);
        let page = self.pool.get_page(self.txn, page_id, Permission::ReadOnly)?;
        let tuple = page
            .read()
            .iter()
            .find(|t| t.record_id().map_or(false, |rid| rid.slot == slot))
            .cloned()
            .ok_or(StorageError::NoSuchElement)?;

        self.state = ScanState::OnPage {
            page_no,
            slot: slot + 1,
        };
        Ok(tuple)
    }

    fn rewind(&mut self) -> StorageResult<()> {
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.state = ScanState::Closed;
    }
}
