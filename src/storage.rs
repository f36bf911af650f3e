//! Storage layer implementation for heapdb.
//!
//! This module provides the foundation for persistent data storage using a
//! page-based architecture. Key components:
//!
//! - **HeapPage**: Fixed-size (4KB) slotted pages, the basic unit of I/O
//! - **HeapFile**: One table's pages in a single flat file
//! - **BufferPool**: Capacity-bounded in-memory page cache with LRU eviction,
//!   the single path through which any caller touches a page
//!
//! There is no durability beyond direct page writes: a dirty page reaches
//! disk when it is flushed or evicted, and never before.

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::BufferPool;
pub use disk::{HeapFile, HeapFileIterator, PAGE_SIZE};
pub use error::{StorageError, StorageResult};
pub use page::{HeapPage, PageId, RecordId, TableId};
