//! Storage layer error types.

use crate::storage::page::{PageId, RecordId, TableId};
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("corrupt page {page_id}: {reason}")]
    CorruptPage { page_id: PageId, reason: String },

    #[error("page {0} has no empty slot")]
    PageFull(PageId),

    #[error("tuple {0} is not on this page")]
    TupleNotOnPage(RecordId),

    #[error("tuple is not in this table")]
    TupleNotFound,

    #[error("page {0} does not exist")]
    PageNotFound(PageId),

    #[error("buffer pool is full and no page could be evicted")]
    CacheFull,

    #[error("no page available for eviction")]
    NoEvictable,

    #[error("no heap file registered for table {0}")]
    UnknownTable(TableId),

    #[error("iterator is not open or has no more tuples")]
    NoSuchElement,

    #[error("tuple schema does not match table schema")]
    SchemaMismatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
