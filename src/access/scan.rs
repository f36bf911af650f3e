//! The pull-based tuple iteration contract consumed by query operators.

use crate::access::tuple::Tuple;
use crate::storage::error::StorageResult;

/// A lazy, restartable sequence of tuples.
///
/// Callers drive the iterator with `open` / `has_next` / `next` and may
/// restart it at any time with `rewind`. Calling `next` before `open`, after
/// `close`, or past the last tuple fails with
/// [`StorageError::NoSuchElement`](crate::storage::error::StorageError::NoSuchElement).
pub trait TupleIterator {
    /// Positions the iterator before the first tuple.
    fn open(&mut self) -> StorageResult<()>;

    /// Reports whether another tuple is available. False before `open`.
    fn has_next(&mut self) -> StorageResult<bool>;

    /// Returns the next tuple and advances.
    fn next(&mut self) -> StorageResult<Tuple>;

    /// Restarts from the beginning; equivalent to `close` then `open`.
    fn rewind(&mut self) -> StorageResult<()>;

    /// Releases the iterator's position. A later `rewind` or `open` may
    /// restart it.
    fn close(&mut self);
}
