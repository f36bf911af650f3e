pub mod heap_file;

pub use heap_file::{HeapFile, HeapFileIterator};

/// Size of one on-disk page in bytes. Block *i* of a heap file lives at byte
/// offset `i * PAGE_SIZE`; there is no file-level header.
pub const PAGE_SIZE: usize = 4096;
