//! Page access permission hints.

/// The access mode a transaction requests when fetching a page.
///
/// The buffer pool forwards this to interested parties but does not
/// enforce it; enforcement belongs to an external lock manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::ReadOnly => write!(f, "READ_ONLY"),
            Permission::ReadWrite => write!(f, "READ_WRITE"),
        }
    }
}
