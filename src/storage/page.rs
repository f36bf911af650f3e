pub mod heap_page;

pub use heap_page::HeapPage;

/// Stable identifier of one table, derived from its heap file's canonical
/// path. Two heap files over the same path yield the same id; distinct paths
/// yield distinct ids with high probability, but collisions are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u64);

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Addresses one page: a table plus a dense page number within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table: TableId,
    pub page_no: u32,
}

impl PageId {
    pub fn new(table: TableId, page_no: u32) -> Self {
        Self { table, page_no }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.page_no)
    }
}

/// Addresses one tuple: a page plus a slot number. Valid only while the
/// tuple remains at that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_equality() {
        let a = PageId::new(TableId(1), 2);
        let b = PageId::new(TableId(1), 2);
        let c = PageId::new(TableId(1), 3);
        let d = PageId::new(TableId(2), 2);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_record_id_display() {
        let rid = RecordId::new(PageId::new(TableId(0xab), 4), 7);
        assert_eq!(format!("{}", rid), "0xab:4#7");
    }
}
