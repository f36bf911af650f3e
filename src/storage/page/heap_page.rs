use crate::access::tuple::{Tuple, TupleDesc};
use crate::access::value::Field;
use crate::storage::disk::PAGE_SIZE;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, RecordId};
use crate::transaction::TransactionId;
use std::io::Cursor;
use std::sync::Arc;

/// One fixed-size disk block in memory.
///
/// Layout: a bit-per-slot occupancy map (rounded up to a byte boundary)
/// followed by a fixed-width slot array. Slot width is the schema's total
/// field width, so slot count is `⌊PAGE_SIZE·8 / (slot_bytes·8 + 1)⌋`: each
/// slot costs its payload bits plus one header bit. Unoccupied slots
/// serialize as all-zero bytes, as do absent fields of occupied tuples.
#[derive(Debug)]
pub struct HeapPage {
    id: PageId,
    desc: Arc<TupleDesc>,
    slots: Vec<Option<Tuple>>,
    dirty: bool,
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Number of tuple slots a page holds under the given schema.
    pub fn slot_count(desc: &TupleDesc) -> usize {
        (PAGE_SIZE * 8) / (desc.byte_size() * 8 + 1)
    }

    /// Size of the occupancy bitmap in bytes.
    pub fn header_size(desc: &TupleDesc) -> usize {
        Self::slot_count(desc).div_ceil(8)
    }

    /// Creates a fresh page with every slot empty.
    pub fn empty(id: PageId, desc: Arc<TupleDesc>) -> Self {
        let slots = vec![None; Self::slot_count(&desc)];
        Self {
            id,
            desc,
            slots,
            dirty: false,
            dirtier: None,
        }
    }

    /// Deserializes a page from exactly `PAGE_SIZE` bytes.
    pub fn from_bytes(id: PageId, desc: Arc<TupleDesc>, bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(StorageError::CorruptPage {
                page_id: id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, bytes.len()),
            });
        }

        let slot_count = Self::slot_count(&desc);
        let header_size = Self::header_size(&desc);
        let slot_size = desc.byte_size();
        let header = &bytes[..header_size];

        let mut slots = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            if header[slot / 8] & (1 << (slot % 8)) == 0 {
                slots.push(None);
                continue;
            }

            let offset = header_size + slot * slot_size;
            let mut cursor = Cursor::new(&bytes[offset..offset + slot_size]);
            let mut fields = Vec::with_capacity(desc.len());
            for def in desc.fields() {
                let field = Field::read_from(def.ty, &mut cursor).map_err(|e| {
                    StorageError::CorruptPage {
                        page_id: id,
                        reason: format!("slot {}: {}", slot, e),
                    }
                })?;
                fields.push(field);
            }
            let mut tuple = Tuple::from_fields(desc.clone(), fields);
            tuple.set_record_id(Some(RecordId::new(id, slot as u16)));
            slots.push(Some(tuple));
        }

        Ok(Self {
            id,
            desc,
            slots,
            dirty: false,
            dirtier: None,
        })
    }

    /// Serializes this page to exactly `PAGE_SIZE` bytes, the inverse of
    /// `from_bytes`.
    pub fn to_bytes(&self) -> StorageResult<Vec<u8>> {
        let header_size = Self::header_size(&self.desc);
        let slot_size = self.desc.byte_size();
        let mut bytes = vec![0u8; PAGE_SIZE];

        for (slot, entry) in self.slots.iter().enumerate() {
            let tuple = match entry {
                Some(tuple) => tuple,
                None => continue,
            };
            bytes[slot / 8] |= 1 << (slot % 8);

            let offset = header_size + slot * slot_size;
            let mut cursor = Cursor::new(&mut bytes[offset..offset + slot_size]);
            for (i, def) in self.desc.fields().iter().enumerate() {
                match tuple.field(i) {
                    Some(value) => value.write_to(&mut cursor)?,
                    None => {
                        // Absent fields occupy their width as zeros.
                        let pos = cursor.position() + def.ty.byte_size() as u64;
                        cursor.set_position(pos);
                    }
                }
            }
        }

        Ok(bytes)
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Places a tuple into the first empty slot in ascending order, setting
    /// its record identity and marking the page dirty.
    pub fn insert(&mut self, mut tuple: Tuple) -> StorageResult<RecordId> {
        if tuple.desc() != &self.desc {
            return Err(StorageError::SchemaMismatch);
        }

        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(StorageError::PageFull(self.id))?;

        let rid = RecordId::new(self.id, slot as u16);
        tuple.set_record_id(Some(rid));
        self.slots[slot] = Some(tuple);
        self.dirty = true;
        Ok(rid)
    }

    /// Clears the slot named by the tuple's record identity and marks the
    /// page dirty.
    pub fn delete(&mut self, tuple: &Tuple) -> StorageResult<()> {
        let rid = tuple.record_id().ok_or(StorageError::TupleNotFound)?;
        if rid.page_id != self.id {
            return Err(StorageError::TupleNotOnPage(rid));
        }

        let slot = rid.slot as usize;
        if slot >= self.slots.len() || self.slots[slot].is_none() {
            return Err(StorageError::TupleNotOnPage(rid));
        }

        self.slots[slot] = None;
        self.dirty = true;
        Ok(())
    }

    pub fn empty_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Occupied tuples in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The transaction that last dirtied this page, if any was recorded.
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    pub fn mark_dirty(&mut self, txn: TransactionId) {
        self.dirty = true;
        self.dirtier = Some(txn);
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
        self.dirtier = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::tuple::FieldDef;
    use crate::access::value::DataType;
    use crate::storage::page::TableId;

    fn int_desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(vec![FieldDef::new("v", DataType::Int)]))
    }

    fn pid() -> PageId {
        PageId::new(TableId(1), 0)
    }

    fn int_tuple(desc: &Arc<TupleDesc>, v: i32) -> Tuple {
        Tuple::from_fields(desc.clone(), vec![Field::Int(v)])
    }

    #[test]
    fn test_slot_count_formula() {
        // One 4-byte int: 33 bits per slot.
        assert_eq!(HeapPage::slot_count(&int_desc()), (PAGE_SIZE * 8) / 33);

        // 20-byte rows: 161 bits per slot.
        let wide = TupleDesc::new(vec![
            FieldDef::new("a", DataType::Int),
            FieldDef::new("b", DataType::Int),
            FieldDef::new("c", DataType::Int),
            FieldDef::new("d", DataType::Int),
            FieldDef::new("e", DataType::Int),
        ]);
        assert_eq!(wide.byte_size(), 20);
        assert_eq!(HeapPage::slot_count(&wide), (PAGE_SIZE * 8) / 161);
        assert_eq!(HeapPage::slot_count(&wide), 203);
    }

    #[test]
    fn test_empty_page() {
        let desc = int_desc();
        let page = HeapPage::empty(pid(), desc.clone());
        assert_eq!(page.empty_slot_count(), HeapPage::slot_count(&desc));
        assert_eq!(page.iter().count(), 0);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_insert_sets_record_id_and_dirty() {
        let desc = int_desc();
        let mut page = HeapPage::empty(pid(), desc.clone());

        let rid = page.insert(int_tuple(&desc, 42)).unwrap();
        assert_eq!(rid, RecordId::new(pid(), 0));
        assert!(page.is_dirty());

        let rid = page.insert(int_tuple(&desc, 43)).unwrap();
        assert_eq!(rid.slot, 1);
    }

    #[test]
    fn test_insert_until_full() {
        let desc = int_desc();
        let capacity = HeapPage::slot_count(&desc);
        let mut page = HeapPage::empty(pid(), desc.clone());

        for i in 0..capacity {
            page.insert(int_tuple(&desc, i as i32)).unwrap();
        }
        assert_eq!(page.empty_slot_count(), 0);

        match page.insert(int_tuple(&desc, -1)) {
            Err(StorageError::PageFull(id)) => assert_eq!(id, pid()),
            other => panic!("expected PageFull, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let desc = int_desc();
        let mut page = HeapPage::empty(pid(), desc);

        let other = Arc::new(TupleDesc::new(vec![FieldDef::new("s", DataType::Str)]));
        let tuple = Tuple::from_fields(other, vec![Field::Str("x".to_string())]);
        assert!(matches!(
            page.insert(tuple),
            Err(StorageError::SchemaMismatch)
        ));
    }

    #[test]
    fn test_delete_reuses_first_slot() {
        let desc = int_desc();
        let mut page = HeapPage::empty(pid(), desc.clone());

        page.insert(int_tuple(&desc, 1)).unwrap();
        page.insert(int_tuple(&desc, 2)).unwrap();

        let mut first = int_tuple(&desc, 1);
        first.set_record_id(Some(RecordId::new(pid(), 0)));
        page.delete(&first).unwrap();
        assert_eq!(page.empty_slot_count(), HeapPage::slot_count(&desc) - 1);

        // Deleting again fails: the slot is empty now.
        assert!(matches!(
            page.delete(&first),
            Err(StorageError::TupleNotOnPage(_))
        ));

        // The freed slot is the first empty one.
        let rid = page.insert(int_tuple(&desc, 3)).unwrap();
        assert_eq!(rid.slot, 0);
    }

    #[test]
    fn test_delete_wrong_page() {
        let desc = int_desc();
        let mut page = HeapPage::empty(pid(), desc.clone());
        page.insert(int_tuple(&desc, 1)).unwrap();

        let mut stray = int_tuple(&desc, 1);
        stray.set_record_id(Some(RecordId::new(PageId::new(TableId(1), 9), 0)));
        assert!(matches!(
            page.delete(&stray),
            Err(StorageError::TupleNotOnPage(_))
        ));

        let unplaced = int_tuple(&desc, 1);
        assert!(matches!(
            page.delete(&unplaced),
            Err(StorageError::TupleNotFound)
        ));
    }

    #[test]
    fn test_round_trip() {
        let desc = Arc::new(TupleDesc::new(vec![
            FieldDef::new("n", DataType::Int),
            FieldDef::new("s", DataType::Str),
        ]));
        let mut page = HeapPage::empty(pid(), desc.clone());

        for i in 0..10 {
            let tuple = Tuple::from_fields(
                desc.clone(),
                vec![Field::Int(i), Field::Str(format!("row{}", i))],
            );
            page.insert(tuple).unwrap();
        }
        // Leave a hole so the bitmap is not a prefix of ones.
        let mut hole = Tuple::from_fields(
            desc.clone(),
            vec![Field::Int(4), Field::Str("row4".to_string())],
        );
        hole.set_record_id(Some(RecordId::new(pid(), 4)));
        page.delete(&hole).unwrap();

        let bytes = page.to_bytes().unwrap();
        assert_eq!(bytes.len(), PAGE_SIZE);

        let restored = HeapPage::from_bytes(pid(), desc.clone(), &bytes).unwrap();
        assert_eq!(restored.id(), page.id());
        assert_eq!(restored.empty_slot_count(), page.empty_slot_count());
        let original: Vec<_> = page.iter().collect();
        let roundtripped: Vec<_> = restored.iter().collect();
        assert_eq!(original, roundtripped);
        for (a, b) in original.iter().zip(roundtripped.iter()) {
            assert_eq!(a.record_id(), b.record_id());
        }
        assert!(!restored.is_dirty());
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let desc = int_desc();
        let result = HeapPage::from_bytes(pid(), desc, &[0u8; 100]);
        assert!(matches!(result, Err(StorageError::CorruptPage { .. })));
    }

    #[test]
    fn test_all_zero_page_is_empty() {
        let desc = int_desc();
        let page = HeapPage::from_bytes(pid(), desc.clone(), &vec![0u8; PAGE_SIZE]).unwrap();
        assert_eq!(page.empty_slot_count(), HeapPage::slot_count(&desc));
    }

    #[test]
    fn test_mark_and_clear_dirty() {
        let desc = int_desc();
        let mut page = HeapPage::empty(pid(), desc);
        let txn = TransactionId::new(9);

        page.mark_dirty(txn);
        assert!(page.is_dirty());
        assert_eq!(page.dirtier(), Some(txn));

        page.clear_dirty();
        assert!(!page.is_dirty());
        assert_eq!(page.dirtier(), None);
    }
}
