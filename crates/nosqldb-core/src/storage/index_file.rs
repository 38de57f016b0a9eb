//! The fixed-width index file: one `INDEX_ENTRY_SIZE`-byte slot per id ever
//! written, in write order. Slots are never moved; deletions tombstone a
//! slot in place rather than shrinking the file (spec §4.2).

use crate::error::Result;
use crate::storage::format::{
    decode_index_slot, encode_index_slot, encode_tombstone, INDEX_ENTRY_SIZE,
};
use crate::storage::index_table::{IndexRecord, IndexTable};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Handle to a collection's `index` file.
#[derive(Debug)]
pub struct IndexFile {
    file: File,
}

impl IndexFile {
    /// Opens (creating if absent) the index file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Replays every slot in the file into a fresh `IndexTable`.
    ///
    /// A tombstoned slot simply contributes nothing. The last slot written
    /// for a given id wins, so a rewritten slot correctly supersedes an
    /// earlier one at the same offset (rewrites never change the offset, but
    /// this keeps replay correct if that ever changes).
    pub fn load(&mut self) -> Result<IndexTable> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut table = IndexTable::new();
        let mut slot_offset: i64 = 0;
        let mut buf = vec![0u8; INDEX_ENTRY_SIZE];
        loop {
            match self.file.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            if let Some(slot) = decode_index_slot(&buf)? {
                table.insert(
                    slot.id,
                    IndexRecord {
                        data_offset: slot.data_offset,
                        size: slot.size,
                        slot_offset,
                    },
                );
            } else {
                // A tombstone slot may also be a never-written id whose
                // rewrite replaced an earlier occupant; either way there is
                // nothing live to index at this offset.
            }
            slot_offset += INDEX_ENTRY_SIZE as i64;
        }
        Ok(table)
    }

    /// Appends a brand-new slot and returns its offset.
    pub fn append(&mut self, id: &str, data_offset: i64, size: usize) -> Result<i64> {
        let slot_offset = self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&encode_index_slot(id, data_offset, size))?;
        self.file.sync_data()?;
        Ok(slot_offset as i64)
    }

    /// Overwrites an existing slot in place, e.g. after an update rewrites a
    /// record to a new data-file location.
    pub fn rewrite(&mut self, slot_offset: i64, id: &str, data_offset: i64, size: usize) -> Result<()> {
        self.file.seek(SeekFrom::Start(slot_offset as u64))?;
        self.file
            .write_all(&encode_index_slot(id, data_offset, size))?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Blanks a slot to all-NUL, marking it deleted.
    pub fn tombstone(&mut self, slot_offset: i64) -> Result<()> {
        self.file.seek(SeekFrom::Start(slot_offset as u64))?;
        self.file.write_all(&encode_tombstone())?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_on_empty_file_is_empty_table() {
        let dir = tempdir().unwrap();
        let mut index = IndexFile::open(&dir.path().join("index")).unwrap();
        assert!(index.load().unwrap().is_empty());
    }

    #[test]
    fn append_then_load_recovers_the_slot() {
        let dir = tempdir().unwrap();
        let mut index = IndexFile::open(&dir.path().join("index")).unwrap();
        let id = "a".repeat(32);
        let slot_offset = index.append(&id, 0, 13).unwrap();
        assert_eq!(slot_offset, 0);

        let table = index.load().unwrap();
        let record = table.get(&id).unwrap();
        assert_eq!(record.data_offset, 0);
        assert_eq!(record.size, 13);
        assert_eq!(record.slot_offset, 0);
    }

    #[test]
    fn tombstoned_slot_is_absent_on_reload() {
        let dir = tempdir().unwrap();
        let mut index = IndexFile::open(&dir.path().join("index")).unwrap();
        let id = "b".repeat(32);
        let slot_offset = index.append(&id, 0, 5).unwrap();
        index.tombstone(slot_offset).unwrap();

        let table = index.load().unwrap();
        assert!(!table.contains(&id));
    }

    #[test]
    fn rewrite_updates_location_in_place() {
        let dir = tempdir().unwrap();
        let mut index = IndexFile::open(&dir.path().join("index")).unwrap();
        let id = "c".repeat(32);
        let slot_offset = index.append(&id, 0, 5).unwrap();
        index.rewrite(slot_offset, &id, 500, 9).unwrap();

        let table = index.load().unwrap();
        let record = table.get(&id).unwrap();
        assert_eq!(record.data_offset, 500);
        assert_eq!(record.size, 9);
        assert_eq!(record.slot_offset, slot_offset);
    }

    #[test]
    fn multiple_slots_preserve_write_order_offsets() {
        let dir = tempdir().unwrap();
        let mut index = IndexFile::open(&dir.path().join("index")).unwrap();
        let id_a = "d".repeat(32);
        let id_b = "e".repeat(32);
        let off_a = index.append(&id_a, 0, 5).unwrap();
        let off_b = index.append(&id_b, 5, 7).unwrap();
        assert_eq!(off_b - off_a, INDEX_ENTRY_SIZE as i64);

        let table = index.load().unwrap();
        assert_eq!(table.get(&id_a).unwrap().slot_offset, off_a);
        assert_eq!(table.get(&id_b).unwrap().slot_offset, off_b);
    }
}
