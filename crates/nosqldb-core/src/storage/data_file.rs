//! The append-only data file: raw JSON records with no internal framing.
//!
//! Record boundaries live entirely in the index file (spec §4.2); this type
//! only knows how to append bytes and read a byte range back.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Handle to a collection's `data` file.
#[derive(Debug)]
pub struct DataFile {
    file: File,
}

impl DataFile {
    /// Opens (creating if absent) the data file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Appends `bytes` at the current end of file and returns the offset it
    /// was written at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<i64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        Ok(offset as i64)
    }

    /// Reads `size` bytes starting at `offset`.
    pub fn read_at(&mut self, offset: i64, size: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        let mut buf = vec![0u8; size];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrites `size` bytes starting at `offset` with zero bytes.
    ///
    /// Used to scrub a deleted record's payload from the data file; the
    /// slot that indexed it is separately tombstoned in the index file.
    pub fn zero_at(&mut self, offset: i64, size: usize) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(&vec![0u8; size])?;
        self.file.sync_data()?;
        Ok(())
    }
}
