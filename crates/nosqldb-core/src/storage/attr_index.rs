//! The attribute-posting file: one persistent singly-linked list per
//! attribute path (spec §4.3).
//!
//! A list's head is written inline as `"<path>:<id>:<next>"`; every
//! subsequent node omits the path and is `"<id>:<next>"`. Locating a head
//! with no prior knowledge of its offset means scanning the file for the
//! literal path bytes; `AttrIndex` does this in overlapping 256-byte
//! windows so a match straddling a window boundary is never missed, and
//! caches the offset once found since paths rarely change within a
//! collection's lifetime.

use crate::error::{Error, Result};
use crate::storage::format::{
    decode_attr_node, decode_pointer, encode_attr_head, encode_attr_node, encode_pointer,
    ATTR_NODE_WIDTH, ID_LENGTH, POINTER_SIZE,
};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

const SCAN_WINDOW: usize = 256;

/// Handle to a collection's `attr` file.
#[derive(Debug)]
pub struct AttrIndex {
    file: File,
    /// `path -> head node offset`, populated lazily as paths are located.
    head_cache: HashMap<String, u64>,
}

impl AttrIndex {
    /// Opens (creating if absent) the attribute file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            file,
            head_cache: HashMap::new(),
        })
    }

    /// Appends `id` to the posting list for `path`, creating the list if it
    /// does not yet exist.
    pub fn append(&mut self, path: &str, id: &str) -> Result<()> {
        match self.find_head(path)? {
            None => {
                let offset = self.file.seek(SeekFrom::End(0))?;
                self.file.write_all(&encode_attr_head(path, id, None))?;
                self.file.sync_data()?;
                self.head_cache.insert(path.to_string(), offset);
            }
            Some(head_offset) => {
                let tail = self.find_tail(path, head_offset)?;
                let new_node_offset = self.file.seek(SeekFrom::End(0))?;
                self.file.write_all(&encode_attr_node(id, None))?;
                self.file.sync_data()?;
                self.patch_next_pointer(tail, new_node_offset)?;
            }
        }
        Ok(())
    }

    /// Returns every id posted under `path`, in list order. Duplicates are
    /// possible (postings are append-only and never removed).
    pub fn iterate(&mut self, path: &str) -> Result<Vec<String>> {
        let Some(head_offset) = self.find_head(path)? else {
            return Ok(Vec::new());
        };

        let needle_len = path.len() + 1;
        let node = self.read_at(head_offset, needle_len + ATTR_NODE_WIDTH)?;
        let (id, mut next) = decode_attr_node(&node[needle_len..])?;
        let mut ids = vec![id];

        while let Some(offset) = next {
            let node = self.read_at(offset, ATTR_NODE_WIDTH)?;
            let (id, following) = decode_attr_node(&node)?;
            ids.push(id);
            next = following;
        }
        Ok(ids)
    }

    /// Locates the head node offset for `path`, consulting (and populating)
    /// the head cache.
    fn find_head(&mut self, path: &str) -> Result<Option<u64>> {
        if let Some(&offset) = self.head_cache.get(path) {
            return Ok(Some(offset));
        }
        let offset = self.scan_for_head(path)?;
        if let Some(offset) = offset {
            self.head_cache.insert(path.to_string(), offset);
        }
        Ok(offset)
    }

    /// Scans the file in overlapping `SCAN_WINDOW`-byte windows for the
    /// literal `"<path>:"` bytes. Windows overlap by `needle.len() - 1`
    /// bytes so a match split across a window boundary is never missed.
    fn scan_for_head(&mut self, path: &str) -> Result<Option<u64>> {
        let needle = format!("{path}:");
        let needle = needle.as_bytes();
        let file_len = self.file.metadata()?.len();
        if file_len < needle.len() as u64 {
            return Ok(None);
        }

        let window_size = SCAN_WINDOW.max(needle.len() + 1);
        let overlap = needle.len().saturating_sub(1);
        let step = (window_size - overlap) as u64;

        let mut offset = 0u64;
        while offset < file_len {
            let window = self.read_window(offset, window_size)?;
            if let Some(pos) = find_subslice(&window, needle) {
                return Ok(Some(offset + pos as u64));
            }
            offset += step;
        }
        Ok(None)
    }

    /// Walks the list starting at `head_offset`, returning the offset of
    /// its tail node (the one whose `next` pointer is NUL).
    fn find_tail(&mut self, path: &str, head_offset: u64) -> Result<u64> {
        let needle_len = path.len() + 1;
        let head_node = self.read_at(head_offset, needle_len + ATTR_NODE_WIDTH)?;
        let mut next = decode_pointer(&head_node[needle_len + ID_LENGTH + 1..])?;
        let mut tail = head_offset;

        while let Some(offset) = next {
            let node = self.read_at(offset, ATTR_NODE_WIDTH)?;
            next = decode_pointer(&node[ID_LENGTH + 1..])?;
            tail = offset;
        }
        Ok(tail)
    }

    /// Overwrites the `next` pointer field of the node at `node_offset`
    /// (head or follow-on) to point at `new_offset`.
    fn patch_next_pointer(&mut self, node_offset: u64, new_offset: u64) -> Result<()> {
        if new_offset > crate::storage::format::MAX_POINTER_OFFSET {
            return Err(Error::Corruption(format!(
                "attribute file offset {new_offset} exceeds the {POINTER_SIZE}-byte pointer width"
            )));
        }
        let pointer_offset = node_offset + (ID_LENGTH as u64) + 1;
        self.file.seek(SeekFrom::Start(pointer_offset))?;
        self.file.write_all(&encode_pointer(Some(new_offset)))?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads up to `len` bytes at `offset`, clipped at end-of-file.
    fn read_window(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        loop {
            match self.file.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
