//! On-disk format constants and the pure encode/decode routines for the
//! index and attribute files.
//!
//! Kept as `const` items in one place (spec §9) so a future format version
//! only needs to change this module.

use crate::error::{Error, Result};

/// Width in bytes of an internal id: 32 lowercase hex characters (MD5).
pub const ID_LENGTH: usize = 32;

/// Width in bytes of one index-file slot: `<id>:<offset>:<size>` NUL-padded
/// plus a trailing `;`.
pub const INDEX_ENTRY_SIZE: usize = ID_LENGTH + 20;

/// Width in bytes of the `next_offset` pointer field in an attribute node.
pub const POINTER_SIZE: usize = 5;

/// Width in bytes of an attribute node after the (optional) `path:` prefix:
/// `<id>:<5-byte pointer>`.
pub const ATTR_NODE_WIDTH: usize = ID_LENGTH + 1 + POINTER_SIZE;

/// Maximum offset representable in a `POINTER_SIZE`-byte decimal pointer.
pub const MAX_POINTER_OFFSET: u64 = 99_999;

/// One decoded index slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSlot {
    /// Internal id stored in this slot.
    pub id: String,
    /// Byte offset of the record in the data file.
    pub data_offset: i64,
    /// Size in bytes of the record in the data file.
    pub size: usize,
}

/// Encodes an index slot as `INDEX_ENTRY_SIZE` bytes: `<id>:<offset>:<size>`
/// NUL-padded, terminated by `;`.
#[must_use]
pub fn encode_index_slot(id: &str, data_offset: i64, size: usize) -> Vec<u8> {
    let mut body = format!("{id}:{data_offset}:{size}");
    assert!(
        body.len() < INDEX_ENTRY_SIZE,
        "index slot body '{body}' does not fit in {INDEX_ENTRY_SIZE} bytes"
    );
    let pad = INDEX_ENTRY_SIZE - 1 - body.len();
    body.push_str(&"\0".repeat(pad));
    body.push(';');
    body.into_bytes()
}

/// Encodes a tombstone slot: `INDEX_ENTRY_SIZE` NUL bytes.
#[must_use]
pub fn encode_tombstone() -> Vec<u8> {
    vec![0u8; INDEX_ENTRY_SIZE]
}

/// Decodes one `INDEX_ENTRY_SIZE`-byte slot.
///
/// Returns `Ok(None)` for an all-NUL tombstone slot, `Ok(Some(..))` for a
/// well-formed live slot, and `Err(Error::Corruption)` for anything else.
pub fn decode_index_slot(bytes: &[u8]) -> Result<Option<IndexSlot>> {
    debug_assert_eq!(bytes.len(), INDEX_ENTRY_SIZE);
    if bytes.iter().all(|&b| b == 0) {
        return Ok(None);
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::Corruption("index slot is not valid UTF-8".to_string()))?;
    let trimmed = text.trim_end_matches(['\0', ';']);
    let mut parts = trimmed.splitn(3, ':');
    let (Some(id), Some(offset_str), Some(size_str)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::Corruption(format!(
            "malformed index slot: {trimmed:?}"
        )));
    };
    if id.len() != ID_LENGTH {
        return Err(Error::Corruption(format!(
            "index slot id '{id}' is not {ID_LENGTH} characters"
        )));
    }
    let data_offset: i64 = offset_str
        .parse()
        .map_err(|_| Error::Corruption(format!("index slot offset '{offset_str}' is not decimal")))?;
    let size: usize = size_str
        .parse()
        .map_err(|_| Error::Corruption(format!("index slot size '{size_str}' is not decimal")))?;

    Ok(Some(IndexSlot {
        id: id.to_string(),
        data_offset,
        size,
    }))
}

/// Encodes the head node of an attribute posting list:
/// `"<path>:<id>:<next_offset>"`.
#[must_use]
pub fn encode_attr_head(path: &str, id: &str, next: Option<u64>) -> Vec<u8> {
    let mut out = format!("{path}:{id}:").into_bytes();
    out.extend_from_slice(&encode_pointer(next));
    out
}

/// Encodes a follow-on attribute node: `"<id>:<next_offset>"`.
#[must_use]
pub fn encode_attr_node(id: &str, next: Option<u64>) -> Vec<u8> {
    let mut out = format!("{id}:").into_bytes();
    out.extend_from_slice(&encode_pointer(next));
    out
}

/// Encodes a `POINTER_SIZE`-byte pointer field: decimal ASCII, NUL-padded;
/// `None` means "no successor".
#[must_use]
pub fn encode_pointer(next: Option<u64>) -> [u8; POINTER_SIZE] {
    let mut field = [0u8; POINTER_SIZE];
    if let Some(offset) = next {
        let digits = offset.to_string();
        assert!(
            digits.len() <= POINTER_SIZE,
            "offset {offset} exceeds the {POINTER_SIZE}-byte pointer width (max {MAX_POINTER_OFFSET})"
        );
        field[..digits.len()].copy_from_slice(digits.as_bytes());
    }
    field
}

/// Decodes a `POINTER_SIZE`-byte pointer field.
///
/// Returns `Err(Error::Corruption)` if the non-NUL content is not decimal.
pub fn decode_pointer(bytes: &[u8]) -> Result<Option<u64>> {
    debug_assert_eq!(bytes.len(), POINTER_SIZE);
    let trimmed = bytes
        .iter()
        .copied()
        .take_while(|&b| b != 0)
        .collect::<Vec<u8>>();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let text = std::str::from_utf8(&trimmed)
        .map_err(|_| Error::Corruption("attribute pointer is not valid UTF-8".to_string()))?;
    text.parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Corruption(format!("attribute pointer '{text}' is not decimal")))
}

/// Decodes a follow-on attribute node body: `<id>:<pointer>`.
pub fn decode_attr_node(bytes: &[u8]) -> Result<(String, Option<u64>)> {
    debug_assert_eq!(bytes.len(), ATTR_NODE_WIDTH);
    let id = std::str::from_utf8(&bytes[..ID_LENGTH])
        .map_err(|_| Error::Corruption("attribute node id is not valid UTF-8".to_string()))?;
    if id.len() != ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Corruption(format!(
            "attribute node id '{id}' is not {ID_LENGTH} hex characters"
        )));
    }
    let next = decode_pointer(&bytes[ID_LENGTH + 1..])?;
    Ok((id.to_string(), next))
}
