//! # Table — sorted-string table reader
//!
//! Best-effort parser for LevelDB-compatible table files (`.ldb`): immutable,
//! key-sorted files of block-wise prefix-compressed entries with a trailing
//! index and footer. The reader walks the whole file in document order and
//! never writes.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCKS (prefix-compressed entries, internal keys)         │
//! │                                                               │
//! │ per entry: shared (varint) | non_shared (varint)              │
//! │            value_len (varint) | key_suffix | value            │
//! │ per block tail: u32 restart[restart_count] | u32 restart_count│
//! │ after every block payload: compression (u8) | 4 reserved bytes│
//! ├───────────────────────────────────────────────────────────────┤
//! │ METAINDEX BLOCK (present in the footer, not consumed here)    │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX BLOCK (same layout, user keys, values = block handles)  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 48 bytes)                                 │
//! │                                                               │
//! │ metaindex handle | index handle (varints, zero-padded to 40)  │
//! │ magic (8 bytes, ignored)                                      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal keys carry a trailing 8-byte little-endian tag whose low byte is
//! the value type (`0` = deletion tombstone, otherwise a put); the remaining
//! bits hold a sequence number this reader does not use.
//!
//! ## Failure semantics
//!
//! The reader is strictly best-effort: structural corruption is confined to
//! the block (or entry) it occurs in, a diagnostic is emitted, and everything
//! decoded so far is returned. No input ever raises an error across the
//! public API.

mod block;
mod format;
mod reader;

pub use format::{BlockHandle, Footer, BLOCK_TRAILER_BYTES, FOOTER_BYTES};
pub use reader::read_table;

/// One decoded table entry.
///
/// `value` is empty when `deleted` holds — the on-disk representation of a
/// tombstone carries no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// The user key, with any internal-key tag already stripped.
    pub key: Vec<u8>,
    /// The value bytes; empty for deletions.
    pub value: Vec<u8>,
    /// `true` when the entry is a deletion tombstone.
    pub deleted: bool,
}

#[cfg(test)]
mod tests;
