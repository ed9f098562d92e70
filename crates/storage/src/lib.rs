//! # Storage — Chromium local-storage reader
//!
//! The top-level crate tying the [`table`] and [`wal`] readers into a
//! read-only view of a Chromium "Local Storage" LevelDB directory: given the
//! directory, it reconstructs the latest `(origin, key) → value` state and
//! decodes it into text.
//!
//! ## Architecture
//!
//! ```text
//! directory
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                  STORAGE                      │
//! │                                               │
//! │ merge.rs  → list *.ldb / *.log, newest first  │
//! │              |                                │
//! │              v                                │
//! │          table::read_table / wal::read_log    │
//! │              |                                │
//! │              v                                │
//! │          flat RawEntry stream (recency order) │
//! │                                               │
//! │ origin.rs → storage-key decode + origin match │
//! │ text.rs   → value decode + token scanning     │
//! │ lib.rs    → first-seen-wins + tombstones      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module      | Purpose                                                |
//! |-------------|--------------------------------------------------------|
//! | [`lib.rs`]  | Public entry points, merge semantics, diagnostic sink  |
//! | [`merge`]   | Directory enumeration, mtime ordering, file routing    |
//! | [`origin`]  | Storage-key split, origin normalization and matching   |
//! | [`text`]    | Encoding-prefixed + autodetected text, token scanning  |
//!
//! ## Guarantees
//!
//! Everything is best-effort and read-only: no entry point returns an error,
//! corrupt units are skipped with a diagnostic, and a deletion tombstone
//! permanently shadows older values for its key. Cross-file recency is file
//! mtime descending — a store restored with skewed mtimes may surface stale
//! values.

mod merge;
mod origin;
mod text;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Default minimum run length for [`read_token_candidates`].
pub const DEFAULT_TOKEN_MIN_LEN: usize = 60;

/// One live local-storage entry for a matched origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStorageEntry {
    /// The normalized origin decoded from the stored key.
    pub origin: String,
    /// The user-visible storage key.
    pub key: String,
    /// The decoded value.
    pub value: String,
    /// Length in bytes of the raw, undecoded value.
    pub raw_value_len: usize,
}

/// One key/value pair decoded without origin filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub key: String,
    pub value: String,
}

/// Reads the live local-storage entries for one origin.
///
/// The requested origin is normalized (whitespace and one trailing `/`
/// stripped) and matched against each stored entry by byte equality,
/// host+port equality, or scheme-stripped equality. Entries are merged
/// newest-first with first-seen-wins semantics; a deletion tombstone hides
/// every older value for its key.
pub fn read_entries(origin: &str, dir: &Path) -> Vec<LocalStorageEntry> {
    read_entries_with(origin, dir, &mut |_| {})
}

/// [`read_entries`] with a diagnostic sink.
///
/// `diag` receives one human-readable message per skipped unit, prefixed
/// with `[chromium-storage]`. Messages are advisory; their absence is not a
/// success signal. The sink is called synchronously and must not call back
/// into this crate.
pub fn read_entries_with(
    origin: &str,
    dir: &Path,
    diag: &mut dyn FnMut(&str),
) -> Vec<LocalStorageEntry> {
    let requested = origin::normalize_origin(origin);
    let mut tagged = |msg: &str| diag(&format!("[chromium-storage] {msg}"));
    let entries = merge::collect_entries(dir, &mut tagged);

    // Entries are newest-first; keep the first value seen per key and let
    // tombstones drop anything already accumulated for their key.
    let mut slots: Vec<Option<LocalStorageEntry>> = Vec::new();
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();
    let mut dead: HashSet<String> = HashSet::new();

    for entry in &entries {
        let Some(storage_key) = origin::decode_storage_key(&entry.key) else {
            // Expected: the store mixes metadata records with storage keys
            continue;
        };
        let entry_origin = origin::storage_key_origin(&storage_key.origin);
        if !origin::origin_matches(&entry_origin, &requested) {
            continue;
        }

        if entry.deleted {
            if let Some(&idx) = slot_by_key.get(&storage_key.key) {
                slots[idx] = None;
            }
            dead.insert(storage_key.key);
            continue;
        }

        if dead.contains(&storage_key.key) || slot_by_key.contains_key(&storage_key.key) {
            continue;
        }
        let Some(value) = text::decode_value(&entry.value) else {
            continue;
        };

        slot_by_key.insert(storage_key.key.clone(), slots.len());
        slots.push(Some(LocalStorageEntry {
            origin: entry_origin,
            key: storage_key.key,
            value,
            raw_value_len: entry.value.len(),
        }));
    }

    slots.into_iter().flatten().collect()
}

/// Decodes every merged entry as text, regardless of origin.
///
/// Keys are autodetect-decoded; values take the longer of the
/// encoding-prefixed and autodetected decodings. Entries that decode to
/// nothing are skipped.
pub fn read_text_entries(dir: &Path) -> Vec<TextEntry> {
    read_text_entries_with(dir, &mut |_| {})
}

/// [`read_text_entries`] with a diagnostic sink.
pub fn read_text_entries_with(dir: &Path, diag: &mut dyn FnMut(&str)) -> Vec<TextEntry> {
    let mut tagged = |msg: &str| diag(&format!("[chromium-storage] {msg}"));
    let entries = merge::collect_entries(dir, &mut tagged);

    let mut out = Vec::new();
    for entry in &entries {
        let Some(key) = text::decode_text(&entry.key) else {
            continue;
        };
        let Some(value) = text::decode_value_lenient(&entry.value) else {
            continue;
        };
        out.push(TextEntry { key, value });
    }
    out
}

/// Scans every merged entry's key and value bytes for token-shaped ASCII
/// runs: maximal runs over `A–Z a–z 0–9 . _ - + / =` that are at least
/// `min_len` long, or that form three non-empty dot-separated segments
/// (the shape of signed bearer tokens).
pub fn read_token_candidates(dir: &Path, min_len: usize) -> BTreeSet<String> {
    read_token_candidates_with(dir, min_len, &mut |_| {})
}

/// [`read_token_candidates`] with a diagnostic sink.
pub fn read_token_candidates_with(
    dir: &Path,
    min_len: usize,
    diag: &mut dyn FnMut(&str),
) -> BTreeSet<String> {
    let mut tagged = |msg: &str| diag(&format!("[chromium-storage] {msg}"));
    let entries = merge::collect_entries(dir, &mut tagged);

    let mut out = BTreeSet::new();
    for entry in &entries {
        text::scan_tokens(&entry.key, min_len, &mut out);
        text::scan_tokens(&entry.value, min_len, &mut out);
    }
    out
}

#[cfg(test)]
mod tests;
