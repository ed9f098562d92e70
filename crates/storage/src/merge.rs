//! Directory enumeration and per-file routing.
//!
//! Produces the flat, recency-ordered entry stream the projection consumes:
//! `.ldb` files go through [`table::read_table`], `.log` files through
//! [`wal::read_log`], newest file first. Within a log the reader already
//! yields newest-record-first, so the concatenation is globally "first seen
//! is freshest" per key.

use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use wal::WalRecord;

/// One entry of the merged stream, as produced by either reader.
#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy)]
enum StoreFileKind {
    Table,
    Log,
}

/// File contents held either as a read-only mapping or an owned buffer.
///
/// Stores can run to hundreds of MiB; mapping avoids doubling that in
/// anonymous memory. Falls back to a plain read where mapping fails
/// (e.g. empty files on some platforms).
enum FileBytes {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(map) => map,
            FileBytes::Buffered(buf) => buf,
        }
    }
}

fn load_file(path: &Path) -> std::io::Result<FileBytes> {
    let file = File::open(path)?;
    // Safety: the mapping is read-only and the store is assumed quiescent
    // for the duration of a call; all reads are bounds-checked.
    match unsafe { Mmap::map(&file) } {
        Ok(map) => Ok(FileBytes::Mapped(map)),
        Err(_) => Ok(FileBytes::Buffered(std::fs::read(path)?)),
    }
}

/// Classifies a directory entry, ignoring hidden files and foreign
/// extensions (`MANIFEST-*`, `CURRENT`, `LOCK`, ...).
fn classify(path: &Path) -> Option<StoreFileKind> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "ldb" => Some(StoreFileKind::Table),
        "log" => Some(StoreFileKind::Log),
        _ => None,
    }
}

/// Reads every store file under `dir` into one flat entry stream, newest
/// file first. Files without a readable mtime sort as the distant past.
///
/// Unreadable directories or files emit one diagnostic each and contribute
/// nothing.
pub(crate) fn collect_entries(dir: &Path, diag: &mut dyn FnMut(&str)) -> Vec<RawEntry> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read store directory");
            diag(&format!("cannot read directory {}: {e}", dir.display()));
            return Vec::new();
        }
    };

    let mut files: Vec<(PathBuf, StoreFileKind, SystemTime)> = Vec::new();
    for entry in read_dir.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(kind) = classify(&path) else {
            continue;
        };
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, kind, mtime));
    }
    files.sort_by(|a, b| b.2.cmp(&a.2));

    let mut out = Vec::new();
    for (path, kind, _) in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
            .to_string();
        debug!(file = %name, "reading store file");

        let bytes = match load_file(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %name, error = %e, "cannot read store file");
                diag(&format!("cannot read {name}: {e}"));
                continue;
            }
        };

        let mut forward = |msg: &str| diag(&format!("{name}: {msg}"));
        match kind {
            StoreFileKind::Table => {
                out.extend(
                    table::read_table(&bytes, &mut forward)
                        .into_iter()
                        .map(|e| RawEntry {
                            key: e.key,
                            value: e.value,
                            deleted: e.deleted,
                        }),
                );
            }
            StoreFileKind::Log => {
                out.extend(wal::read_log(&bytes, &mut forward).into_iter().map(
                    |record| match record {
                        WalRecord::Put { key, value } => RawEntry {
                            key,
                            value,
                            deleted: false,
                        },
                        WalRecord::Del { key } => RawEntry {
                            key,
                            value: Vec::new(),
                            deleted: true,
                        },
                    },
                ));
            }
        }
    }
    out
}
