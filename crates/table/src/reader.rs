use anyhow::{bail, Result};
use cursor::Cursor;
use std::borrow::Cow;

use crate::block::{parse_block, KeyKind};
use crate::format::{BlockHandle, Footer, BLOCK_TRAILER_BYTES, COMPRESSION_NONE, COMPRESSION_SNAPPY, FOOTER_BYTES};
use crate::TableEntry;

/// Reads every entry of a table file, in file order.
///
/// Walks footer → index block → data blocks. Index-block keys are plain user
/// keys; data-block keys are internal keys whose tag selects put vs deletion.
///
/// Best-effort: a corrupt footer yields an empty result, a corrupt block is
/// skipped, and a corrupt entry stops only its own block. Each skipped unit
/// emits one message on `diag`; entries decoded before a failure are kept.
pub fn read_table(data: &[u8], diag: &mut dyn FnMut(&str)) -> Vec<TableEntry> {
    if data.len() < FOOTER_BYTES {
        return Vec::new();
    }

    let Some(footer) = Footer::decode(&data[data.len() - FOOTER_BYTES..]) else {
        diag("unreadable footer");
        return Vec::new();
    };

    let index_payload = match block_payload(data, footer.index) {
        Ok(payload) => payload,
        Err(e) => {
            diag(&format!("index block: {e:#}"));
            return Vec::new();
        }
    };
    let Some(index_entries) = parse_block(&index_payload, KeyKind::User) else {
        diag("index block: restart array exceeds payload");
        return Vec::new();
    };

    let mut out = Vec::new();
    for index_entry in index_entries {
        let Some(handle) = BlockHandle::decode(&mut Cursor::new(&index_entry.value)) else {
            diag("index entry holds no valid block handle");
            continue;
        };

        match block_payload(data, handle) {
            Ok(payload) => match parse_block(&payload, KeyKind::Internal) {
                Some(entries) => out.extend(entries),
                None => diag(&format!(
                    "data block at offset {}: restart array exceeds payload",
                    handle.offset
                )),
            },
            Err(e) => diag(&format!("data block at offset {}: {e:#}", handle.offset)),
        }
    }
    out
}

/// Extracts the payload a handle points at, decompressing if the trailing
/// compression byte says so.
///
/// The four reserved bytes after the compression byte are bounds-checked but
/// not verified.
fn block_payload(data: &[u8], handle: BlockHandle) -> Result<Cow<'_, [u8]>> {
    let offset = usize::try_from(handle.offset)?;
    let size = usize::try_from(handle.size)?;
    let Some(end) = offset
        .checked_add(size)
        .and_then(|e| e.checked_add(BLOCK_TRAILER_BYTES))
    else {
        bail!("block bounds overflow");
    };
    if end > data.len() {
        bail!("block [{offset}, +{size}] exceeds file length {}", data.len());
    }

    let payload = &data[offset..offset + size];
    match data[offset + size] {
        COMPRESSION_NONE => Ok(Cow::Borrowed(payload)),
        COMPRESSION_SNAPPY => Ok(Cow::Owned(snappy::decompress(payload)?)),
        other => bail!("unsupported compression type {other}"),
    }
}
