use cursor::Cursor;

use crate::TableEntry;

/// How the keys inside a block are interpreted.
///
/// The index block stores plain user keys; data blocks store internal keys
/// carrying the trailing 8-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyKind {
    User,
    Internal,
}

/// Walks the prefix-compressed entries of one block payload.
///
/// Returns `None` when the restart array itself is unusable (fewer than four
/// trailing bytes, or a restart region larger than the payload). Otherwise
/// returns every entry decoded before the first inconsistency — a truncated
/// or self-contradictory entry stops the walk at the last good one.
pub(crate) fn parse_block(payload: &[u8], kind: KeyKind) -> Option<Vec<TableEntry>> {
    let entry_region = entry_region(payload)?;

    let mut cur = Cursor::new(entry_region);
    let mut last_key: Vec<u8> = Vec::new();
    let mut out = Vec::new();

    while !cur.is_empty() {
        let Some((shared, non_shared, value_len)) = entry_header(&mut cur) else {
            break;
        };
        if shared > last_key.len() {
            break;
        }
        let Some(suffix) = cur.read_slice(non_shared) else {
            break;
        };
        let Some(value) = cur.read_slice(value_len) else {
            break;
        };

        let mut full_key = Vec::with_capacity(shared + non_shared);
        full_key.extend_from_slice(&last_key[..shared]);
        full_key.extend_from_slice(suffix);

        match kind {
            KeyKind::User => out.push(TableEntry {
                key: full_key.clone(),
                value: value.to_vec(),
                deleted: false,
            }),
            KeyKind::Internal => {
                // user key | 8-byte LE tag; the tag's low byte is the value
                // type, so it sits first in the trailing group.
                if full_key.len() < 8 {
                    break;
                }
                let split = full_key.len() - 8;
                let deleted = full_key[split] == 0;
                out.push(TableEntry {
                    key: full_key[..split].to_vec(),
                    value: if deleted { Vec::new() } else { value.to_vec() },
                    deleted,
                });
            }
        }

        last_key = full_key;
    }

    Some(out)
}

/// Slices off the entry region, validating the trailing restart array.
fn entry_region(payload: &[u8]) -> Option<&[u8]> {
    if payload.len() < 4 {
        return None;
    }
    let mut tail = Cursor::new(&payload[payload.len() - 4..]);
    let restart_count = tail.read_u32_le()? as usize;
    let restart_bytes = restart_count.checked_add(1)?.checked_mul(4)?;
    let entry_end = payload.len().checked_sub(restart_bytes)?;
    Some(&payload[..entry_end])
}

fn entry_header(cur: &mut Cursor<'_>) -> Option<(usize, usize, usize)> {
    let shared = cur.read_varint32()? as usize;
    let non_shared = cur.read_varint32()? as usize;
    let value_len = cur.read_varint32()? as usize;
    Some((shared, non_shared, value_len))
}
