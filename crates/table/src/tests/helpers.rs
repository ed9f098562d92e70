//! Byte-level fixture builders for table tests.
//!
//! These construct just enough of the on-disk format to exercise the reader:
//! uncompressed blocks without prefix sharing, whole tables with a one-entry-
//! per-block index, and literal-only Snappy wrapping.

pub fn varint(mut v: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Appends the 8-byte tag `(seq << 8) | ty` to a user key.
pub fn internal_key(user: &[u8], seq: u64, ty: u8) -> Vec<u8> {
    let mut key = user.to_vec();
    key.extend_from_slice(&((seq << 8) | u64::from(ty)).to_le_bytes());
    key
}

/// Builds a block payload with no prefix sharing and a single restart point.
pub fn build_block(entries: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in entries {
        out.extend(varint(0)); // shared
        out.extend(varint(key.len() as u64));
        out.extend(varint(value.len() as u64));
        out.extend_from_slice(key);
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&0u32.to_le_bytes()); // restart[0]
    out.extend_from_slice(&1u32.to_le_bytes()); // restart_count
    out
}

/// Snappy-encodes `payload` as literal elements only (no back-references).
pub fn snappy_literals(payload: &[u8]) -> Vec<u8> {
    let mut out = varint(payload.len() as u64);
    for chunk in payload.chunks(60) {
        out.push(((chunk.len() - 1) as u8) << 2);
        out.extend_from_slice(chunk);
    }
    out
}

/// Assembles a table file from `(on_disk_payload, compression_byte)` blocks:
/// data blocks, a one-entry-per-block index, and the 48-byte footer.
pub fn build_table(blocks: &[(Vec<u8>, u8)]) -> Vec<u8> {
    let mut file = Vec::new();
    let mut handles = Vec::new();

    for (payload, compression) in blocks {
        handles.push((file.len() as u64, payload.len() as u64));
        file.extend_from_slice(payload);
        file.push(*compression);
        file.extend_from_slice(&[0u8; 4]);
    }

    let index_entries: Vec<(Vec<u8>, Vec<u8>)> = handles
        .iter()
        .enumerate()
        .map(|(i, (offset, size))| {
            let mut handle = varint(*offset);
            handle.extend(varint(*size));
            (format!("idx{i}").into_bytes(), handle)
        })
        .collect();
    let index_payload = build_block(&index_entries);
    let index_offset = file.len() as u64;
    let index_size = index_payload.len() as u64;
    file.extend_from_slice(&index_payload);
    file.push(0);
    file.extend_from_slice(&[0u8; 4]);

    let mut footer = Vec::new();
    footer.extend(varint(0)); // metaindex handle, unused
    footer.extend(varint(0));
    footer.extend(varint(index_offset));
    footer.extend(varint(index_size));
    footer.resize(40, 0);
    footer.extend_from_slice(&0xdb47_7524_8b80_fb57u64.to_le_bytes());
    file.extend_from_slice(&footer);
    file
}
