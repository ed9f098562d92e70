//! Fixture builders for end-to-end storage tests.
//!
//! Synthetic `.ldb` and `.log` files are constructed byte-by-byte: tables
//! with a one-entry-per-block index and a 48-byte footer, logs with framed,
//! checksummed records carrying write batches, and local-storage shaped
//! keys and values on top.

use crc::{Crc, CRC_32_ISCSI};
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, SystemTime};

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

// -------------------- Table fixtures --------------------

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
        out.extend(varint(0));
        out.extend(varint(key.len() as u64));
        out.extend(varint(value.len() as u64));
        out.extend_from_slice(key);
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out
}

/// Snappy-encodes `payload` as literal elements only.
pub fn snappy_literals(payload: &[u8]) -> Vec<u8> {
    let mut out = varint(payload.len() as u64);
    for chunk in payload.chunks(60) {
        out.push(((chunk.len() - 1) as u8) << 2);
        out.extend_from_slice(chunk);
    }
    out
}

/// Assembles a table file from `(on_disk_payload, compression_byte)` blocks.
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

    let mut footer = varint(0);
    footer.extend(varint(0));
    footer.extend(varint(index_offset));
    footer.extend(varint(index_size));
    footer.resize(40, 0);
    footer.extend_from_slice(&0xdb47_7524_8b80_fb57u64.to_le_bytes());
    file.extend_from_slice(&footer);
    file
}

/// Convenience: one-block uncompressed table of put entries.
pub fn table_of_puts(entries: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let block: Vec<(Vec<u8>, Vec<u8>)> = entries
        .iter()
        .enumerate()
        .map(|(i, (k, v))| (internal_key(k, i as u64 + 1, 1), v.clone()))
        .collect();
    build_table(&[(build_block(&block), 0)])
}

// -------------------- Log fixtures --------------------

pub enum Op {
    Put(Vec<u8>, Vec<u8>),
    Del(Vec<u8>),
}

/// Serializes a write batch: 8-byte sequence, u32 count, tagged entries.
pub fn batch(ops: &[Op]) -> Vec<u8> {
    let mut out = vec![0u8; 8];
    out.extend_from_slice(&(ops.len() as u32).to_le_bytes());
    for op in ops {
        match op {
            Op::Put(key, value) => {
                out.push(1);
                out.extend(varint(key.len() as u64));
                out.extend_from_slice(key);
                out.extend(varint(value.len() as u64));
                out.extend_from_slice(value);
            }
            Op::Del(key) => {
                out.push(0);
                out.extend(varint(key.len() as u64));
                out.extend_from_slice(key);
            }
        }
    }
    out
}

/// Frames one log record with a valid masked CRC-32C.
pub fn log_record(record_type: u8, payload: &[u8]) -> Vec<u8> {
    const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);
    let mut digest = CASTAGNOLI.digest();
    digest.update(&[record_type]);
    digest.update(payload);
    let crc = digest
        .finalize()
        .rotate_right(15)
        .wrapping_add(0xa282_ead8);

    let mut out = Vec::with_capacity(7 + payload.len());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.push(record_type);
    out.extend_from_slice(payload);
    out
}

/// A log file of full records, one per batch, in write order.
pub fn log_of_batches(batches: &[Vec<Op>]) -> Vec<u8> {
    let mut out = Vec::new();
    for ops in batches {
        out.extend(log_record(1, &batch(ops)));
    }
    out
}

// -------------------- Local-storage shapes --------------------

/// A prefixed local-storage key: `0x5F | storage_key | 0x00 | key`.
pub fn ls_key(storage_key: &str, key: &str) -> Vec<u8> {
    let mut out = vec![0x5f];
    out.extend_from_slice(storage_key.as_bytes());
    out.push(0x00);
    out.extend_from_slice(key.as_bytes());
    out
}

/// An ISO-8859-1 encoded value with its `0x01` prefix.
pub fn ls_value_latin1(value: &str) -> Vec<u8> {
    let mut out = vec![0x01];
    out.extend(value.chars().map(|c| c as u8));
    out
}

/// A UTF-16LE encoded value with its `0x00` prefix.
pub fn ls_value_utf16(value: &str) -> Vec<u8> {
    let mut out = vec![0x00];
    for unit in value.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

// -------------------- Filesystem --------------------

/// Writes a store file and backdates its mtime by `age_secs` so recency
/// ordering is deterministic regardless of write order.
pub fn write_store_file(dir: &Path, name: &str, bytes: &[u8], age_secs: u64) {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(mtime).unwrap();
}
