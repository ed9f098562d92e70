//! # WAL — write-ahead log reader
//!
//! Read-only parser for LevelDB-compatible log files (`.log`). The log is
//! the most recent, not-yet-compacted slice of the store, so its entries
//! shadow anything found in table files.
//!
//! ## Binary record format
//!
//! The file is sliced into fixed 32 KiB blocks. Records never cross a block
//! boundary; a write batch that does not fit is split into fragments.
//!
//! ```text
//! [checksum: u32 LE][length: u16 LE][type: u8][payload ...]
//! ```
//!
//! Types: `1` full, `2` first, `3` middle, `4` last. A zero `length` is
//! block padding. Reassembled payloads are write batches:
//!
//! ```text
//! [sequence: u64][count: u32 LE][entries ...]
//! ```
//!
//! Entry (Put): `[tag=1: u8][key_len: varint][key][val_len: varint][value]`
//! Entry (Del): `[tag=0: u8][key_len: varint][key]`
//!
//! ## Tolerance
//!
//! Replay is best-effort: checksum mismatches are reported but the record is
//! still decoded, unknown record types and batch tags end only their own
//! unit, and a dangling fragment at end-of-file is decoded as a final batch
//! so truncated logs still yield their tail.

use crc::{Crc, CRC_32_ISCSI};
use cursor::Cursor;

/// Fixed framing window. Record headers and payloads never straddle one.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Record header: `checksum[4] | length[2] | type[1]`.
const HEADER_BYTES: usize = 7;

/// Write-batch header: `sequence[8] | count[4]`. Neither field is consumed
/// beyond the skip — entry recency comes from record order, not sequence.
const BATCH_HEADER_BYTES: usize = 12;

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Stored checksums are masked: `rotr(crc, 15) + DELTA`.
const CHECKSUM_MASK_DELTA: u32 = 0xa282_ead8;

/// A single logical operation recovered from a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// A key-value insertion.
    Put {
        /// The lookup key.
        key: Vec<u8>,
        /// The payload value.
        value: Vec<u8>,
    },
    /// A key deletion (tombstone).
    Del {
        /// The key to delete.
        key: Vec<u8>,
    },
}

/// Fragment type carried by each framed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordType {
    Full,
    First,
    Middle,
    Last,
}

impl RecordType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }
}

/// Replays every write batch in the log, returning the recovered operations
/// **newest first** (reverse record order), so a first-seen-wins consumer
/// gets the most recent state.
///
/// `diag` receives one message per anomaly (checksum mismatch, skipped
/// record); replay always continues.
pub fn read_log(data: &[u8], diag: &mut dyn FnMut(&str)) -> Vec<WalRecord> {
    let mut out = Vec::new();
    let mut pending: Vec<u8> = Vec::new();

    for window in data.chunks(BLOCK_SIZE) {
        let mut pos = 0;
        while pos + HEADER_BYTES <= window.len() {
            let mut header = Cursor::new(&window[pos..pos + HEADER_BYTES]);
            let stored_crc = header.read_u32_le().unwrap_or(0);
            let length = header.read_u16_le().unwrap_or(0) as usize;
            let record_type = window[pos + 6];

            // Zero-length records pad out the window
            if length == 0 {
                pos += HEADER_BYTES;
                continue;
            }

            let payload_start = pos + HEADER_BYTES;
            let payload_end = payload_start + length;
            if payload_end > window.len() {
                // The declared payload crosses the window boundary; nothing
                // after this point in the window can be trusted.
                break;
            }
            let payload = &window[payload_start..payload_end];

            verify_checksum(stored_crc, record_type, payload, diag);

            match RecordType::from_u8(record_type) {
                Some(RecordType::Full) => decode_batch(payload, &mut out),
                Some(RecordType::First) => {
                    pending.clear();
                    pending.extend_from_slice(payload);
                }
                Some(RecordType::Middle) => pending.extend_from_slice(payload),
                Some(RecordType::Last) => {
                    pending.extend_from_slice(payload);
                    decode_batch(&pending, &mut out);
                    pending.clear();
                }
                None => diag(&format!("skipping record of unknown type {record_type}")),
            }

            pos = payload_end;
        }
    }

    // A dangling fragment chain at end-of-file still holds the newest
    // operations of a truncated log; decode what is there.
    if !pending.is_empty() {
        decode_batch(&pending, &mut out);
    }

    out.reverse();
    out
}

/// Decodes one write batch, appending recovered operations to `out`.
///
/// Stops at the first inconsistency, keeping everything decoded so far. A
/// batch shorter than its fixed header is ignored entirely.
fn decode_batch(data: &[u8], out: &mut Vec<WalRecord>) {
    if data.len() < BATCH_HEADER_BYTES {
        return;
    }

    let mut cur = Cursor::new(&data[BATCH_HEADER_BYTES..]);
    while let Some(tag) = cur.read_u8() {
        match tag {
            0 => {
                let Some(key) = cur.read_length_prefixed() else {
                    return;
                };
                out.push(WalRecord::Del { key: key.to_vec() });
            }
            1 => {
                let Some(key) = cur.read_length_prefixed() else {
                    return;
                };
                let Some(value) = cur.read_length_prefixed() else {
                    return;
                };
                out.push(WalRecord::Put {
                    key: key.to_vec(),
                    value: value.to_vec(),
                });
            }
            // Any other tag ends the batch
            _ => return,
        }
    }
}

/// Checks the record checksum: masked CRC-32C over `type byte ∥ payload`.
///
/// A mismatch is advisory — the caller still decodes the record, keeping the
/// reference tolerance to torn writes.
fn verify_checksum(stored: u32, record_type: u8, payload: &[u8], diag: &mut dyn FnMut(&str)) {
    let mut digest = CASTAGNOLI.digest();
    digest.update(&[record_type]);
    digest.update(payload);
    let actual = mask_checksum(digest.finalize());
    if actual != stored {
        diag(&format!(
            "record checksum mismatch (type {record_type}, {} bytes)",
            payload.len()
        ));
    }
}

fn mask_checksum(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(CHECKSUM_MASK_DELTA)
}
