//! # Snappy — raw block decoder
//!
//! Decodes the "raw" Snappy block format: a varint length preamble followed
//! by a tag-driven stream of literals and back-references. This is the
//! variant LevelDB stores inside table data blocks — there is no outer
//! stream framing and no checksums.
//!
//! ## Wire format
//!
//! ```text
//! [uncompressed_len: varint]
//! [tag: u8][operands...]   repeated until input is exhausted
//! ```
//!
//! The low two bits of each tag select the element kind:
//!
//! | Bits | Kind               | Length                     | Offset        |
//! |------|--------------------|----------------------------|---------------|
//! | `00` | literal            | `(tag >> 2) + 1`, or that many extra LE bytes when `tag >> 2 >= 60` | — |
//! | `01` | copy, 1-byte offset| `((tag >> 2) & 7) + 4`     | `(tag >> 5) << 8 \| next` |
//! | `10` | copy, 2-byte offset| `(tag >> 2) + 1`           | next 2 bytes LE |
//! | `11` | copy, 4-byte offset| `(tag >> 2) + 1`           | next 4 bytes LE |
//!
//! Copies reference the *growing* output buffer, so an offset smaller than
//! the copy length legally repeats the tail pattern (run-length encoding).
//! Decoding is all-or-nothing: any truncation or invalid offset fails with
//! no partial output.

use cursor::Cursor;
use thiserror::Error;

/// Upper bound on the output buffer reserved from the length preamble
/// (16 MiB). Prevents OOM on corrupt preambles; the output itself may still
/// grow past this if the stream legitimately decodes to more.
const MAX_PREALLOC_BYTES: usize = 16 * 1024 * 1024;

/// Errors produced while decoding a raw Snappy block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnappyError {
    /// The input ended inside the preamble, a tag's operands, or a literal.
    #[error("truncated snappy input")]
    Truncated,

    /// A copy referenced data before the start of the output (offset zero or
    /// larger than the bytes produced so far).
    #[error("invalid copy offset {offset} at output length {produced}")]
    InvalidOffset {
        /// The back-reference distance the tag encoded.
        offset: usize,
        /// Output bytes produced when the copy was encountered.
        produced: usize,
    },
}

/// Decompresses one raw Snappy block.
///
/// The length preamble is used only to pre-size the output buffer; it is not
/// validated against the decoded size (matching the tolerant readers this
/// feeds). Returns [`SnappyError`] — and no partial output — on truncation
/// or an invalid back-reference.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, SnappyError> {
    let mut cur = Cursor::new(input);

    let expected_len = cur.read_varint64().ok_or(SnappyError::Truncated)? as usize;
    let mut out: Vec<u8> = Vec::with_capacity(expected_len.min(MAX_PREALLOC_BYTES));

    while let Some(tag) = cur.read_u8() {
        match tag & 0b11 {
            0b00 => {
                let len = literal_length(&mut cur, tag)?;
                let bytes = cur.read_slice(len).ok_or(SnappyError::Truncated)?;
                out.extend_from_slice(bytes);
            }
            0b01 => {
                let len = (((tag >> 2) & 0x7) as usize) + 4;
                let hi = ((tag >> 5) as usize) << 8;
                let lo = cur.read_u8().ok_or(SnappyError::Truncated)? as usize;
                copy_within(&mut out, hi | lo, len)?;
            }
            0b10 => {
                let len = ((tag >> 2) as usize) + 1;
                let offset = cur.read_u16_le().ok_or(SnappyError::Truncated)? as usize;
                copy_within(&mut out, offset, len)?;
            }
            _ => {
                let len = ((tag >> 2) as usize) + 1;
                let offset = cur.read_u32_le().ok_or(SnappyError::Truncated)? as usize;
                copy_within(&mut out, offset, len)?;
            }
        }
    }

    Ok(out)
}

/// Decodes the length field of a literal tag.
///
/// Fields below 60 encode `length - 1` directly; 60..=63 mean that many
/// minus 59 extra little-endian bytes follow, holding `length - 1`.
fn literal_length(cur: &mut Cursor<'_>, tag: u8) -> Result<usize, SnappyError> {
    let field = (tag >> 2) as usize;
    if field < 60 {
        return Ok(field + 1);
    }

    let extra = field - 59; // 1..=4 bytes
    let bytes = cur.read_slice(extra).ok_or(SnappyError::Truncated)?;
    let mut len_minus_one: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        len_minus_one |= u64::from(*byte) << (8 * i);
    }
    Ok(len_minus_one as usize + 1)
}

/// Appends `len` bytes copied from `offset` bytes before the end of `out`.
///
/// The source range is read against the growing output, one byte at a time,
/// so self-overlapping copies repeat the tail pattern.
fn copy_within(out: &mut Vec<u8>, offset: usize, len: usize) -> Result<(), SnappyError> {
    if offset == 0 || offset > out.len() {
        return Err(SnappyError::InvalidOffset {
            offset,
            produced: out.len(),
        });
    }

    let start = out.len() - offset;
    for i in 0..len {
        let byte = out[start + i];
        out.push(byte);
    }
    Ok(())
}
