use cursor::Cursor;

/// Size of the fixed footer at the tail of every table file.
pub const FOOTER_BYTES: usize = 48;

/// Bytes following every block payload: one compression-type byte plus four
/// reserved bytes this reader does not verify.
pub const BLOCK_TRAILER_BYTES: usize = 5;

/// Compression-type byte: block payload is stored verbatim.
pub(crate) const COMPRESSION_NONE: u8 = 0;
/// Compression-type byte: block payload is a raw Snappy block.
pub(crate) const COMPRESSION_SNAPPY: u8 = 1;

/// Points at `size` payload bytes starting at `offset` in the enclosing file.
///
/// Serialized as two varint64s. The payload is followed on disk by the
/// [`BLOCK_TRAILER_BYTES`] trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    /// Reads a handle (two varints) from the cursor.
    pub fn decode(cur: &mut Cursor<'_>) -> Option<Self> {
        let offset = cur.read_varint64()?;
        let size = cur.read_varint64()?;
        Some(Self { offset, size })
    }
}

/// The last 48 bytes of a table file: two block handles zero-padded to 40
/// bytes, then an 8-byte magic this reader ignores.
#[derive(Debug, Clone, Copy)]
pub struct Footer {
    /// Handle of the metaindex block (filter metadata; not consumed).
    pub metaindex: BlockHandle,
    /// Handle of the index block.
    pub index: BlockHandle,
}

impl Footer {
    /// Decodes a footer from exactly [`FOOTER_BYTES`] trailing bytes.
    pub fn decode(tail: &[u8]) -> Option<Self> {
        if tail.len() != FOOTER_BYTES {
            return None;
        }
        let mut cur = Cursor::new(&tail[..FOOTER_BYTES - 8]);
        let metaindex = BlockHandle::decode(&mut cur)?;
        let index = BlockHandle::decode(&mut cur)?;
        Some(Self { metaindex, index })
    }
}
