//! Fixed-layout headers at the start of `.mc` and `.chunk` files.
//!
//! Only the field that sizes the output buffer is interpreted; everything else
//! is left to the external decompressor. Parsing never reads past the slice it
//! is given.

use crate::codec::CodecVariant;

/// `.mc` package header: magic (u32) + version (u32) + flags (u32), all LE.
pub const GENERAL_HEADER_LEN: usize = 12;
const GENERAL_FLAGS_OFF: usize = 8;

/// `.chunk` header: decompressed size (u32 LE) at offset 0.
pub const CHUNK_HEADER_LEN: usize = 4;
const CHUNK_SIZE_OFF: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub variant: CodecVariant,
    pub decompressed_size: u64,
}

/// Number of leading bytes `parse` needs for `variant`.
pub fn header_len(variant: CodecVariant) -> usize {
    match variant {
        CodecVariant::GeneralArchive => GENERAL_HEADER_LEN,
        CodecVariant::ChunkArchive => CHUNK_HEADER_LEN,
    }
}

/// Parse the header for `variant` from the start of `data`.
/// Returns `None` when `data` is shorter than the header.
pub fn parse(variant: CodecVariant, data: &[u8]) -> Option<Header> {
    if data.len() < header_len(variant) {
        return None;
    }
    let decompressed_size = match variant {
        CodecVariant::GeneralArchive => {
            // size = (flags >> 5) << (flags & 0xF); at most 42 bits
            let flags = read_u32_le(data, GENERAL_FLAGS_OFF);
            u64::from(flags >> 5) << (flags & 0xF)
        }
        CodecVariant::ChunkArchive => u64::from(read_u32_le(data, CHUNK_SIZE_OFF)),
    };
    Some(Header { variant, decompressed_size })
}

fn read_u32_le(data: &[u8], off: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[off..off + 4]);
    u32::from_le_bytes(b)
}

/// Build a `.mc` flags word that encodes `size` exactly, if one exists.
/// Used by tooling and tests to produce well-formed headers.
pub fn general_flags_for(size: u64) -> Option<u32> {
    for shift in 0..16u32 {
        let base = size >> shift;
        if base << shift != size {
            break;
        }
        if base <= u64::from(u32::MAX >> 5) {
            return Some(((base as u32) << 5) | shift);
        }
    }
    None
}
