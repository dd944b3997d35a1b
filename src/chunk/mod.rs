mod reader;
mod stream;
mod writer;

pub use reader::*;
pub use stream::*;
pub use writer::*;

use crate::{Error, Result};

/// Highest chunk stream id the 3-byte basic header form can carry
pub const MAX_CHUNK_STREAM_ID: u32 = 65599;

/// Parsed basic header: chunk format and chunk stream id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicHeader {
    pub fmt: u8,
    pub cs_id: u32,
}

/// Encode a basic header.
///
/// Ids 2..=63 fit the first byte; 64..=319 use the 2-byte form (id 0
/// selector, next byte = cs_id - 64); larger ids use the 3-byte form
/// (id 1 selector, next two bytes = cs_id - 64 little-endian). Ids 0
/// and 1 are reserved selectors and never valid lane ids.
pub fn encode_basic_header(fmt: u8, cs_id: u32) -> Result<Vec<u8>> {
    if cs_id < 2 || cs_id > MAX_CHUNK_STREAM_ID {
        return Err(Error::chunk(format!(
            "Chunk stream id {} out of range",
            cs_id
        )));
    }

    let mut result = Vec::with_capacity(3);
    if cs_id <= 63 {
        result.push((fmt << 6) | cs_id as u8);
    } else if cs_id <= 319 {
        result.push(fmt << 6);
        result.push((cs_id - 64) as u8);
    } else {
        result.push((fmt << 6) | 1);
        let id = (cs_id - 64) as u16;
        result.push((id & 0xFF) as u8);
        result.push((id >> 8) as u8);
    }
    Ok(result)
}

/// Parse a basic header from the front of `bytes`; returns the header
/// and how many bytes it occupied
pub fn parse_basic_header(bytes: &[u8]) -> Result<(BasicHeader, usize)> {
    let first = *bytes
        .first()
        .ok_or_else(|| Error::chunk("Empty basic header"))?;
    let fmt = (first >> 6) & 0x03;

    let (cs_id, consumed) = match first & 0x3F {
        0 => {
            let byte = *bytes
                .get(1)
                .ok_or_else(|| Error::chunk("Truncated 2-byte basic header"))?;
            (byte as u32 + 64, 2)
        }
        1 => {
            if bytes.len() < 3 {
                return Err(Error::chunk("Truncated 3-byte basic header"));
            }
            let id = u16::from_le_bytes([bytes[1], bytes[2]]) as u32;
            (id + 64, 3)
        }
        n => (n as u32, 1),
    };

    Ok((BasicHeader { fmt, cs_id }, consumed))
}
