//! Unsigned LEB128 varints, as used for string lengths in both file formats.

use std::io::Read;

use crate::error::DecodeError;

/// Largest shift that still lands inside a `u64`.
const MAX_SHIFT: u32 = 63;

/// Decode one varint from `reader`, one byte at a time.
///
/// Fails with [`DecodeError::MalformedVarInt`] as soon as the encoding would
/// need more than 64 bits, so hostile input can never spin or wrap silently.
pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        let byte = byte[0];

        // only the lowest bit of the tenth byte still fits
        if shift == MAX_SHIFT && byte > 1 {
            return Err(DecodeError::MalformedVarInt);
        }

        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }

        shift += 7;
        if shift > MAX_SHIFT {
            return Err(DecodeError::MalformedVarInt);
        }
    }
}

/// Encode `value`; always emits at least one byte.
pub fn encode(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out;
        }
    }
}
