//! Little-endian primitive reads over a buffered byte stream.

use std::io::{self, BufRead, BufReader, Read};

use crate::error::DecodeError;
use crate::varint;

/// Ceiling for a single string; anything longer is treated as corruption.
pub const MAX_STRING_LEN: u64 = 1024 * 1024;

const INDICATOR_ABSENT: u8 = 0x00;
const INDICATOR_PRESENT: u8 = 0x0b;

/// Fixed-width scalar kinds found in both formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    U8,
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    pub const fn width(self) -> u64 {
        match self {
            ScalarKind::U8 | ScalarKind::Bool => 1,
            ScalarKind::I16 => 2,
            ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }
}

/// A scalar value read by [`PrimitiveReader::read_scalar`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    U8(u8),
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

/// Sequential reader that tracks how many bytes it has consumed.
///
/// After any error the position is left after whatever was consumed; the
/// reader should be discarded rather than reused.
pub struct PrimitiveReader<R> {
    inner: BufReader<R>,
    position: u64,
}

impl<R: Read> PrimitiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(64 * 1024, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, inner),
            position: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// `true` when the underlying stream has no more bytes.
    pub fn is_at_end(&mut self) -> Result<bool, DecodeError> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    pub fn read_scalar(&mut self, kind: ScalarKind) -> Result<Scalar, DecodeError> {
        Ok(match kind {
            ScalarKind::U8 => Scalar::U8(self.read_u8()?),
            ScalarKind::Bool => Scalar::Bool(self.read_bool()?),
            ScalarKind::I16 => Scalar::I16(self.read_i16()?),
            ScalarKind::I32 => Scalar::I32(self.read_i32()?),
            ScalarKind::I64 => Scalar::I64(self.read_i64()?),
            ScalarKind::F32 => Scalar::F32(self.read_f32()?),
            ScalarKind::F64 => Scalar::F64(self.read_f64()?),
        })
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        varint::decode(self)
    }

    /// Read an `i32` element count, rejecting negatives and anything above `max`.
    pub fn read_count(&mut self, max: usize) -> Result<usize, DecodeError> {
        let raw = self.read_i32()?;
        match usize::try_from(raw) {
            Ok(n) if n <= max => Ok(n),
            _ => Err(DecodeError::InvalidCount(raw)),
        }
    }

    /// Discard exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<(), DecodeError> {
        let copied = io::copy(&mut self.by_ref().take(n), &mut io::sink())?;
        if copied < n {
            return Err(DecodeError::TruncatedStream);
        }
        Ok(())
    }

    /// Read an indicator-tagged string.
    ///
    /// With `skip_content` the bytes are discarded unchecked and an empty
    /// string is returned; the cursor ends up in the same place either way.
    pub fn read_string(&mut self, skip_content: bool) -> Result<String, DecodeError> {
        match self.read_u8()? {
            INDICATOR_ABSENT => Ok(String::new()),
            INDICATOR_PRESENT => {
                let len = self.read_varint()?;
                if len > MAX_STRING_LEN {
                    return Err(DecodeError::StringTooLong {
                        len,
                        max: MAX_STRING_LEN,
                    });
                }
                if skip_content {
                    self.skip(len)?;
                    return Ok(String::new());
                }
                let mut bytes = vec![0u8; len as usize];
                self.read_exact(&mut bytes)?;
                String::from_utf8(bytes).map_err(|_| DecodeError::InvalidEncoding)
            }
            other => Err(DecodeError::UnknownIndicator(other)),
        }
    }

    pub fn skip_string(&mut self) -> Result<(), DecodeError> {
        self.read_string(true).map(drop)
    }
}

impl<R: Read> Read for PrimitiveReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}
