//! Error types for mapsync-db.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading a single primitive from the byte stream.
///
/// None of these are recoverable: the formats are linear, so once a read
/// fails every later offset is meaningless.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stream ended before the value was complete")]
    TruncatedStream,

    #[error("varint does not fit in 64 bits")]
    MalformedVarInt,

    #[error("string length {len} exceeds the {max} byte ceiling")]
    StringTooLong { len: u64, max: u64 },

    #[error("string is not valid UTF-8")]
    InvalidEncoding,

    #[error("unknown string indicator 0x{0:02x}")]
    UnknownIndicator(u8),

    #[error("invalid element count {0}")]
    InvalidCount(i32),

    #[error("read failed: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::TruncatedStream,
            _ => DecodeError::Io(e),
        }
    }
}

/// Where in a file a decode failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Header,
    Record(usize),
    Group(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Header => write!(f, "header"),
            Location::Record(i) => write!(f, "record {i}"),
            Location::Group(i) => write!(f, "group {i}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt catalog at {at}: {source}")]
    CorruptCatalog {
        at: Location,
        #[source]
        source: DecodeError,
    },

    #[error("corrupt index at {at}: {source}")]
    CorruptIndex {
        at: Location,
        #[source]
        source: DecodeError,
    },
}

impl Error {
    pub(crate) fn catalog(at: Location) -> impl FnOnce(DecodeError) -> Self {
        move |source| Error::CorruptCatalog { at, source }
    }

    pub(crate) fn index(at: Location) -> impl FnOnce(DecodeError) -> Self {
        move |source| Error::CorruptIndex { at, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
