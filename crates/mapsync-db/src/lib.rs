//! Decoders for the local beatmap catalog and the collection index.
//!
//! # Architecture
//!
//! - [`varint`] - LEB128 lengths shared by both formats
//! - [`reader`] - little-endian primitives and tagged strings
//! - [`catalog`] - version-gated record walker with full and hash-only modes
//! - [`index`] - collection groups and their embedded content hashes
//! - [`difference`] - wanted minus present
//!
//! Decoding is synchronous and single pass. Any structural failure aborts the
//! whole file; a half-decoded catalog is never returned.

pub mod catalog;
mod diff;
mod error;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod index;
pub mod reader;
pub mod varint;

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

pub use catalog::{Catalog, CatalogDecoder, CatalogHeader, Difficulty, Rating, RecordGroup};
pub use diff::difference;
pub use error::{DecodeError, Error, Location, Result};
pub use index::{Index, IndexGroup, decode_index};
pub use reader::PrimitiveReader;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode the full catalog at `path`.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    CatalogDecoder::new(open(path.as_ref())?)?.decode()
}

/// Content hashes of every record in the catalog at `path`.
pub fn read_catalog_hashes(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    CatalogDecoder::new(open(path.as_ref())?)?.decode_hashes()
}

pub fn read_index(path: impl AsRef<Path>) -> Result<Index> {
    decode_index(open(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_index(dir.path().join("collection.db")).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }
}
