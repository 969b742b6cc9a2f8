//! Decoder for the collection index (`collection.db`).
//!
//! ```text
//! i32 version, i32 group count,
//! group count × (string name, i32 item count, item count × string)
//! ```
//!
//! Items are opaque strings that embed a content hash; anything that does not
//! contain one is ignored.

use std::collections::HashSet;
use std::io::Read;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{DecodeError, Error, Location, Result};
use crate::reader::PrimitiveReader;

static HASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-f0-9]{32}").unwrap());

const MAX_GROUPS: usize = 1 << 20;
const MAX_ITEMS: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGroup {
    pub name: String,
    pub hashes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub version: i32,
    pub groups: Vec<IndexGroup>,
}

impl Index {
    /// Union of every group's hashes.
    pub fn hashes(&self) -> HashSet<String> {
        self.groups
            .iter()
            .flat_map(|g| g.hashes.iter().cloned())
            .collect()
    }
}

/// Every content hash embedded in `item`.
pub fn extract_hashes(item: &str) -> impl Iterator<Item = &str> {
    HASH_REGEX.find_iter(item).map(|m| m.as_str())
}

pub fn decode_index<R: Read>(inner: R) -> Result<Index> {
    let mut reader = PrimitiveReader::new(inner);
    let (version, group_count) =
        read_header(&mut reader).map_err(Error::index(Location::Header))?;

    let mut groups = Vec::with_capacity(group_count.min(1024));
    for i in 0..group_count {
        let group = read_group(&mut reader).map_err(Error::index(Location::Group(i)))?;
        debug!(name = %group.name, hashes = group.hashes.len(), "index group");
        groups.push(group);
    }

    Ok(Index { version, groups })
}

fn read_header<R: Read>(
    reader: &mut PrimitiveReader<R>,
) -> std::result::Result<(i32, usize), DecodeError> {
    Ok((reader.read_i32()?, reader.read_count(MAX_GROUPS)?))
}

fn read_group<R: Read>(
    reader: &mut PrimitiveReader<R>,
) -> std::result::Result<IndexGroup, DecodeError> {
    let name = reader.read_string(false)?;
    let count = reader.read_count(MAX_ITEMS)?;

    let mut hashes = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let item = reader.read_string(false)?;
        hashes.extend(extract_hashes(&item).map(str::to_owned));
    }
    Ok(IndexGroup { name, hashes })
}
