//! Streaming decoder for the local beatmap catalog (`osu!.db`).
//!
//! # Layout
//!
//! ```text
//! header:  i32 version, i32 folders, bool unlocked, i64 unlock date,
//!          string player, i32 record count
//! records: record count × record (see [`layout`])
//! trailer: optional i32 permissions
//! ```
//!
//! The decoder is a single forward pass. It offers two modes over the same
//! field list: [`CatalogDecoder::next_record`] materializes every field and
//! [`CatalogDecoder::next_hash`] skips everything except the content hash.

pub mod layout;
mod record;

use std::collections::{HashMap, HashSet};
use std::io::Read;

use tracing::{debug, warn};

use crate::error::{DecodeError, Error, Location, Result};
use crate::reader::{PrimitiveReader, ScalarKind};

use layout::{
    Field, FormatPlan, Kind, MAX_STAR_RATINGS, MAX_TIMING_POINTS, STAR_TABLES, TIMING_POINT_WIDTH,
};
pub use record::{Difficulty, GameMode, Rating, RecordGroup, StarRating, TimingPoint};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogHeader {
    pub version: i32,
    pub folder_count: i32,
    pub account_unlocked: bool,
    pub unlock_date: i64,
    pub player_name: String,
    pub record_count: usize,
}

/// A fully decoded catalog, grouped by set identifier.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub header: CatalogHeader,
    pub groups: Vec<RecordGroup>,
    pub permissions: Option<i32>,
    /// The stream ended on a record boundary before the declared count.
    pub truncated: bool,
}

impl Catalog {
    pub fn records(&self) -> impl Iterator<Item = &Difficulty> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    pub fn hashes(&self) -> HashSet<String> {
        self.records().map(|r| r.hash.clone()).collect()
    }
}

pub struct CatalogDecoder<R> {
    reader: PrimitiveReader<R>,
    header: CatalogHeader,
    plan: FormatPlan,
    fields: Vec<Field>,
    next: usize,
    truncated: bool,
}

impl<R: Read> CatalogDecoder<R> {
    /// Read the header and prepare the field plan for its version.
    pub fn new(inner: R) -> Result<Self> {
        let mut reader = PrimitiveReader::new(inner);
        let header = read_header(&mut reader).map_err(Error::catalog(Location::Header))?;
        let plan = FormatPlan::for_version(header.version);
        debug!(
            version = header.version,
            records = header.record_count,
            "catalog header"
        );

        Ok(Self {
            reader,
            fields: plan.fields(),
            plan,
            header,
            next: 0,
            truncated: false,
        })
    }

    pub fn header(&self) -> &CatalogHeader {
        &self.header
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// `true` once the stream ended early on a record boundary.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Decode the next record with every field populated.
    pub fn next_record(&mut self) -> Result<Option<Difficulty>> {
        let Some(index) = self.begin_record()? else {
            return Ok(None);
        };

        let mut record = Difficulty::default();
        for i in 0..self.fields.len() {
            let field = self.fields[i];
            self.read_field(field, &mut record)
                .map_err(Error::catalog(Location::Record(index)))?;
        }
        self.next += 1;
        Ok(Some(record))
    }

    /// Decode the next record, keeping only its content hash.
    pub fn next_hash(&mut self) -> Result<Option<String>> {
        let Some(index) = self.begin_record()? else {
            return Ok(None);
        };

        let mut hash = String::new();
        for i in 0..self.fields.len() {
            let field = self.fields[i];
            if field == Field::Hash {
                hash = self
                    .reader
                    .read_string(false)
                    .map_err(Error::catalog(Location::Record(index)))?;
            } else {
                self.skip_field(field)
                    .map_err(Error::catalog(Location::Record(index)))?;
            }
        }
        self.next += 1;
        Ok(Some(hash))
    }

    /// Decode every record and group them by set identifier.
    pub fn decode(mut self) -> Result<Catalog> {
        let mut records = Vec::with_capacity(self.header.record_count.min(1 << 16));
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        let permissions = self.read_trailer();

        Ok(Catalog {
            groups: group_by_set(records),
            header: self.header,
            permissions,
            truncated: self.truncated,
        })
    }

    /// Collect only the content hashes.
    pub fn decode_hashes(mut self) -> Result<HashSet<String>> {
        let mut hashes = HashSet::with_capacity(self.header.record_count.min(1 << 16));
        while let Some(hash) = self.next_hash()? {
            hashes.insert(hash);
        }
        Ok(hashes)
    }

    /// Returns the index of the record about to be read, or `None` when done.
    fn begin_record(&mut self) -> Result<Option<usize>> {
        let index = self.next;
        if self.truncated || index >= self.header.record_count {
            return Ok(None);
        }
        let at_end = self
            .reader
            .is_at_end()
            .map_err(Error::catalog(Location::Record(index)))?;
        if at_end {
            warn!(
                decoded = index,
                declared = self.header.record_count,
                "catalog ended early, keeping the records read so far"
            );
            self.truncated = true;
            return Ok(None);
        }
        Ok(Some(index))
    }

    fn read_trailer(&mut self) -> Option<i32> {
        if self.truncated || self.reader.is_at_end().unwrap_or(true) {
            return None;
        }
        match self.reader.read_i32() {
            Ok(permissions) => Some(permissions),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable catalog trailer");
                None
            }
        }
    }

    fn skip_field(&mut self, field: Field) -> std::result::Result<(), DecodeError> {
        let r = &mut self.reader;
        match field.kind() {
            Kind::Str => r.skip_string(),
            Kind::Scalar(kind) => r.skip(kind.width()),
            Kind::Difficulty => r.skip(self.plan.difficulty_kind().width()),
            Kind::Grades => r.skip(4),
            Kind::StarRatings => {
                for _ in 0..STAR_TABLES {
                    let n = r.read_count(MAX_STAR_RATINGS)?;
                    r.skip(n as u64 * self.plan.star_entry_width())?;
                }
                Ok(())
            }
            Kind::TimingPoints => {
                let n = r.read_count(MAX_TIMING_POINTS)?;
                r.skip(n as u64 * TIMING_POINT_WIDTH)
            }
        }
    }

    fn read_field(
        &mut self,
        field: Field,
        rec: &mut Difficulty,
    ) -> std::result::Result<(), DecodeError> {
        let start = self.reader.position();
        let r = &mut self.reader;
        match field {
            Field::EntrySize | Field::LegacyShort => {
                self.skip_field(field)?;
            }
            Field::Artist => rec.artist = r.read_string(false)?,
            Field::ArtistUnicode => rec.artist_unicode = r.read_string(false)?,
            Field::Title => rec.title = r.read_string(false)?,
            Field::TitleUnicode => rec.title_unicode = r.read_string(false)?,
            Field::Creator => rec.mapper = r.read_string(false)?,
            Field::Difficulty => rec.label = r.read_string(false)?,
            Field::AudioFile => rec.audio_file = r.read_string(false)?,
            Field::Hash => rec.hash = r.read_string(false)?,
            Field::OsuFile => rec.path = r.read_string(false)?,
            Field::RankedStatus => rec.ranked_status = r.read_u8()?,
            Field::Circles => rec.circles = r.read_i16()?,
            Field::Sliders => rec.sliders = r.read_i16()?,
            Field::Spinners => rec.spinners = r.read_i16()?,
            Field::Modified => rec.modified = r.read_i64()?,
            Field::ApproachRate => rec.approach_rate = self.read_rating()?,
            Field::CircleSize => rec.circle_size = self.read_rating()?,
            Field::HpDrain => rec.hp_drain = self.read_rating()?,
            Field::OverallDifficulty => rec.overall_difficulty = self.read_rating()?,
            Field::SliderVelocity => rec.slider_velocity = r.read_f64()?,
            Field::StarRatings => {
                let star_kind = self.plan.star_rating;
                for table in rec.star_ratings.iter_mut() {
                    let n = r.read_count(MAX_STAR_RATINGS)?;
                    table.reserve(n);
                    for _ in 0..n {
                        r.read_u8()?;
                        let mods = r.read_i32()?;
                        r.read_u8()?;
                        let rating = match star_kind {
                            ScalarKind::F32 => f64::from(r.read_f32()?),
                            _ => r.read_f64()?,
                        };
                        table.push(StarRating { mods, rating });
                    }
                }
            }
            Field::DrainTime => rec.drain_time = r.read_i32()?,
            Field::TotalTime => rec.total_time = r.read_i32()?,
            Field::PreviewTime => rec.preview_time = r.read_i32()?,
            Field::TimingPoints => {
                let n = r.read_count(MAX_TIMING_POINTS)?;
                rec.timing_points.reserve(n);
                for _ in 0..n {
                    rec.timing_points.push(TimingPoint {
                        bpm: r.read_f64()?,
                        offset: r.read_f64()?,
                        uninherited: r.read_bool()?,
                    });
                }
            }
            Field::BeatmapId => rec.beatmap_id = r.read_i32()?,
            Field::SetId => rec.set_id = r.read_i32()?,
            Field::ThreadId => rec.thread_id = r.read_i32()?,
            Field::Grades => {
                for grade in rec.grades.iter_mut() {
                    *grade = r.read_u8()?;
                }
            }
            Field::LocalOffset => rec.local_offset = r.read_i16()?,
            Field::StackLeniency => rec.stack_leniency = r.read_f32()?,
            Field::Mode => rec.mode = r.read_u8()?,
            Field::Source => rec.source = r.read_string(false)?,
            Field::Tags => rec.tags = r.read_string(false)?,
            Field::OnlineOffset => rec.online_offset = r.read_i16()?,
            Field::TitleFont => rec.title_font = r.read_string(false)?,
            Field::Unplayed => rec.unplayed = r.read_bool()?,
            Field::LastPlayed => rec.last_played = r.read_i64()?,
            Field::IsOsz2 => rec.is_osz2 = r.read_bool()?,
            Field::Folder => rec.folder = r.read_string(false)?,
            Field::LastChecked => rec.last_checked = r.read_i64()?,
            Field::IgnoreSound => rec.ignore_sound = r.read_bool()?,
            Field::IgnoreSkin => rec.ignore_skin = r.read_bool()?,
            Field::DisableStoryboard => rec.disable_storyboard = r.read_bool()?,
            Field::DisableVideo => rec.disable_video = r.read_bool()?,
            Field::VisualOverride => rec.visual_override = r.read_bool()?,
            Field::LastModification => rec.last_modification = r.read_i32()?,
            Field::ManiaScrollSpeed => rec.mania_scroll_speed = r.read_u8()?,
        }

        if let Kind::Scalar(kind) = field.kind() {
            debug_assert_eq!(self.reader.position() - start, kind.width(), "{field:?}");
        }
        Ok(())
    }

    fn read_rating(&mut self) -> std::result::Result<Rating, DecodeError> {
        Ok(match self.plan.difficulty_kind() {
            ScalarKind::U8 => Rating::Byte(self.reader.read_u8()?),
            _ => Rating::Float(self.reader.read_f32()?),
        })
    }
}

fn read_header<R: Read>(
    reader: &mut PrimitiveReader<R>,
) -> std::result::Result<CatalogHeader, DecodeError> {
    Ok(CatalogHeader {
        version: reader.read_i32()?,
        folder_count: reader.read_i32()?,
        account_unlocked: reader.read_bool()?,
        unlock_date: reader.read_i64()?,
        player_name: reader.read_string(false)?,
        record_count: reader.read_count(i32::MAX as usize)?,
    })
}

/// Group records by set identifier, keeping decode order inside each group.
pub fn group_by_set(records: Vec<Difficulty>) -> Vec<RecordGroup> {
    let mut order = Vec::new();
    let mut groups: HashMap<i32, Vec<Difficulty>> = HashMap::new();
    for record in records {
        let set_id = record.set_id;
        groups
            .entry(set_id)
            .or_insert_with(|| {
                order.push(set_id);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .filter_map(|set_id| {
            groups
                .remove(&set_id)
                .map(|records| RecordGroup { set_id, records })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(set_id: i32, hash: &str) -> Difficulty {
        Difficulty {
            set_id,
            hash: hash.to_string(),
            ..Difficulty::default()
        }
    }

    #[test]
    fn test_group_by_set_keeps_order_within_group() {
        let groups = group_by_set(vec![
            record(1, "a"),
            record(2, "b"),
            record(1, "c"),
        ]);
        assert_eq!(groups.len(), 2);
        let one = groups.iter().find(|g| g.set_id == 1).unwrap();
        let hashes: Vec<_> = one.records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["a", "c"]);
    }

    #[test]
    fn test_header_truncated() {
        let bytes = 20250107i32.to_le_bytes();
        let err = CatalogDecoder::new(&bytes[..]).err().unwrap();
        assert!(matches!(
            err,
            Error::CorruptCatalog {
                at: Location::Header,
                source: DecodeError::TruncatedStream
            }
        ));
    }
}
