//! Version-gated record layout.
//!
//! The catalog format evolved in place, so the byte layout of a record is a
//! function of the header version. Each [`Gate`] is one historical change;
//! a [`FormatPlan`] is the result of applying every gate a version has
//! passed, and [`FormatPlan::fields`] expands it to the exact field order.
//! Both decode modes walk the same field list.

use crate::reader::ScalarKind;

/// One layout change introduced at a given format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// AR/CS/HP/OD widen from `u8` to `f32`; the trailing legacy short goes away.
    FloatDifficulty,
    /// The per-record byte-length prefix is dropped.
    NoEntrySize,
    /// Star-rating values narrow from `f64` to `f32`.
    FloatStarRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub since: i32,
    pub change: Change,
}

/// Ordered oldest first. Supporting a new format version means adding a row.
pub const GATES: &[Gate] = &[
    Gate {
        since: 20140609,
        change: Change::FloatDifficulty,
    },
    Gate {
        since: 20191106,
        change: Change::NoEntrySize,
    },
    Gate {
        since: 20250107,
        change: Change::FloatStarRating,
    },
];

/// Storage width of the four difficulty settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingWidth {
    Byte,
    Float,
}

/// Field plan for one format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPlan {
    pub version: i32,
    pub entry_size: bool,
    pub difficulty: RatingWidth,
    pub star_rating: ScalarKind,
    pub legacy_short: bool,
}

impl FormatPlan {
    /// Layout of the oldest known version, before any gate applies.
    const BASE: FormatPlan = FormatPlan {
        version: 0,
        entry_size: true,
        difficulty: RatingWidth::Byte,
        star_rating: ScalarKind::F64,
        legacy_short: true,
    };

    pub fn for_version(version: i32) -> Self {
        GATES
            .iter()
            .filter(|gate| version >= gate.since)
            .fold(FormatPlan { version, ..Self::BASE }, |plan, gate| plan.apply(gate.change))
    }

    fn apply(self, change: Change) -> Self {
        match change {
            Change::FloatDifficulty => FormatPlan {
                difficulty: RatingWidth::Float,
                legacy_short: false,
                ..self
            },
            Change::NoEntrySize => FormatPlan {
                entry_size: false,
                ..self
            },
            Change::FloatStarRating => FormatPlan {
                star_rating: ScalarKind::F32,
                ..self
            },
        }
    }

    /// Every field of one record, in stream order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(64);
        if self.entry_size {
            fields.push(Field::EntrySize);
        }
        fields.extend_from_slice(&Field::IDENTITY);
        fields.extend_from_slice(&Field::TIMING);
        fields.extend_from_slice(&Field::ONLINE);
        if self.legacy_short {
            fields.push(Field::LegacyShort);
        }
        fields.extend_from_slice(&Field::TRAILER);
        fields
    }

    /// Byte width of one star-rating entry: tag, mods, tag, rating.
    pub fn star_entry_width(&self) -> u64 {
        1 + 4 + 1 + self.star_rating.width()
    }

    pub fn difficulty_kind(&self) -> ScalarKind {
        match self.difficulty {
            RatingWidth::Byte => ScalarKind::U8,
            RatingWidth::Float => ScalarKind::F32,
        }
    }
}

/// Number of per-mode star-rating tables in every record.
pub const STAR_TABLES: usize = 4;

/// Bytes in one timing point: bpm, offset, uninherited flag.
pub const TIMING_POINT_WIDTH: u64 = 8 + 8 + 1;

/// Upper bound on timing points per record.
pub const MAX_TIMING_POINTS: usize = 100_000;

/// Upper bound on entries in one star-rating table.
pub const MAX_STAR_RATINGS: usize = 4096;

/// How a field is laid out in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    Scalar(ScalarKind),
    /// AR/CS/HP/OD: width decided by [`FormatPlan::difficulty`].
    Difficulty,
    Grades,
    StarRatings,
    TimingPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    EntrySize,
    Artist,
    ArtistUnicode,
    Title,
    TitleUnicode,
    Creator,
    Difficulty,
    AudioFile,
    Hash,
    OsuFile,
    RankedStatus,
    Circles,
    Sliders,
    Spinners,
    Modified,
    ApproachRate,
    CircleSize,
    HpDrain,
    OverallDifficulty,
    SliderVelocity,
    StarRatings,
    DrainTime,
    TotalTime,
    PreviewTime,
    TimingPoints,
    BeatmapId,
    SetId,
    ThreadId,
    Grades,
    LocalOffset,
    StackLeniency,
    Mode,
    Source,
    Tags,
    OnlineOffset,
    TitleFont,
    Unplayed,
    LastPlayed,
    IsOsz2,
    Folder,
    LastChecked,
    IgnoreSound,
    IgnoreSkin,
    DisableStoryboard,
    DisableVideo,
    VisualOverride,
    LegacyShort,
    LastModification,
    ManiaScrollSpeed,
}

impl Field {
    const IDENTITY: [Field; 19] = [
        Field::Artist,
        Field::ArtistUnicode,
        Field::Title,
        Field::TitleUnicode,
        Field::Creator,
        Field::Difficulty,
        Field::AudioFile,
        Field::Hash,
        Field::OsuFile,
        Field::RankedStatus,
        Field::Circles,
        Field::Sliders,
        Field::Spinners,
        Field::Modified,
        Field::ApproachRate,
        Field::CircleSize,
        Field::HpDrain,
        Field::OverallDifficulty,
        Field::SliderVelocity,
    ];

    const TIMING: [Field; 5] = [
        Field::StarRatings,
        Field::DrainTime,
        Field::TotalTime,
        Field::PreviewTime,
        Field::TimingPoints,
    ];

    const ONLINE: [Field; 21] = [
        Field::BeatmapId,
        Field::SetId,
        Field::ThreadId,
        Field::Grades,
        Field::LocalOffset,
        Field::StackLeniency,
        Field::Mode,
        Field::Source,
        Field::Tags,
        Field::OnlineOffset,
        Field::TitleFont,
        Field::Unplayed,
        Field::LastPlayed,
        Field::IsOsz2,
        Field::Folder,
        Field::LastChecked,
        Field::IgnoreSound,
        Field::IgnoreSkin,
        Field::DisableStoryboard,
        Field::DisableVideo,
        Field::VisualOverride,
    ];

    const TRAILER: [Field; 2] = [Field::LastModification, Field::ManiaScrollSpeed];

    pub fn kind(self) -> Kind {
        use ScalarKind::*;
        match self {
            Field::Artist
            | Field::ArtistUnicode
            | Field::Title
            | Field::TitleUnicode
            | Field::Creator
            | Field::Difficulty
            | Field::AudioFile
            | Field::Hash
            | Field::OsuFile
            | Field::Source
            | Field::Tags
            | Field::TitleFont
            | Field::Folder => Kind::Str,

            Field::ApproachRate
            | Field::CircleSize
            | Field::HpDrain
            | Field::OverallDifficulty => Kind::Difficulty,

            Field::Grades => Kind::Grades,
            Field::StarRatings => Kind::StarRatings,
            Field::TimingPoints => Kind::TimingPoints,

            Field::RankedStatus | Field::Mode | Field::ManiaScrollSpeed => Kind::Scalar(U8),
            Field::Unplayed
            | Field::IsOsz2
            | Field::IgnoreSound
            | Field::IgnoreSkin
            | Field::DisableStoryboard
            | Field::DisableVideo
            | Field::VisualOverride => Kind::Scalar(Bool),
            Field::Circles
            | Field::Sliders
            | Field::Spinners
            | Field::LocalOffset
            | Field::OnlineOffset
            | Field::LegacyShort => Kind::Scalar(I16),
            Field::EntrySize
            | Field::DrainTime
            | Field::TotalTime
            | Field::PreviewTime
            | Field::BeatmapId
            | Field::SetId
            | Field::ThreadId
            | Field::LastModification => Kind::Scalar(I32),
            Field::Modified | Field::LastPlayed | Field::LastChecked => Kind::Scalar(I64),
            Field::StackLeniency => Kind::Scalar(F32),
            Field::SliderVelocity => Kind::Scalar(F64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_old_version() {
        let plan = FormatPlan::for_version(20140101);
        assert!(plan.entry_size);
        assert!(plan.legacy_short);
        assert_eq!(plan.difficulty, RatingWidth::Byte);
        assert_eq!(plan.star_rating, ScalarKind::F64);
    }

    #[test]
    fn test_plan_gate_boundaries() {
        let plan = FormatPlan::for_version(20140609);
        assert_eq!(plan.difficulty, RatingWidth::Float);
        assert!(!plan.legacy_short);
        assert!(plan.entry_size);

        let plan = FormatPlan::for_version(20191105);
        assert!(plan.entry_size);
        let plan = FormatPlan::for_version(20191106);
        assert!(!plan.entry_size);
        assert_eq!(plan.star_rating, ScalarKind::F64);

        let plan = FormatPlan::for_version(20250107);
        assert_eq!(plan.star_rating, ScalarKind::F32);
        assert_eq!(plan.star_entry_width(), 10);
    }

    #[test]
    fn test_fields_follow_plan() {
        let old = FormatPlan::for_version(20130101).fields();
        assert_eq!(old.first(), Some(&Field::EntrySize));
        assert!(old.contains(&Field::LegacyShort));

        let new = FormatPlan::for_version(20250107).fields();
        assert_eq!(new.first(), Some(&Field::Artist));
        assert!(!new.contains(&Field::LegacyShort));
        assert_eq!(new.last(), Some(&Field::ManiaScrollSpeed));
        assert_eq!(old.len(), new.len() + 2);
    }

    #[test]
    fn test_set_id_follows_beatmap_id() {
        let fields = FormatPlan::for_version(20250107).fields();
        let pos = fields.iter().position(|f| *f == Field::SetId).unwrap();
        assert_eq!(fields[pos - 1], Field::BeatmapId);
        assert_eq!(fields[pos - 2], Field::TimingPoints);
    }
}
