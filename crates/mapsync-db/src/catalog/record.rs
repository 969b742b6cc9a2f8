use super::layout::STAR_TABLES;

/// A difficulty setting stored either as a whole byte (old catalogs) or as a float.
///
/// The representation is fixed when the record is decoded and never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    Byte(u8),
    Float(f32),
}

impl Default for Rating {
    fn default() -> Self {
        Rating::Float(0.0)
    }
}

/// Game modes, in the order their star-rating tables appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Standard,
    Taiko,
    Catch,
    Mania,
}

impl GameMode {
    pub const ALL: [GameMode; STAR_TABLES] = [
        GameMode::Standard,
        GameMode::Taiko,
        GameMode::Catch,
        GameMode::Mania,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarRating {
    pub mods: i32,
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingPoint {
    pub bpm: f64,
    pub offset: f64,
    pub uninherited: bool,
}

/// One difficulty from the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Difficulty {
    pub artist: String,
    pub artist_unicode: String,
    pub title: String,
    pub title_unicode: String,
    pub mapper: String,
    pub label: String,
    pub audio_file: String,
    /// Content hash, 32 lowercase hex characters.
    pub hash: String,
    /// Name of the `.osu` file inside the set folder.
    pub path: String,
    pub ranked_status: u8,
    pub circles: i16,
    pub sliders: i16,
    pub spinners: i16,
    pub modified: i64,
    pub approach_rate: Rating,
    pub circle_size: Rating,
    pub hp_drain: Rating,
    pub overall_difficulty: Rating,
    pub slider_velocity: f64,
    pub star_ratings: [Vec<StarRating>; STAR_TABLES],
    pub drain_time: i32,
    pub total_time: i32,
    pub preview_time: i32,
    pub timing_points: Vec<TimingPoint>,
    pub beatmap_id: i32,
    pub set_id: i32,
    pub thread_id: i32,
    pub grades: [u8; 4],
    pub local_offset: i16,
    pub stack_leniency: f32,
    pub mode: u8,
    pub source: String,
    pub tags: String,
    pub online_offset: i16,
    pub title_font: String,
    pub unplayed: bool,
    pub last_played: i64,
    pub is_osz2: bool,
    pub folder: String,
    pub last_checked: i64,
    pub ignore_sound: bool,
    pub ignore_skin: bool,
    pub disable_storyboard: bool,
    pub disable_video: bool,
    pub visual_override: bool,
    pub last_modification: i32,
    pub mania_scroll_speed: u8,
}

impl Difficulty {
    pub fn star_ratings(&self, mode: GameMode) -> &[StarRating] {
        &self.star_ratings[mode as usize]
    }

    /// Star rating without mods for `mode`, if the table has one.
    pub fn nomod_stars(&self, mode: GameMode) -> Option<f64> {
        self.star_ratings(mode)
            .iter()
            .find(|s| s.mods == 0)
            .map(|s| s.rating)
    }
}

/// All difficulties sharing one set identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub set_id: i32,
    pub records: Vec<Difficulty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nomod_stars() {
        let mut d = Difficulty::default();
        d.star_ratings[GameMode::Taiko as usize] = vec![
            StarRating { mods: 64, rating: 5.1 },
            StarRating { mods: 0, rating: 3.2 },
        ];
        assert_eq!(d.nomod_stars(GameMode::Taiko), Some(3.2));
        assert_eq!(d.nomod_stars(GameMode::Standard), None);
    }
}
