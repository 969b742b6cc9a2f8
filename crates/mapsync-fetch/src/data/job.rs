use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseVariantError;

/// Extension of every downloaded archive.
pub const ARCHIVE_EXT: &str = "osz";

/// Which cut of a set the mirror should deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Everything, video included.
    #[default]
    Full,
    NoVideo,
    /// Beatmap files only.
    Mini,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::NoVideo, Variant::Mini];

    /// Path segment the mirrors expect.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::NoVideo => "novideo",
            Variant::Mini => "mini",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}

/// One set to place into `target_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchJob {
    pub set_id: u64,
    pub target_dir: PathBuf,
}

impl FetchJob {
    pub fn new(set_id: u64, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            set_id,
            target_dir: target_dir.into(),
        }
    }

    /// `<id>.osz`, used when the response names no file.
    pub fn default_file_name(&self) -> String {
        format!("{}.{ARCHIVE_EXT}", self.set_id)
    }

    pub fn default_path(&self) -> PathBuf {
        self.target_dir.join(self.default_file_name())
    }

    /// Staging file the body streams into before commit.
    pub fn staging_path(&self) -> PathBuf {
        self.target_dir.join(format!("{}.tmp", self.default_file_name()))
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        Path::new(&self.target_dir).join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parse() {
        assert_eq!("full".parse::<Variant>(), Ok(Variant::Full));
        assert_eq!(" NoVideo ".parse::<Variant>(), Ok(Variant::NoVideo));
        assert_eq!("mini".parse::<Variant>(), Ok(Variant::Mini));
        assert_eq!(
            "lite".parse::<Variant>(),
            Err(ParseVariantError("lite".into()))
        );
    }

    #[test]
    fn test_variant_display_round_trip() {
        for v in Variant::ALL {
            assert_eq!(v.to_string().parse::<Variant>(), Ok(v));
        }
    }

    #[test]
    fn test_job_paths() {
        let job = FetchJob::new(42, "/songs");
        assert_eq!(job.default_path(), PathBuf::from("/songs/42.osz"));
        assert_eq!(job.staging_path(), PathBuf::from("/songs/42.osz.tmp"));
        assert_eq!(
            job.path_for("42 A - B.osz"),
            PathBuf::from("/songs/42 A - B.osz")
        );
    }
}
