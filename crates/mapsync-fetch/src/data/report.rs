use std::path::PathBuf;
use std::time::Duration;

use crate::error::FetchError;

/// How a job was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Fetched and committed to this path.
    Downloaded(PathBuf),
    /// A matching archive was already on disk.
    Skipped(PathBuf),
}

#[derive(Debug)]
pub struct JobOutcome {
    pub set_id: u64,
    pub result: Result<JobStatus, FetchError>,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self.result, Ok(JobStatus::Downloaded(_)))
    }
}

/// Counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Summary::default(), |mut acc, o| {
                match &o.result {
                    Ok(JobStatus::Downloaded(_)) => acc.downloaded += 1,
                    Ok(JobStatus::Skipped(_)) => acc.skipped += 1,
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}
