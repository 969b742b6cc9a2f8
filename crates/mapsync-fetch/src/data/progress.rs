use super::options::FetchPhase;

/// State of one job, handed to the progress callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub set_id: u64,

    pub phase: FetchPhase,

    /// Bytes written to the staging file so far.
    pub bytes_downloaded: u64,

    /// From Content-Length, when the mirror sends one.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub(crate) fn new(set_id: u64, phase: FetchPhase) -> Self {
        Self {
            set_id,
            phase,
            bytes_downloaded: 0,
            total_bytes: None,
        }
    }

    /// Returns `None` if `total_bytes` is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.phase == FetchPhase::Completed { 100.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }
}
