use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::job::Variant;
use super::progress::Progress;

/// Mirror used when none is configured.
pub const DEFAULT_MIRROR: &str = "https://dl.sayobot.cn/beatmaps/download/{variant}/{id}";

/// Phases of a single download.
///
/// Connecting → Downloading → Committing → Completed. A job that moves on to
/// the next mirror starts again at Connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Waiting for the rate gate and the response headers.
    #[default]
    Connecting,

    /// Streaming the body into the staging file.
    Downloading,

    /// Renaming the staging file to its final name.
    Committing,

    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Configuration for a download run.
///
/// # Examples
///
/// ```
/// use mapsync_fetch::{FetchOptions, Variant};
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .workers(8)
///     .delay(Duration::from_millis(500))
///     .variant(Variant::NoVideo);
/// assert_eq!(options.workers, 8);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Size of the worker pool. Never below 1.
    ///
    /// Default: 5
    pub workers: usize,

    /// Minimum spacing between one download and the start of the next,
    /// shared by every worker.
    ///
    /// Default: 1s
    pub delay: Duration,

    /// Default: [`Variant::Full`]
    pub variant: Variant,

    /// URL templates tried in order. `{variant}` and `{id}` are substituted.
    ///
    /// Default: [`DEFAULT_MIRROR`]
    pub mirrors: Arc<[String]>,

    /// Attempts at the final rename before giving up.
    ///
    /// Default: 3
    pub commit_attempts: u32,

    /// Fixed pause between rename attempts.
    ///
    /// Default: 500ms
    pub commit_backoff: Duration,

    /// Invoked on every phase change and after each written chunk.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("workers", &self.workers)
            .field("delay", &self.delay)
            .field("variant", &self.variant)
            .field("mirrors", &self.mirrors)
            .field("commit_attempts", &self.commit_attempts)
            .field("commit_backoff", &self.commit_backoff)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workers: 5,
            delay: Duration::from_secs(1),
            variant: Variant::Full,
            mirrors: Arc::from(vec![DEFAULT_MIRROR.to_string()]),
            commit_attempts: 3,
            commit_backoff: Duration::from_millis(500),
            on_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Replace the mirror list. An empty list makes every job fail with
    /// [`crate::FetchError::NoSource`].
    #[must_use]
    pub fn mirrors(mut self, mirrors: Vec<String>) -> Self {
        self.mirrors = Arc::from(mirrors);
        self
    }

    #[must_use]
    pub fn commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn commit_backoff(mut self, backoff: Duration) -> Self {
        self.commit_backoff = backoff;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(callback) = &self.on_progress {
            callback(&progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.workers, 5);
        assert_eq!(options.delay, Duration::from_secs(1));
        assert_eq!(options.variant, Variant::Full);
        assert_eq!(&*options.mirrors, [DEFAULT_MIRROR.to_string()]);
        assert_eq!(options.commit_attempts, 3);
        assert_eq!(options.commit_backoff, Duration::from_millis(500));
        assert!(options.on_progress.is_none());
    }

    #[test]
    fn test_workers_clamped() {
        assert_eq!(FetchOptions::default().workers(0).workers, 1);
        assert_eq!(FetchOptions::default().commit_attempts(0).commit_attempts, 1);
    }

    #[test]
    fn test_debug_hides_callback() {
        let options = FetchOptions::default().on_progress(Arc::new(|_: &Progress| {}));
        assert!(format!("{options:?}").contains("{ ... }"));
    }
}
