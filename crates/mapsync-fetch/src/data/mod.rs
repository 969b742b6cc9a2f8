//! Plain data passed between the pipeline stages.

pub mod job;
pub mod options;
pub mod progress;
pub mod report;

pub use job::{FetchJob, Variant};
pub use options::{DEFAULT_MIRROR, FetchOptions, FetchPhase};
pub use progress::Progress;
pub use report::{JobOutcome, JobStatus, Summary};
