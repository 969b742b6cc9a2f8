//! Set lookup and rate-limited archive downloading.
//!
//! # Architecture
//!
//! - [`data`] - options, jobs, progress and outcomes
//! - [`core`] - pure transformations: header parsing, naming, response checks
//! - effects - I/O behind the [`HttpClient`] trait
//!
//! Per-job failures are values in [`JobOutcome`]; nothing in a batch run
//! aborts its siblings.

pub mod core;
pub mod data;
mod effects;
mod error;

pub use data::{
    DEFAULT_MIRROR, FetchJob, FetchOptions, FetchPhase, JobOutcome, JobStatus, Progress, Summary,
    Variant,
};
pub use effects::{
    ApiResolver, BatchFetcher, BoxStream, DownloadGate, Fetcher, FsRenamer, HttpClient,
    LOOKUP_URL, Renamer, ResolutionUnavailable, Response, commit, parse_lookup,
};
pub use error::{FetchError, ParseVariantError, Result};

#[cfg(feature = "reqwest")]
pub use effects::{ClientSetting, ReqwestClient, TIMEOUT, USER_AGENT};
