//! I/O: the HTTP seam, lookups, the rate gate, commit and the worker pool.

mod batch;
mod commit;
mod fetcher;
mod gate;
mod http;
mod resolver;

pub use batch::BatchFetcher;
pub use commit::{FsRenamer, Renamer, commit};
pub use fetcher::Fetcher;
pub use gate::DownloadGate;
pub use http::{BoxStream, HttpClient, Response};
pub use resolver::{ApiResolver, LOOKUP_URL, ResolutionUnavailable, parse_lookup};

#[cfg(feature = "reqwest")]
pub use http::{ClientSetting, ReqwestClient, TIMEOUT, USER_AGENT};
