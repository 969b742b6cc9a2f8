//! Worker pool over many jobs.

use std::sync::Arc;
use std::time::Instant;

use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use super::fetcher::Fetcher;
use super::http::HttpClient;
use crate::data::{FetchJob, JobOutcome};
use crate::error::FetchError;

/// Runs jobs on at most `workers` tasks at once.
pub struct BatchFetcher<C: HttpClient> {
    fetcher: Arc<Fetcher<C>>,
}

impl<C: HttpClient + 'static> BatchFetcher<C> {
    pub fn new(fetcher: Fetcher<C>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    /// Run every job to completion and report one outcome per job.
    ///
    /// A failed job never stops the others. Outcomes arrive in completion
    /// order.
    pub async fn run(&self, jobs: Vec<FetchJob>) -> Vec<JobOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.fetcher.options().workers.max(1)));
        let mut futures = FuturesUnordered::new();

        for job in jobs {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let set_id = job.set_id;

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let start = Instant::now();
                let result = fetcher.fetch(&job).await;
                if let Err(e) = &result {
                    warn!(set_id, error = %e, "download failed");
                }
                JobOutcome {
                    set_id,
                    result,
                    elapsed: start.elapsed(),
                }
            });
            futures.push(async move { (set_id, handle.await) });
        }

        let mut outcomes = Vec::with_capacity(futures.len());
        while let Some((set_id, joined)) = futures.next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(set_id, error = %e, "download task aborted");
                    outcomes.push(JobOutcome {
                        set_id,
                        result: Err(FetchError::Network(format!("task aborted: {e}"))),
                        elapsed: Default::default(),
                    });
                }
            }
        }
        outcomes
    }
}
