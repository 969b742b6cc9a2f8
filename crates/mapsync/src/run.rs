//! One reconcile-and-download pass.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mapsync_db::{difference, read_catalog_hashes, read_index};
use mapsync_fetch::{
    ApiResolver, BatchFetcher, FetchJob, Fetcher, HttpClient, JobOutcome, Summary, Variant,
};
use tracing::{debug, info, warn};

use crate::config::Settings;

/// What a run found and did.
#[derive(Debug)]
pub struct Report {
    /// Hashes referenced by the index but absent from the catalog.
    pub missing: usize,
    pub resolved: BTreeSet<u64>,
    /// Empty on a dry run.
    pub outcomes: Vec<JobOutcome>,
    pub dry_run: bool,
}

impl Report {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }

    /// Lines for the user, independent of the log level.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.missing == 0 {
            return vec!["no missing beatmaps".to_string()];
        }

        let mut lines = vec![
            format!("found {} missing beatmaps", self.missing),
            format!("resolved into {} sets", self.resolved.len()),
        ];
        if self.dry_run {
            let ids: Vec<_> = self.resolved.iter().map(u64::to_string).collect();
            lines.push(format!("would fetch: {}", ids.join(", ")));
            return lines;
        }

        let summary = self.summary();
        lines.push(format!(
            "downloaded {}, already present {}, failed {}",
            summary.downloaded, summary.skipped, summary.failed
        ));
        let mut failed: Vec<_> = self
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.set_id, e, o.elapsed)))
            .collect();
        failed.sort_by_key(|(set_id, _, _)| *set_id);
        lines.extend(failed.into_iter().map(|(set_id, e, elapsed)| {
            format!("  set {set_id}: {e} (after {:.1}s)", elapsed.as_secs_f64())
        }));
        lines
    }
}

/// Index hashes the catalog does not contain.
pub fn missing_hashes(catalog: &Path, index: &Path) -> Result<HashSet<String>> {
    let have = read_catalog_hashes(catalog)
        .with_context(|| format!("failed to read {}", catalog.display()))?;
    let wanted = read_index(index)
        .with_context(|| format!("failed to read {}", index.display()))?
        .hashes();
    debug!(have = have.len(), wanted = wanted.len(), "loaded hash sets");
    Ok(difference(&wanted, &have))
}

/// Reconcile, resolve and download.
///
/// `choose_variant` is called only when settings leave the variant open and
/// there is something to download. Only catalog and index failures are
/// errors; per-hash and per-job failures end up in the report.
pub async fn run<C, F>(settings: &Settings, client: Arc<C>, choose_variant: F) -> Result<Report>
where
    C: HttpClient + 'static,
    F: FnOnce() -> Variant,
{
    let paths = &settings.paths;
    let missing = missing_hashes(&paths.catalog, &paths.index)?;
    info!(count = missing.len(), "missing beatmaps");
    if missing.is_empty() {
        return Ok(Report {
            missing: 0,
            resolved: BTreeSet::new(),
            outcomes: Vec::new(),
            dry_run: settings.dry_run,
        });
    }
    for hash in &missing {
        debug!(hash = %hash, "missing");
    }
    let variant = if settings.dry_run {
        None
    } else {
        Some(settings.variant.unwrap_or_else(choose_variant))
    };

    let resolver = ApiResolver::new(Arc::clone(&client), settings.api_token.clone())
        .base_url(settings.lookup_url.clone());
    if !resolver.has_token() {
        warn!("no API token configured, set ids cannot be looked up");
    }
    let count = missing.len();
    let resolved = resolver.resolve_all(missing, settings.workers).await;
    info!(sets = resolved.len(), "resolved");

    let outcomes = match variant {
        Some(variant) if !resolved.is_empty() => {
            info!(%variant, "downloading");
            let jobs = resolved
                .iter()
                .map(|&set_id| FetchJob::new(set_id, &paths.output))
                .collect();
            BatchFetcher::new(Fetcher::new(client, settings.fetch_options(variant)))
                .run(jobs)
                .await
        }
        _ => Vec::new(),
    };

    Ok(Report {
        missing: count,
        resolved,
        outcomes,
        dry_run: settings.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_fetch::{FetchError, JobStatus};
    use std::time::Duration;

    fn report(outcomes: Vec<JobOutcome>) -> Report {
        Report {
            missing: 4,
            resolved: outcomes.iter().map(|o| o.set_id).collect(),
            outcomes,
            dry_run: false,
        }
    }

    #[test]
    fn test_summary_lines() {
        let lines = report(vec![
            JobOutcome {
                set_id: 9,
                result: Err(FetchError::NoSource),
                elapsed: Duration::from_millis(2500),
            },
            JobOutcome {
                set_id: 3,
                result: Ok(JobStatus::Downloaded("3.osz".into())),
                elapsed: Duration::ZERO,
            },
        ])
        .summary_lines();
        assert_eq!(lines[0], "found 4 missing beatmaps");
        assert_eq!(lines[1], "resolved into 2 sets");
        assert_eq!(lines[2], "downloaded 1, already present 0, failed 1");
        assert_eq!(lines[3], "  set 9: no download mirror configured (after 2.5s)");
    }

    #[test]
    fn test_nothing_missing() {
        let report = Report {
            missing: 0,
            resolved: BTreeSet::new(),
            outcomes: Vec::new(),
            dry_run: false,
        };
        assert_eq!(report.summary_lines(), ["no missing beatmaps"]);
    }

    #[test]
    fn test_dry_run_lines() {
        let report = Report {
            missing: 3,
            resolved: BTreeSet::from([42, 7]),
            outcomes: Vec::new(),
            dry_run: true,
        };
        assert_eq!(report.summary_lines()[2], "would fetch: 7, 42");
    }
}
