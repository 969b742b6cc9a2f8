use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::commit::{FsRenamer, Renamer, commit, discard};
use super::gate::DownloadGate;
use super::http::{BoxStream, HttpClient};
use crate::core::{
    is_acceptable_content_type, is_success, matches_set, mirror_url, parse_filename,
    sanitize_filename,
};
use crate::data::{FetchJob, FetchOptions, FetchPhase, JobStatus, Progress};
use crate::error::{FetchError, Result};

/// Bytes of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

/// Downloads one job at a time; share it behind an `Arc` for concurrency.
pub struct Fetcher<C: HttpClient> {
    client: C,
    options: FetchOptions,
    gate: DownloadGate,
    renamer: Arc<dyn Renamer>,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, options: FetchOptions) -> Self {
        Self {
            client,
            gate: DownloadGate::new(options.delay),
            options,
            renamer: Arc::new(FsRenamer),
        }
    }

    #[must_use]
    pub fn with_renamer(mut self, renamer: Arc<dyn Renamer>) -> Self {
        self.renamer = renamer;
        self
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Place the archive for `job` into its target directory.
    ///
    /// An archive already on disk satisfies the job without a request.
    /// Otherwise each mirror is tried in order; the last error is returned
    /// if none of them delivers.
    pub async fn fetch(&self, job: &FetchJob) -> Result<JobStatus> {
        if let Some(existing) = find_existing(job).await? {
            debug!(set_id = job.set_id, path = %existing.display(), "already present");
            return Ok(JobStatus::Skipped(existing));
        }
        if self.options.mirrors.is_empty() {
            return Err(FetchError::NoSource);
        }
        tokio::fs::create_dir_all(&job.target_dir)
            .await
            .map_err(|source| FetchError::WriteFailed {
                path: job.target_dir.clone(),
                source,
            })?;

        let mut last_err = FetchError::NoSource;
        for template in self.options.mirrors.iter() {
            let url = mirror_url(template, self.options.variant, job.set_id);
            match self.fetch_from(job, &url).await {
                Ok(path) => return Ok(JobStatus::Downloaded(path)),
                Err(e) => {
                    debug!(set_id = job.set_id, %url, error = %e, "mirror failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn fetch_from(&self, job: &FetchJob, url: &str) -> Result<PathBuf> {
        self.options
            .report(Progress::new(job.set_id, FetchPhase::Connecting));
        self.gate.acquire().await;
        let result = self.download(job, url).await;
        self.gate.complete().await;
        result
    }

    async fn download(&self, job: &FetchJob, url: &str) -> Result<PathBuf> {
        let response = self
            .client
            .get(url)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !is_success(response.status)
            || !is_acceptable_content_type(response.content_type.as_deref())
        {
            let status = response.status;
            let content_type = response.content_type.clone();
            let body = response.snippet(ERROR_BODY_LIMIT).await;
            return Err(FetchError::InvalidResponse {
                status,
                content_type,
                body,
            });
        }

        let file_name = response
            .content_disposition
            .as_deref()
            .and_then(parse_filename)
            .and_then(|name| sanitize_filename(&name))
            .filter(|name| matches_set(name, job.set_id));
        let dest = match &file_name {
            Some(name) => job.path_for(name),
            None => job.default_path(),
        };

        let staging = job.staging_path();
        let written = match self
            .stream_to(&staging, response.body, job.set_id, response.content_length)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                discard(&staging).await;
                return Err(e);
            }
        };

        self.options.report(Progress {
            set_id: job.set_id,
            phase: FetchPhase::Committing,
            bytes_downloaded: written,
            total_bytes: response.content_length,
        });
        let path = commit(
            self.renamer.as_ref(),
            &staging,
            &dest,
            self.options.commit_attempts,
            self.options.commit_backoff,
        )
        .await?;

        info!(set_id = job.set_id, path = %path.display(), bytes = written, "downloaded");
        self.options.report(Progress {
            set_id: job.set_id,
            phase: FetchPhase::Completed,
            bytes_downloaded: written,
            total_bytes: response.content_length,
        });
        Ok(path)
    }

    /// Stream `body` into `path`, returning the byte count.
    async fn stream_to(
        &self,
        path: &Path,
        mut body: BoxStream<'static, std::result::Result<Bytes, C::Error>>,
        set_id: u64,
        total_bytes: Option<u64>,
    ) -> Result<u64> {
        let write_err = |source: io::Error| FetchError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
        let mut progress = Progress {
            set_id,
            phase: FetchPhase::Downloading,
            bytes_downloaded: 0,
            total_bytes,
        };
        self.options.report(progress.clone());

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::Network(e.to_string()))?;
            file.write_all(&chunk).await.map_err(write_err)?;
            progress.bytes_downloaded += chunk.len() as u64;
            self.options.report(progress.clone());
        }

        file.flush().await.map_err(write_err)?;
        // the handle must be closed before the rename
        drop(file.into_std().await);
        Ok(progress.bytes_downloaded)
    }
}

/// An archive in the job's directory that already holds its set.
async fn find_existing(job: &FetchJob) -> Result<Option<PathBuf>> {
    let default = job.default_path();
    if tokio::fs::try_exists(&default).await? {
        return Ok(Some(default));
    }

    let mut entries = match tokio::fs::read_dir(&job.target_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if matches_set(name, job.set_id) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_existing_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let job = FetchJob::new(42, dir.path().join("absent"));
        assert_eq!(find_existing(&job).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_existing_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("421 Other - Set.osz"), b"").unwrap();
        std::fs::write(dir.path().join("42.osz.tmp"), b"").unwrap();
        let job = FetchJob::new(42, dir.path());
        assert_eq!(find_existing(&job).await.unwrap(), None);

        std::fs::write(dir.path().join("42 Artist - Title.osz"), b"").unwrap();
        assert_eq!(
            find_existing(&job).await.unwrap(),
            Some(dir.path().join("42 Artist - Title.osz"))
        );
    }

    #[tokio::test]
    async fn test_find_existing_default_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("42.osz"), b"").unwrap();
        let job = FetchJob::new(42, dir.path());
        assert_eq!(
            find_existing(&job).await.unwrap(),
            Some(dir.path().join("42.osz"))
        );
    }
}
