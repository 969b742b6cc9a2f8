//! Moving a finished staging file into place.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};

/// The rename step, separated so failures can be injected.
///
/// Boxed so the fetcher can hold it as `Arc<dyn Renamer>`.
pub trait Renamer: Send + Sync {
    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>>;
}

/// Plain `tokio::fs::rename`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRenamer;

impl Renamer for FsRenamer {
    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(tokio::fs::rename(from, to))
    }
}

/// Rename `staging` to `dest`, retrying with a fixed pause.
///
/// After the last failed attempt the staging file is deleted and
/// [`FetchError::CommitFailed`] is returned, so no `.tmp` file outlives the
/// job either way.
pub async fn commit<R: Renamer + ?Sized>(
    renamer: &R,
    staging: &Path,
    dest: &Path,
    attempts: u32,
    backoff: Duration,
) -> Result<PathBuf> {
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match renamer.rename(staging, dest).await {
            Ok(()) => return Ok(dest.to_path_buf()),
            Err(e) if attempt < attempts => {
                warn!(attempt, path = %dest.display(), error = %e, "rename failed, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(source) => {
                discard(staging).await;
                return Err(FetchError::CommitFailed {
                    path: dest.to_path_buf(),
                    attempts,
                    source,
                });
            }
        }
    }
}

/// Best-effort removal of a staging file.
pub(crate) async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed staging file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove staging file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Renamer for Flaky {
        fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
            Box::pin(async move {
                if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                    return Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"));
                }
                tokio::fs::rename(from, to).await
            })
        }
    }

    fn staged(dir: &Path) -> (PathBuf, PathBuf) {
        let staging = dir.join("1.osz.tmp");
        std::fs::write(&staging, b"archive").unwrap();
        (staging, dir.join("1.osz"))
    }

    #[tokio::test]
    async fn test_commit_first_try() {
        let dir = tempfile::tempdir().unwrap();
        let (staging, dest) = staged(dir.path());
        let path = commit(&FsRenamer, &staging, &dest, 3, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive");
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_commit_recovers_on_third_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let (staging, dest) = staged(dir.path());
        let renamer = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        commit(&renamer, &staging, &dest, 3, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(renamer.calls.load(Ordering::SeqCst), 3);
        assert!(dest.exists());
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_commit_gives_up_and_discards() {
        let dir = tempfile::tempdir().unwrap();
        let (staging, dest) = staged(dir.path());
        let renamer = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let err = commit(&renamer, &staging, &dest, 3, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::CommitFailed { attempts: 3, .. }));
        assert_eq!(renamer.calls.load(Ordering::SeqCst), 3);
        assert!(!staging.exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_discard_missing_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        discard(&dir.path().join("nope.tmp")).await;
    }

    #[tokio::test]
    async fn test_discard_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let (staging, _) = staged(dir.path());
        discard(&staging).await;
        assert!(!staging.exists());
    }
}
