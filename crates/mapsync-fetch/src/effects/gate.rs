use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Process-wide spacing between downloads.
///
/// The mark records the latest download start or completion. [`acquire`]
/// holds the lock across the whole check, sleep and stamp sequence, so two
/// workers can never both observe an expired mark and start together.
///
/// [`acquire`]: DownloadGate::acquire
#[derive(Debug)]
pub struct DownloadGate {
    delay: Duration,
    mark: Mutex<Option<Instant>>,
}

impl DownloadGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            mark: Mutex::new(None),
        }
    }

    /// Wait until `delay` has passed since the mark, then stamp a new one.
    /// Returns the new mark.
    pub async fn acquire(&self) -> Instant {
        let mut mark = self.mark.lock().await;
        if let Some(last) = *mark {
            sleep_until(last + self.delay).await;
        }
        let now = Instant::now();
        *mark = Some(now);
        now
    }

    /// Record that a download has finished.
    ///
    /// The clock is read only once the lock is held. A stamp taken earlier
    /// could land behind a newer mark set by a sleeping `acquire`.
    pub async fn complete(&self) {
        let mut mark = self.mark.lock().await;
        let now = Instant::now();
        *mark = Some(mark.map_or(now, |last| last.max(now)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let gate = DownloadGate::new(Duration::from_secs(30));
        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_acquires_are_spaced() {
        let delay = Duration::from_millis(40);
        let gate = Arc::new(DownloadGate::new(delay));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.acquire().await })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= delay, "{:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test]
    async fn test_complete_pushes_mark_forward() {
        let delay = Duration::from_millis(40);
        let gate = DownloadGate::new(delay);
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let before = Instant::now();
        gate.complete().await;
        let next = gate.acquire().await;
        assert!(next - before >= delay);
    }

    #[tokio::test]
    async fn test_complete_during_sleeping_acquire_keeps_spacing() {
        let delay = Duration::from_millis(50);
        let gate = Arc::new(DownloadGate::new(delay));
        gate.acquire().await;

        // Holds the lock while it sleeps out the delay.
        let second = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.acquire().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Queues behind the sleeper.
        let finished = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.complete().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;

        let third = gate.acquire().await;
        let second = second.await.unwrap();
        finished.await.unwrap();

        assert!(third - second >= delay, "{:?}", third - second);
    }
}
