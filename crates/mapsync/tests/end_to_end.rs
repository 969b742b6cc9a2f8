use std::cell::Cell;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use mapsync::config::{Paths, Settings};
use mapsync::run::{missing_hashes, run};
use mapsync_db::fixture::{RecordSpec, catalog_bytes, index_bytes};
use mapsync_fetch::{HttpClient, JobStatus, Response, Variant};

const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const HASH_C: &str = "cccccccccccccccccccccccccccccccc";
const LOOKUP: &str = "https://api.test/get_beatmaps";

#[derive(Default)]
struct MockClient {
    replies: HashMap<String, (&'static str, Vec<u8>)>,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    fn with(mut self, url: String, content_type: &'static str, body: &[u8]) -> Self {
        self.replies.insert(url, (content_type, body.to_vec()));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    type Error = io::Error;

    async fn get(&self, url: &str) -> Result<Response<io::Error>, io::Error> {
        self.requests.lock().unwrap().push(url.to_string());
        let Some((content_type, body)) = self.replies.get(url).cloned() else {
            return Err(io::Error::new(io::ErrorKind::NotFound, url.to_string()));
        };
        Ok(Response {
            status: 200,
            content_type: Some(content_type.to_string()),
            content_disposition: None,
            content_length: Some(body.len() as u64),
            body: Box::pin(stream::iter([Ok(Bytes::from(body))])),
        })
    }
}

fn game_dir(root: &Path) {
    std::fs::write(
        root.join("osu!.db"),
        catalog_bytes(
            20250107,
            &[RecordSpec::new(HASH_A, 1), RecordSpec::new(HASH_B, 2)],
        ),
    )
    .unwrap();
    std::fs::write(
        root.join("collection.db"),
        index_bytes(
            20250107,
            &[
                ("favourites", &[HASH_A][..]),
                ("to play", &[HASH_C, HASH_A][..]),
            ],
        ),
    )
    .unwrap();
}

fn settings(root: &Path, dry_run: bool) -> Settings {
    Settings {
        paths: Paths::new(root.to_path_buf(), None),
        api_token: Some("key".to_string()),
        lookup_url: LOOKUP.to_string(),
        proxy: None,
        workers: 2,
        delay: Duration::ZERO,
        variant: None,
        mirrors: vec!["https://mirror.test/{variant}/{id}".to_string()],
        dry_run,
    }
}

fn client() -> Arc<MockClient> {
    Arc::new(
        MockClient::default()
            .with(
                format!("{LOOKUP}?k=key&h={HASH_C}"),
                "application/json",
                br#"[{"beatmapset_id":"42"}]"#,
            )
            .with(
                "https://mirror.test/full/42".to_string(),
                "application/x-osu-beatmap-archive",
                b"archive",
            ),
    )
}

#[test]
fn test_missing_is_index_minus_catalog() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    let missing = missing_hashes(&dir.path().join("osu!.db"), &dir.path().join("collection.db"))
        .unwrap();
    assert_eq!(missing.into_iter().collect::<Vec<_>>(), [HASH_C]);
}

#[tokio::test]
async fn test_one_missing_set_is_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    let client = client();

    let asked = Cell::new(0);
    let choose = || {
        asked.set(asked.get() + 1);
        Variant::Full
    };
    let report = run(&settings(dir.path(), false), Arc::clone(&client), choose)
        .await
        .unwrap();
    assert_eq!(asked.get(), 1);
    assert_eq!(report.missing, 1);
    assert_eq!(report.resolved.iter().copied().collect::<Vec<_>>(), [42]);
    assert_eq!(report.outcomes.len(), 1);

    let songs = dir.path().join("Songs");
    assert_eq!(
        report.outcomes[0].result.as_ref().unwrap(),
        &JobStatus::Downloaded(songs.join("42.osz"))
    );
    let files: Vec<_> = std::fs::read_dir(&songs).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(songs.join("42.osz")).unwrap(), b"archive");

    // a second pass finds the archive and stays off the mirror
    let again = run(&settings(dir.path(), false), Arc::clone(&client), || Variant::Full)
        .await
        .unwrap();
    assert_eq!(again.summary().skipped, 1);
    let downloads = client
        .requests()
        .iter()
        .filter(|u| u.starts_with("https://mirror.test"))
        .count();
    assert_eq!(downloads, 1);
}

#[tokio::test]
async fn test_dry_run_stops_after_resolution() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    let client = client();

    let report = run(&settings(dir.path(), true), Arc::clone(&client), || {
        panic!("dry run asked for a variant")
    })
    .await
    .unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.summary_lines().last().unwrap(), "would fetch: 42");
    assert!(!dir.path().join("Songs").exists());
    assert!(client.requests().iter().all(|u| u.starts_with(LOOKUP)));
}

#[tokio::test]
async fn test_corrupt_catalog_aborts() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    let catalog = dir.path().join("osu!.db");
    let mut bytes = std::fs::read(&catalog).unwrap();
    bytes.truncate(bytes.len() / 2);
    std::fs::write(&catalog, bytes).unwrap();

    let err = run(&settings(dir.path(), false), client(), || Variant::Full)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("record"));
}

#[tokio::test]
async fn test_missing_index_aborts() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    std::fs::remove_file(dir.path().join("collection.db")).unwrap();
    let err = run(&settings(dir.path(), false), client(), || Variant::Full)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("collection.db"));
}

#[tokio::test]
async fn test_nothing_missing_never_asks_for_variant() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    std::fs::write(
        dir.path().join("collection.db"),
        index_bytes(20250107, &[("favourites", &[HASH_A, HASH_B][..])]),
    )
    .unwrap();
    let client = client();

    let report = run(&settings(dir.path(), false), Arc::clone(&client), || {
        panic!("asked for a variant with nothing to fetch")
    })
    .await
    .unwrap();
    assert_eq!(report.summary_lines(), ["no missing beatmaps"]);
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_configured_variant_skips_the_question() {
    let dir = tempfile::tempdir().unwrap();
    game_dir(dir.path());
    let client = Arc::new(
        MockClient::default()
            .with(
                format!("{LOOKUP}?k=key&h={HASH_C}"),
                "application/json",
                br#"[{"beatmapset_id":"42"}]"#,
            )
            .with(
                "https://mirror.test/mini/42".to_string(),
                "application/octet-stream",
                b"small",
            ),
    );
    let settings = Settings {
        variant: Some(Variant::Mini),
        ..settings(dir.path(), false)
    };

    let report = run(&settings, Arc::clone(&client), || {
        panic!("variant was already configured")
    })
    .await
    .unwrap();
    assert_eq!(report.summary().downloaded, 1);
    assert!(client.requests().contains(&"https://mirror.test/mini/42".to_string()));
}
