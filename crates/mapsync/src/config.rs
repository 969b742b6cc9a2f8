//! Settings file discovery, game directory detection, and CLI overrides.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use home::home_dir;
use mapsync_fetch::{ClientSetting, DEFAULT_MIRROR, FetchOptions, LOOKUP_URL, Progress, Variant};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cli::Cli;

pub const CATALOG_FILE: &str = "osu!.db";
pub const INDEX_FILE: &str = "collection.db";
pub const SONGS_DIR: &str = "Songs";
const GAME_EXE: &str = "osu!.exe";

const FALLBACK_DIRS: [&str; 5] = [r"C:\osu!", r"D:\osu!", r"D:\osu", r"E:\osu!", r"E:\osu"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game_path: Option<PathBuf>,
    pub proxy: Option<String>,
    pub api_token: Option<String>,
    pub workers: usize,
    pub delay_secs: f64,
    pub variant: Option<Variant>,
    pub mirrors: Vec<String>,
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_path: None,
            proxy: None,
            api_token: None,
            workers: 5,
            delay_secs: 1.0,
            variant: None,
            mirrors: Vec::new(),
            output_dir: None,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Candidate files, most specific first.
    pub fn search_paths(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = vec![
            cwd.join(".config").join("config.toml"),
            cwd.join("config.toml"),
        ];
        if let Some(home) = home {
            paths.push(home.join(".config").join("mapsync").join("config.toml"));
        }
        paths
    }

    /// Load `explicit` if given, otherwise the first searched file that
    /// names a game directory. Falls back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let cwd = env::current_dir().context("failed to get current directory")?;
        for path in Self::search_paths(&cwd, home_dir().as_deref()) {
            if !path.is_file() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) if config.game_path.is_some() => {
                    debug!(path = %path.display(), "using config");
                    return Ok(config);
                }
                Ok(_) => debug!(path = %path.display(), "config has no game_path, skipping"),
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(path = %path.display(), %error, "skipping config");
                }
            }
        }
        Ok(Self::default())
    }

    /// Command-line values win over file values.
    #[must_use]
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.game_path {
            self.game_path = Some(path.clone());
        }
        if let Some(output) = &cli.output {
            self.output_dir = Some(output.clone());
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(delay) = cli.delay {
            self.delay_secs = delay;
        }
        if cli.variant.is_some() {
            self.variant = cli.variant;
        }
        if cli.token.is_some() {
            self.api_token = cli.token.clone();
        }
        if cli.proxy.is_some() {
            self.proxy = cli.proxy.clone();
        }
        if !cli.mirrors.is_empty() {
            self.mirrors = cli.mirrors.clone();
        }
        self
    }

    /// Fix the game directory and produce run settings.
    pub fn into_settings(self, dry_run: bool) -> Result<Settings> {
        let game = match self.game_path {
            Some(path) => path,
            None => detect_game_dir(env::var_os("LOCALAPPDATA"))
                .context("could not find the game directory; set game_path in the config or pass --game-path")?,
        };
        if !game.is_dir() {
            bail!("game directory does not exist: {}", game.display());
        }

        Ok(Settings {
            paths: Paths::new(game, self.output_dir),
            api_token: self.api_token,
            lookup_url: LOOKUP_URL.to_string(),
            proxy: self.proxy,
            workers: self.workers.max(1),
            delay: delay_from_secs(self.delay_secs),
            variant: self.variant,
            mirrors: if self.mirrors.is_empty() {
                vec![DEFAULT_MIRROR.to_string()]
            } else {
                self.mirrors
            },
            dry_run,
        })
    }
}

fn delay_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Locations derived from the game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub game: PathBuf,
    pub catalog: PathBuf,
    pub index: PathBuf,
    pub output: PathBuf,
}

impl Paths {
    pub fn new(game: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            catalog: game.join(CATALOG_FILE),
            index: game.join(INDEX_FILE),
            output: output.unwrap_or_else(|| game.join(SONGS_DIR)),
            game,
        }
    }
}

/// Everything a run needs, after files, flags and detection are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: Paths,
    pub api_token: Option<String>,
    pub lookup_url: String,
    pub proxy: Option<String>,
    pub workers: usize,
    pub delay: Duration,
    /// `None` leaves the choice to the run, once there is something to fetch.
    pub variant: Option<Variant>,
    pub mirrors: Vec<String>,
    pub dry_run: bool,
}

impl Settings {
    pub fn fetch_options(&self, variant: Variant) -> FetchOptions {
        FetchOptions::default()
            .workers(self.workers)
            .delay(self.delay)
            .variant(variant)
            .mirrors(self.mirrors.clone())
            .on_progress(Arc::new(|p: &Progress| {
                let percent = p.percentage().map(|v| format!("{v:.0}%"));
                debug!(
                    set_id = p.set_id,
                    phase = %p.phase,
                    bytes = p.bytes_downloaded,
                    percent = percent.as_deref().unwrap_or("?"),
                    "progress"
                );
            }))
    }

    pub fn client_setting(&self) -> Result<ClientSetting> {
        let mut setting = ClientSetting::default();
        if let Some(proxy) = self.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let url = Url::parse(proxy).with_context(|| format!("invalid proxy URL {proxy}"))?;
            setting = setting.proxy(url);
        }
        Ok(setting)
    }
}

pub fn is_game_dir(path: &Path) -> bool {
    path.join(GAME_EXE).is_file()
}

/// Usual install locations, in lookup order.
pub fn candidate_dirs(local_app_data: Option<OsString>) -> Vec<PathBuf> {
    local_app_data
        .filter(|v| !v.is_empty())
        .map(|v| PathBuf::from(v).join("osu!"))
        .into_iter()
        .chain(FALLBACK_DIRS.iter().map(PathBuf::from))
        .collect()
}

pub fn detect_game_dir(local_app_data: Option<OsString>) -> Option<PathBuf> {
    candidate_dirs(local_app_data)
        .into_iter()
        .find(|dir| is_game_dir(dir))
}
