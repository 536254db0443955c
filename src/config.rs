use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api/v1/admin";
/// Cached article lists younger than this skip the network.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Batch size used when deriving categories, tags and stats.
pub const METADATA_BATCH_LIMIT: u32 = 1000;
pub const DEFAULT_POPULAR_TAGS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub data_dir: PathBuf,
    pub freshness_window: Duration,
    pub request_timeout: Duration,
    pub page_limit: u32,
    pub popular_tags_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: default_data_dir(),
            freshness_window: FRESHNESS_WINDOW,
            request_timeout: REQUEST_TIMEOUT,
            page_limit: DEFAULT_PAGE_LIMIT,
            popular_tags_limit: DEFAULT_POPULAR_TAGS,
        }
    }
}

impl Config {
    /// Resolves the configuration from `MASJID_*` environment variables,
    /// falling back to the defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(base) = std::env::var("MASJID_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(dir) = std::env::var("MASJID_DATA_DIR") {
            config.data_dir = PathBuf::from(shellexpand::tilde(&dir).to_string());
        }
        if let Some(secs) = read_number("MASJID_FRESHNESS_SECS")? {
            config.freshness_window = Duration::from_secs(secs);
        }
        if let Some(secs) = read_number("MASJID_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = read_number("MASJID_PAGE_LIMIT")? {
            config.page_limit = u32::try_from(limit)
                .context("MASJID_PAGE_LIMIT does not fit in 32 bits")?
                .max(1);
        }

        Ok(config)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

fn read_number(var: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{} must be a whole number, got '{}'", var, raw)),
        Err(_) => Ok(None),
    }
}

fn default_data_dir() -> PathBuf {
    // XDG data directory, then ~/.local/share
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("masjid-admin")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/masjid-admin")
    }
}
