use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::gameweek::SEASON_MATCHES;

const DEFAULT_MANIFEST: &str = "match_urls.csv";
const DEFAULT_SCHEDULE_URL: &str =
    "https://fbref.com/en/comps/9/2023-2024/schedule/2023-2024-Premier-League-Scores-and-Fixtures";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub match_limit: usize,
    pub rate_limit_backoff: Duration,
    pub inter_match_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub schedule_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            output_dir: PathBuf::from("."),
            match_limit: SEASON_MATCHES,
            rate_limit_backoff: Duration::from_secs(60),
            inter_match_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
        }
    }
}

impl Config {
    /// Reads `.env.local` / `.env` (if present) and then the `XG_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let defaults = Self::default();
        Self {
            manifest_path: env_string("XG_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or(defaults.manifest_path),
            output_dir: env_string("XG_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            match_limit: env_parse::<usize>("XG_MATCH_LIMIT")
                .unwrap_or(defaults.match_limit)
                .clamp(1, SEASON_MATCHES),
            rate_limit_backoff: env_parse::<u64>("XG_RATE_LIMIT_BACKOFF_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_backoff),
            inter_match_delay: env_parse::<u64>("XG_INTER_MATCH_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.inter_match_delay),
            request_timeout: env_parse::<u64>("XG_REQUEST_TIMEOUT_SECS")
                .map(|secs| Duration::from_secs(secs.clamp(1, 300)))
                .unwrap_or(defaults.request_timeout),
            user_agent: env_string("XG_USER_AGENT").unwrap_or(defaults.user_agent),
            schedule_url: env_string("XG_SCHEDULE_URL").unwrap_or(defaults.schedule_url),
        }
    }

    /// Command-line overrides for the manifest, output directory and limit.
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(path) = arg_value(args, "--manifest") {
            self.manifest_path = PathBuf::from(path);
        }
        if let Some(dir) = arg_value(args, "--out") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(limit) = arg_value(args, "--limit").and_then(|v| v.parse::<usize>().ok()) {
            self.match_limit = limit.clamp(1, SEASON_MATCHES);
        }
        self
    }

    pub fn match_artifact_path(&self, match_index: usize) -> PathBuf {
        self.output_dir.join(crate::artifact::match_artifact_name(match_index))
    }

    pub fn likely_returns_path(&self) -> PathBuf {
        self.output_dir.join(crate::artifact::LIKELY_RETURNS_FILE)
    }

    pub fn expected_cleans_path(&self) -> PathBuf {
        self.output_dir.join(crate::artifact::EXPECTED_CLEANS_FILE)
    }
}

/// `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

/// Value of `--flag value` or `--flag=value`, ignoring blanks.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|val| val.parse::<T>().ok())
}
