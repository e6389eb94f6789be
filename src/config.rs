use crate::error::{AppError, Result};

pub const PROVIDER_URL: &str = "https://api.taiwanlottery.com";

/// Primary number space is 1..=NUMBER_MAX.
pub const NUMBER_MAX: u8 = 38;

/// Special number space is 1..=SPECIAL_MAX.
pub const SPECIAL_MAX: u8 = 8;

/// Primary numbers per draw, and numbers per candidate set.
pub const PICK_COUNT: usize = 6;

/// Candidate sets produced per objective.
pub const SET_COUNT: usize = 10;

/// Analysis refuses to run on fewer draws than this.
pub const MIN_ANALYSIS_DRAWS: usize = 3;

/// Upper bound of the recent sub-window used for trend classification.
pub const TREND_WINDOW_PERIODS: usize = 20;

/// Avoid-special suggestions returned by the special-number analyzer.
pub const AVOID_SPECIAL_COUNT: usize = 2;

/// Provider requests made before pausing, and the pause length.
pub const FETCH_BURST_MONTHS: usize = 5;
pub const FETCH_PAUSE_SECS: u64 = 3;

/// Heuristic weights. These define the observable rankings; tests pin them.
pub mod weights {
    pub const AVOID_FREQ: f64 = 0.4;
    pub const AVOID_GAP: f64 = 0.4;
    pub const AVOID_TREND: f64 = 0.2;

    /// Frequency percent under which a number earns avoid points.
    pub const AVOID_FREQ_CEILING: f64 = 30.0;
    pub const AVOID_GAP_PER_PERIOD: f64 = 2.0;
    pub const AVOID_GAP_CAP: f64 = 50.0;
    pub const AVOID_COLD_BONUS: f64 = 20.0;

    pub const LIKELY_FREQ: f64 = 0.5;
    pub const LIKELY_GAP: f64 = 0.3;
    pub const LIKELY_TREND: f64 = 0.2;

    pub const LIKELY_FREQ_MULTIPLIER: f64 = 2.0;
    pub const LIKELY_FREQ_CAP: f64 = 70.0;
    pub const LIKELY_HOT_BONUS: f64 = 10.0;

    /// Gap the likely auxiliary ordering prefers.
    pub const LIKELY_GAP_TARGET: i64 = 3;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    pub provider_url: String,
    /// Skip TLS certificate verification on the provider client (PROVIDER_ACCEPT_INVALID_CERTS).
    /// The provider has served incomplete chains in the past; off unless set.
    pub provider_accept_invalid_certs: bool,
    /// First year fetched when the store is empty (FETCH_START_YEAR)
    pub fetch_start_year: i32,
    /// Periodic fetch + analysis interval; 0 disables it (REFRESH_INTERVAL_SECS)
    pub refresh_interval_secs: u64,
    /// Insert sample draws on startup when the store is empty (SEED_SAMPLE_DATA)
    pub seed_sample_data: bool,
    /// Fixed seed for the shuffled candidate set (ANALYSIS_SEED). Unset = OS entropy.
    pub analysis_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "lottery.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            provider_url: std::env::var("PROVIDER_URL")
                .unwrap_or_else(|_| PROVIDER_URL.to_string()),
            provider_accept_invalid_certs: std::env::var("PROVIDER_ACCEPT_INVALID_CERTS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            fetch_start_year: std::env::var("FETCH_START_YEAR")
                .unwrap_or_else(|_| "2020".to_string())
                .parse::<i32>()
                .unwrap_or(2020),
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u64>()
                .unwrap_or(0),
            seed_sample_data: std::env::var("SEED_SAMPLE_DATA")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            analysis_seed: match std::env::var("ANALYSIS_SEED") {
                Ok(v) if !v.trim().is_empty() => Some(v.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("ANALYSIS_SEED must be an unsigned integer".to_string())
                })?),
                _ => None,
            },
        })
    }
}

#[cfg(test)]
impl Config {
    /// Defaults without reading the environment; the provider URL points nowhere.
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            db_path: ":memory:".to_string(),
            api_port: 0,
            provider_url: "http://127.0.0.1:9".to_string(),
            provider_accept_invalid_certs: false,
            fetch_start_year: 2020,
            refresh_interval_secs: 0,
            seed_sample_data: false,
            analysis_seed: Some(7),
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
