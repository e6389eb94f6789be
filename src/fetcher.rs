use std::collections::HashSet;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::{Config, FETCH_BURST_MONTHS, FETCH_PAUSE_SECS, PICK_COUNT};
use crate::error::{AppError, Result};
use crate::types::Draw;

const RESULT_PATH: &str = "/TLCAPIWeB/Lottery/SuperLotto638Result";

/// Largest page the provider serves; a month never has more draws than this.
const PAGE_SIZE: usize = 31;

/// Special number used when the provider omits it.
const DEFAULT_SPECIAL: u8 = 1;

#[derive(Debug, Default)]
pub struct FetchStats {
    pub months_requested: usize,
    pub months_failed: usize,
    pub api_total: usize,
    pub rejected_no_period: usize,
    pub rejected_bad_numbers: usize,
    pub rejected_bad_date: usize,
    pub duplicates: usize,
    pub accepted: usize,
}

/// Month-by-month client for the provider's draw result endpoint.
pub struct DrawFetcher {
    client: reqwest::Client,
    base_url: String,
    start_year: i32,
    pause: Duration,
}

impl DrawFetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(cfg.provider_accept_invalid_certs)
            .build()?;
        if cfg.provider_accept_invalid_certs {
            warn!("Provider TLS certificate verification is disabled");
        }
        Ok(Self {
            client,
            base_url: cfg.provider_url.trim_end_matches('/').to_string(),
            start_year: cfg.fetch_start_year,
            pause: Duration::from_secs(FETCH_PAUSE_SECS),
        })
    }

    /// Override the pause taken every `FETCH_BURST_MONTHS` requests.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Fetch every draw from `since`'s month (or January of the start year when
    /// `None`) through the current month, newest month first.
    ///
    /// Months that fail are logged and skipped. Errors only when every month failed.
    pub async fn fetch_draws(&self, since: Option<NaiveDate>) -> Result<(Vec<Draw>, FetchStats)> {
        let today = Utc::now().date_naive();
        let from = match since {
            Some(d) => (d.year(), d.month()),
            None => (self.start_year, 1),
        };
        let months = months_newest_first(from, (today.year(), today.month()));
        info!(
            months = months.len(),
            from = %format_month(from),
            "Fetching draws from provider"
        );

        let mut stats = FetchStats {
            months_requested: months.len(),
            ..FetchStats::default()
        };
        let mut draws = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, &month) in months.iter().enumerate() {
            if i > 0 && i % FETCH_BURST_MONTHS == 0 && !self.pause.is_zero() {
                debug!("Fetched {i} months, pausing {:?}", self.pause);
                tokio::time::sleep(self.pause).await;
            }

            let items = match self.fetch_month(month).await {
                Ok(items) => items,
                Err(e) => {
                    warn!("Fetch of {} failed: {e}", format_month(month));
                    stats.months_failed += 1;
                    continue;
                }
            };
            debug!("{}: {} items", format_month(month), items.len());
            stats.api_total += items.len();

            for item in &items {
                match parse_draw_item(item) {
                    Ok(draw) => {
                        if seen.insert(draw.period.as_str().to_string()) {
                            draws.push(draw);
                        } else {
                            stats.duplicates += 1;
                        }
                    }
                    Err(rejection) => {
                        debug!(?rejection, "Skipping provider item");
                        match rejection {
                            Rejection::NoPeriod => stats.rejected_no_period += 1,
                            Rejection::BadNumbers(_) => stats.rejected_bad_numbers += 1,
                            Rejection::BadDate(_) => stats.rejected_bad_date += 1,
                        }
                    }
                }
            }
        }

        if stats.months_requested > 0 && stats.months_failed == stats.months_requested {
            return Err(AppError::Provider(format!(
                "all {} month requests failed",
                stats.months_requested
            )));
        }

        draws.sort_by(|a, b| b.period.cmp(&a.period));
        stats.accepted = draws.len();
        Ok((draws, stats))
    }

    async fn fetch_month(&self, month: (i32, u32)) -> Result<Vec<serde_json::Value>> {
        let url = format!(
            "{}{RESULT_PATH}?period&month={}&pageSize={PAGE_SIZE}",
            self.base_url,
            format_month(month)
        );
        let resp: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        extract_items(&resp)
    }
}

/// `(year, month)` pairs from `to` back to `from`, inclusive. Empty when `from` is later.
pub fn months_newest_first(from: (i32, u32), to: (i32, u32)) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = to;
    while (year, month) >= from {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months
}

fn format_month((year, month): (i32, u32)) -> String {
    format!("{year:04}-{month:02}")
}

/// Pull the result list out of a provider response. A body without a result
/// list is an empty month; a non-zero `rtCode` is an error.
fn extract_items(resp: &serde_json::Value) -> Result<Vec<serde_json::Value>> {
    if let Some(code) = resp.get("rtCode").and_then(|c| c.as_i64()) {
        if code != 0 {
            let msg = resp.get("rtMsg").and_then(|m| m.as_str()).unwrap_or("");
            return Err(AppError::Provider(format!("rtCode {code}: {msg}")));
        }
    }
    Ok(resp
        .get("content")
        .and_then(|c| c.get("superLotto638Res"))
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default())
}

#[derive(Debug)]
enum Rejection {
    NoPeriod,
    BadNumbers(String),
    BadDate(String),
}

/// Parse one provider item. `drawNumberSize` holds the six primary numbers
/// followed by the special number.
fn parse_draw_item(v: &serde_json::Value) -> std::result::Result<Draw, Rejection> {
    let period = match v.get("period") {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if period.is_empty() {
        return Err(Rejection::NoPeriod);
    }

    let date_str = v.get("lotteryDate").and_then(|d| d.as_str()).unwrap_or("");
    let draw_date =
        parse_draw_date(date_str).ok_or_else(|| Rejection::BadDate(date_str.to_string()))?;

    let raw: Vec<u64> = v
        .get("drawNumberSize")
        .and_then(|a| a.as_array())
        .map(|a| a.iter().filter_map(|n| n.as_u64()).collect())
        .unwrap_or_default();
    if raw.len() != PICK_COUNT && raw.len() != PICK_COUNT + 1 {
        return Err(Rejection::BadNumbers(format!(
            "period {period}: {} numbers",
            raw.len()
        )));
    }

    let to_u8 = |n: u64| u8::try_from(n).map_err(|_| Rejection::BadNumbers(format!("{n} out of range")));
    let numbers = raw[..PICK_COUNT]
        .iter()
        .map(|&n| to_u8(n))
        .collect::<std::result::Result<Vec<u8>, _>>()?;
    let special = match raw.get(PICK_COUNT) {
        Some(&n) if n > 0 => to_u8(n)?,
        _ => DEFAULT_SPECIAL,
    };

    Draw::new(period, draw_date, &numbers, special).map_err(|e| Rejection::BadNumbers(e.to_string()))
}

/// Parse `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYY.MM.DD`.
pub fn parse_draw_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some((date, _time)) = s.split_once('T') {
        return NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
    }
    ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
