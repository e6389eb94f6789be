use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{NUMBER_MAX, PICK_COUNT, SPECIAL_MAX};
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Draw period identifier as issued by the provider, e.g. `"114000055"`.
///
/// Ordered numerically when the identifier parses as an integer. Identifiers
/// that do not parse sort before every numeric one and lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the identifier, `None` if it is not cleanly numeric.
    pub fn numeric(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }

    /// Periods elapsed from `earlier` to `self` by identifier arithmetic, clamped at 0.
    /// `None` when either identifier is not numeric.
    pub fn periods_since(&self, earlier: &Period) -> Option<u32> {
        let diff = self.numeric()?.checked_sub(earlier.numeric()?)?;
        Some(diff.clamp(0, i64::from(u32::MAX)) as u32)
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Draw
// ---------------------------------------------------------------------------

/// One historical drawing. Construct through [`Draw::new`], which enforces
/// six distinct primary numbers in range and a special number in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub period: Period,
    pub draw_date: NaiveDate,
    /// Ascending.
    pub numbers: [u8; PICK_COUNT],
    pub special_number: u8,
}

impl Draw {
    pub fn new(
        period: impl Into<String>,
        draw_date: NaiveDate,
        numbers: &[u8],
        special_number: u8,
    ) -> Result<Self> {
        let period = Period::new(period);
        if period.as_str().is_empty() {
            return Err(AppError::InvalidDraw("empty period".to_string()));
        }
        if numbers.len() != PICK_COUNT {
            return Err(AppError::InvalidDraw(format!(
                "period {period}: expected {PICK_COUNT} numbers, got {}",
                numbers.len()
            )));
        }
        let mut sorted = [0u8; PICK_COUNT];
        sorted.copy_from_slice(numbers);
        sorted.sort_unstable();
        if let Some(&n) = sorted.iter().find(|&&n| n < 1 || n > NUMBER_MAX) {
            return Err(AppError::InvalidDraw(format!(
                "period {period}: number {n} outside 1-{NUMBER_MAX}"
            )));
        }
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(AppError::InvalidDraw(format!(
                "period {period}: duplicate numbers {sorted:?}"
            )));
        }
        if special_number < 1 || special_number > SPECIAL_MAX {
            return Err(AppError::InvalidDraw(format!(
                "period {period}: special number {special_number} outside 1-{SPECIAL_MAX}"
            )));
        }
        Ok(Self {
            period,
            draw_date,
            numbers: sorted,
            special_number,
        })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }
}

// ---------------------------------------------------------------------------
// Persisted analysis
// ---------------------------------------------------------------------------

/// Analysis row to upsert, keyed by `period`.
#[derive(Debug, Clone)]
pub struct NewAnalysisRecord {
    pub period: Period,
    pub avoid_numbers: Vec<u8>,
    pub frequency_data: serde_json::Value,
    pub gap_analysis: serde_json::Value,
    pub total_periods: usize,
    pub analysis_date: DateTime<Utc>,
}

/// Most recent stored analysis, shaped for API output.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub period: Period,
    pub avoid_numbers: Vec<u8>,
    pub frequency_data: serde_json::Value,
    pub gap_analysis: serde_json::Value,
    pub total_periods: usize,
    pub analysis_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Raw counts over the full history, independent of the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_periods: usize,
    /// Observed primary numbers only.
    pub number_frequency: BTreeMap<u8, u32>,
    pub special_frequency: BTreeMap<u8, u32>,
    pub average_frequency: f64,
    pub date_range: Option<DateRange>,
}

impl Statistics {
    pub fn empty() -> Self {
        Self {
            total_periods: 0,
            number_frequency: BTreeMap::new(),
            special_frequency: BTreeMap::new(),
            average_frequency: 0.0,
            date_range: None,
        }
    }
}

/// Round to two decimals, the precision every reported percentage and score uses.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
