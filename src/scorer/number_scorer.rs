use std::fmt;

use serde::Serialize;

use crate::analysis::{number_space, FrequencySummary, GapSummary, TrendSummary};
use crate::config::weights::*;
use crate::types::round2;

/// Which way a ranking leans: numbers unlikely to be drawn, or likely to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Avoid,
    Likely,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Avoid => write!(f, "avoid"),
            Objective::Likely => write!(f, "likely"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumberScore {
    pub number: u8,
    pub score: f64,
}

/// Composite avoid score: rarity, long absence, cold trend.
pub fn avoid_score(frequency_percent: f64, gap_periods: u32, cold: bool) -> f64 {
    let freq_score = (AVOID_FREQ_CEILING - frequency_percent).max(0.0);
    let gap_score = (f64::from(gap_periods) * AVOID_GAP_PER_PERIOD).min(AVOID_GAP_CAP);
    let trend_score = if cold { AVOID_COLD_BONUS } else { 0.0 };

    round2(freq_score * AVOID_FREQ + gap_score * AVOID_GAP + trend_score * AVOID_TREND)
}

/// Piecewise gap score for the likely ranking. A gap of 0 (drawn in the
/// anchor period) scores the same as a gap above 15.
pub fn likely_gap_score(gap_periods: u32) -> f64 {
    match gap_periods {
        1..=5 => 40.0,
        6..=10 => 30.0,
        11..=15 => 20.0,
        _ => 10.0,
    }
}

/// Composite likely score: high frequency, moderate gap, not cold.
pub fn likely_score(frequency_percent: f64, gap_periods: u32, cold: bool) -> f64 {
    let freq_score = (frequency_percent * LIKELY_FREQ_MULTIPLIER).min(LIKELY_FREQ_CAP);
    let gap_score = likely_gap_score(gap_periods);
    let trend_score = if cold { 0.0 } else { LIKELY_HOT_BONUS };

    round2(freq_score * LIKELY_FREQ + gap_score * LIKELY_GAP + trend_score * LIKELY_TREND)
}

/// Score every number and order by score descending. The sort is stable over
/// 1..=38, so ties keep ascending number order.
pub fn rank_numbers(
    objective: Objective,
    frequency: &FrequencySummary,
    gaps: &GapSummary,
    trend: &TrendSummary,
) -> Vec<NumberScore> {
    let score_fn = match objective {
        Objective::Avoid => avoid_score,
        Objective::Likely => likely_score,
    };

    let mut ranking: Vec<NumberScore> = number_space()
        .map(|number| NumberScore {
            number,
            score: score_fn(frequency.percent(number), gaps.gap(number), trend.is_cold(number)),
        })
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}
