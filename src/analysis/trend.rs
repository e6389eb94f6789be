use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::{distinct_periods, number_space};
use crate::config::TREND_WINDOW_PERIODS;
use crate::types::{Draw, Period};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Count of each number within the recent sub-window.
    pub recent_frequency: BTreeMap<u8, u32>,
    /// Ascending.
    pub cold_numbers: Vec<u8>,
    pub cold_threshold: u32,
    /// Periods in the recent sub-window.
    pub analysis_periods: usize,
}

impl TrendSummary {
    pub fn is_cold(&self, number: u8) -> bool {
        self.cold_numbers.binary_search(&number).is_ok()
    }

    /// Complement of the cold set, ascending.
    pub fn hot_numbers(&self) -> Vec<u8> {
        number_space().filter(|&n| !self.is_cold(n)).collect()
    }
}

/// Cold threshold scales with the sub-window: one hit per ten periods, at least 1.
pub fn cold_threshold(recent_periods: usize) -> u32 {
    (recent_periods / 10).max(1) as u32
}

pub fn analyze_trends(draws: &[Draw]) -> TrendSummary {
    let periods = distinct_periods(draws);
    let recent: HashSet<&Period> = periods
        .iter()
        .copied()
        .take(TREND_WINDOW_PERIODS.min(periods.len()))
        .collect();

    let mut recent_frequency: BTreeMap<u8, u32> = number_space().map(|n| (n, 0)).collect();
    for draw in draws.iter().filter(|d| recent.contains(&d.period)) {
        for n in draw.numbers {
            if let Some(c) = recent_frequency.get_mut(&n) {
                *c += 1;
            }
        }
    }

    let threshold = cold_threshold(recent.len());
    let cold_numbers = recent_frequency
        .iter()
        .filter(|(_, &count)| count <= threshold)
        .map(|(&n, _)| n)
        .collect();

    TrendSummary {
        recent_frequency,
        cold_numbers,
        cold_threshold: threshold,
        analysis_periods: recent.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{draw, rotating_history};

    #[test]
    fn threshold_is_at_least_one() {
        assert_eq!(cold_threshold(0), 1);
        assert_eq!(cold_threshold(3), 1);
        assert_eq!(cold_threshold(19), 1);
        assert_eq!(cold_threshold(20), 2);
    }

    #[test]
    fn sub_window_is_capped_at_twenty_periods() {
        let draws = rotating_history(30);
        let t = analyze_trends(&draws);
        assert_eq!(t.analysis_periods, 20);
        assert_eq!(t.cold_threshold, 2);
        let total: u32 = t.recent_frequency.values().sum();
        assert_eq!(total, 20 * 6);
    }

    #[test]
    fn small_windows_use_every_period() {
        let draws = vec![
            draw("3", [1, 2, 3, 4, 5, 6], 1),
            draw("2", [1, 2, 3, 4, 5, 7], 1),
            draw("1", [1, 2, 3, 4, 5, 8], 1),
        ];
        let t = analyze_trends(&draws);
        assert_eq!(t.analysis_periods, 3);
        // 1..5 appear three times, above the threshold of 1.
        assert!(!t.is_cold(1));
        assert!(t.is_cold(6));
        assert!(t.is_cold(38));
        assert_eq!(t.hot_numbers(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn cold_set_never_contains_numbers_above_threshold() {
        let draws = rotating_history(45);
        let t = analyze_trends(&draws);
        for (&n, &count) in &t.recent_frequency {
            if count > t.cold_threshold {
                assert!(!t.is_cold(n), "number {n} with count {count}");
            } else {
                assert!(t.is_cold(n));
            }
        }
    }

    #[test]
    fn only_newest_periods_count() {
        let mut draws = rotating_history(20);
        // Older than every rotating period, so outside the sub-window.
        draws.push(draw("1", [33, 34, 35, 36, 37, 38], 1));
        draws.push(draw("2", [33, 34, 35, 36, 37, 38], 1));
        draws.push(draw("3", [33, 34, 35, 36, 37, 38], 1));
        let t = analyze_trends(&draws);
        assert_eq!(t.analysis_periods, 20);
        assert_eq!(
            t.recent_frequency.values().sum::<u32>(),
            20 * 6
        );
    }
}
