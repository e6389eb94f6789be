pub mod analyzer;
pub mod frequency;
pub mod gap;
pub mod special;
pub mod trend;

pub use analyzer::{AnalysisBundle, Analyzer};
pub use frequency::{analyze_frequency, FrequencySummary};
pub use gap::{analyze_gaps, GapSummary};
pub use special::{analyze_special, SpecialSummary};
pub use trend::{analyze_trends, TrendSummary};

use crate::config::NUMBER_MAX;
use crate::types::{Draw, Period};

/// The primary number space, ascending.
pub fn number_space() -> impl Iterator<Item = u8> {
    1..=NUMBER_MAX
}

/// Distinct periods in the window, newest first.
pub(crate) fn distinct_periods(draws: &[Draw]) -> Vec<&Period> {
    let mut periods: Vec<&Period> = draws.iter().map(|d| &d.period).collect();
    periods.sort_unstable_by(|a, b| b.cmp(a));
    periods.dedup();
    periods
}


#[cfg(test)]
mod tests {
    use super::test_support::draw;
    use super::*;

    #[test]
    fn distinct_periods_are_newest_first_without_duplicates() {
        let draws = vec![
            draw("99", [1, 2, 3, 4, 5, 6], 1),
            draw("101", [1, 2, 3, 4, 5, 6], 1),
            draw("100", [1, 2, 3, 4, 5, 6], 1),
            draw("101", [7, 8, 9, 10, 11, 12], 1),
        ];
        let periods: Vec<&str> = distinct_periods(&draws).iter().map(|p| p.as_str()).collect();
        assert_eq!(periods, vec!["101", "100", "99"]);
    }
}
