use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::{distinct_periods, number_space};
use crate::types::{Draw, Period};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapEntry {
    pub last_appeared: Option<Period>,
    pub gap_periods: u32,
    pub total_appearances: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapSummary {
    pub gap_data: BTreeMap<u8, GapEntry>,
    /// Numbers tied at `max_gap_periods`, ascending.
    pub longest_gap: Vec<u8>,
    pub max_gap_periods: u32,
}

impl GapSummary {
    pub fn gap(&self, number: u8) -> u32 {
        self.gap_data.get(&number).map_or(0, |e| e.gap_periods)
    }
}

/// Periods since each number last appeared, measured from the newest period
/// in the window by identifier arithmetic.
///
/// A number whose last period (or the anchor) is not numeric gets a gap of 0
/// instead of failing the run. Numbers absent from the window get the
/// window's distinct period count.
pub fn analyze_gaps(draws: &[Draw]) -> GapSummary {
    let periods = distinct_periods(draws);
    let anchor = periods.first().copied();

    let mut gap_data = BTreeMap::new();
    for number in number_space() {
        let mut last: Option<&Period> = None;
        let mut appearances = 0u32;
        for draw in draws.iter().filter(|d| d.contains(number)) {
            appearances += 1;
            if last.map_or(true, |p| draw.period > *p) {
                last = Some(&draw.period);
            }
        }

        let entry = match (anchor, last) {
            (Some(anchor), Some(last)) => {
                let gap_periods = anchor.periods_since(last).unwrap_or_else(|| {
                    warn!(
                        number,
                        anchor = %anchor,
                        last_appeared = %last,
                        "Non-numeric period identifier, gap treated as 0"
                    );
                    0
                });
                GapEntry {
                    last_appeared: Some(last.clone()),
                    gap_periods,
                    total_appearances: appearances,
                }
            }
            _ => GapEntry {
                last_appeared: None,
                gap_periods: periods.len() as u32,
                total_appearances: 0,
            },
        };
        gap_data.insert(number, entry);
    }

    let max_gap_periods = gap_data.values().map(|e| e.gap_periods).max().unwrap_or(0);
    let longest_gap = gap_data
        .iter()
        .filter(|(_, e)| e.gap_periods == max_gap_periods)
        .map(|(&n, _)| n)
        .collect();

    GapSummary {
        gap_data,
        longest_gap,
        max_gap_periods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::draw;

    #[test]
    fn gap_is_distance_from_anchor_period() {
        let draws = vec![
            draw("115", [1, 2, 3, 4, 5, 6], 1),
            draw("110", [7, 8, 9, 10, 11, 12], 1),
            draw("100", [13, 14, 15, 16, 17, 18], 1),
        ];
        let g = analyze_gaps(&draws);
        assert_eq!(g.gap(1), 0);
        assert_eq!(g.gap(7), 5);
        assert_eq!(g.gap(13), 15);
        assert_eq!(
            g.gap_data[&13].last_appeared,
            Some(Period::new("100"))
        );
    }

    #[test]
    fn anchor_is_max_period_regardless_of_input_order() {
        let draws = vec![
            draw("100", [1, 2, 3, 4, 5, 6], 1),
            draw("115", [7, 8, 9, 10, 11, 12], 1),
            draw("110", [1, 14, 15, 16, 17, 18], 1),
        ];
        let g = analyze_gaps(&draws);
        assert_eq!(g.gap(1), 5);
        assert_eq!(g.gap_data[&1].total_appearances, 2);
        assert_eq!(g.gap_data[&1].last_appeared, Some(Period::new("110")));
    }

    #[test]
    fn unseen_numbers_get_window_size_and_zero_appearances() {
        let draws = vec![
            draw("3", [1, 2, 3, 4, 5, 6], 1),
            draw("2", [1, 2, 3, 4, 5, 6], 1),
            draw("1", [1, 2, 3, 4, 5, 6], 1),
        ];
        let g = analyze_gaps(&draws);
        for n in 7..=38u8 {
            assert_eq!(g.gap(n), 3);
            assert_eq!(g.gap_data[&n].total_appearances, 0);
            assert!(g.gap_data[&n].last_appeared.is_none());
        }
        assert_eq!(g.max_gap_periods, 3);
        assert_eq!(g.longest_gap, (7..=38).collect::<Vec<u8>>());
    }

    #[test]
    fn non_numeric_period_degrades_to_zero_gap() {
        let draws = vec![
            draw("120", [1, 2, 3, 4, 5, 6], 1),
            draw("11x", [7, 8, 9, 10, 11, 12], 1),
            draw("100", [13, 14, 15, 16, 17, 18], 1),
        ];
        let g = analyze_gaps(&draws);
        // "11x" sorts below every numeric period, so 7..12 last appeared there.
        assert_eq!(g.gap(7), 0);
        assert_eq!(g.gap_data[&7].total_appearances, 1);
        assert_eq!(g.gap(13), 20);
    }

    #[test]
    fn gaps_never_go_negative() {
        let draws = vec![draw("5", [1, 2, 3, 4, 5, 6], 1)];
        let g = analyze_gaps(&draws);
        assert!(g.gap_data.values().all(|e| e.gap_periods <= 1));
    }
}
