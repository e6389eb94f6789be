use std::collections::BTreeMap;

use serde::Serialize;

use super::{distinct_periods, number_space};
use crate::types::{round2, Draw};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencySummary {
    /// Draws containing each number, every number in the space present.
    pub frequency_count: BTreeMap<u8, u32>,
    /// Share of analyzed periods containing each number, 0-100, two decimals.
    pub frequency_percent: BTreeMap<u8, f64>,
    /// Numbers tied at the minimum percentage, ascending.
    pub least_frequent: Vec<u8>,
    /// Distinct periods in the window: the percentage base.
    pub total_periods: usize,
}

impl FrequencySummary {
    pub fn percent(&self, number: u8) -> f64 {
        self.frequency_percent.get(&number).copied().unwrap_or(0.0)
    }

    pub fn count(&self, number: u8) -> u32 {
        self.frequency_count.get(&number).copied().unwrap_or(0)
    }
}

pub fn analyze_frequency(draws: &[Draw]) -> FrequencySummary {
    let total_periods = distinct_periods(draws).len();

    let mut frequency_count: BTreeMap<u8, u32> = number_space().map(|n| (n, 0)).collect();
    for draw in draws {
        for n in draw.numbers {
            if let Some(c) = frequency_count.get_mut(&n) {
                *c += 1;
            }
        }
    }

    let frequency_percent: BTreeMap<u8, f64> = frequency_count
        .iter()
        .map(|(&n, &count)| {
            let pct = if total_periods == 0 {
                0.0
            } else {
                round2(f64::from(count) / total_periods as f64 * 100.0)
            };
            (n, pct)
        })
        .collect();

    let min = frequency_percent
        .values()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let least_frequent = frequency_percent
        .iter()
        .filter(|(_, &pct)| pct == min)
        .map(|(&n, _)| n)
        .collect();

    FrequencySummary {
        frequency_count,
        frequency_percent,
        least_frequent,
        total_periods,
    }
}
