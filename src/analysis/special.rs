use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AVOID_SPECIAL_COUNT;
use crate::types::Draw;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialSummary {
    /// Observed special values only.
    pub frequency: BTreeMap<u8, u32>,
    /// Up to two values tied at the minimum count, ascending.
    pub avoid_special: Vec<u8>,
}

pub fn special_counts(draws: &[Draw]) -> BTreeMap<u8, u32> {
    let mut frequency = BTreeMap::new();
    for draw in draws {
        *frequency.entry(draw.special_number).or_insert(0u32) += 1;
    }
    frequency
}

pub fn analyze_special(draws: &[Draw]) -> SpecialSummary {
    let frequency = special_counts(draws);
    let Some(&min) = frequency.values().min() else {
        return SpecialSummary {
            frequency,
            avoid_special: Vec::new(),
        };
    };

    let avoid_special = frequency
        .iter()
        .filter(|(_, &count)| count == min)
        .map(|(&n, _)| n)
        .take(AVOID_SPECIAL_COUNT)
        .collect();

    SpecialSummary {
        frequency,
        avoid_special,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::draw;

    #[test]
    fn empty_window_is_not_an_error() {
        let s = analyze_special(&[]);
        assert!(s.frequency.is_empty());
        assert!(s.avoid_special.is_empty());
    }

    #[test]
    fn counts_one_per_draw() {
        let draws = vec![
            draw("1", [1, 2, 3, 4, 5, 6], 2),
            draw("2", [1, 2, 3, 4, 5, 6], 2),
            draw("3", [1, 2, 3, 4, 5, 6], 7),
        ];
        let s = analyze_special(&draws);
        assert_eq!(s.frequency[&2], 2);
        assert_eq!(s.frequency[&7], 1);
        assert_eq!(s.avoid_special, vec![7]);
    }

    #[test]
    fn avoid_list_is_capped_at_two() {
        let draws = vec![
            draw("1", [1, 2, 3, 4, 5, 6], 5),
            draw("2", [1, 2, 3, 4, 5, 6], 3),
            draw("3", [1, 2, 3, 4, 5, 6], 8),
            draw("4", [1, 2, 3, 4, 5, 6], 8),
        ];
        let s = analyze_special(&draws);
        assert_eq!(s.avoid_special, vec![3, 5]);
    }
}
