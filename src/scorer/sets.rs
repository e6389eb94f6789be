use std::cmp::Reverse;
use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::number_scorer::{rank_numbers, NumberScore, Objective};
use crate::analysis::{number_space, FrequencySummary, GapSummary, TrendSummary};
use crate::config::{weights::LIKELY_GAP_TARGET, PICK_COUNT, SET_COUNT};

/// Six distinct numbers, ascending.
pub type CandidateSet = Vec<u8>;

// Rank slices used by the fixed-position sets.
const TOP: Range<usize> = 0..6;
const UPPER_MID: Range<usize> = 2..8;
const MID: Range<usize> = 4..10;
const LOWER_MID: Range<usize> = 6..12;
const TAIL: Range<usize> = 8..14;

/// Pool size for the shuffled set.
const SHUFFLE_POOL: usize = 15;

/// Picks per source in the balanced set.
const BALANCED_EACH: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSets {
    pub objective: Objective,
    pub ranking: Vec<NumberScore>,
    pub sets: Vec<CandidateSet>,
}

/// Rank the number space for `objective` and build ten diversified sets.
///
/// Set 8 draws from `rng`; every other set is a pure function of the summaries.
pub fn generate_sets<R: Rng + ?Sized>(
    objective: Objective,
    frequency: &FrequencySummary,
    gaps: &GapSummary,
    trend: &TrendSummary,
    rng: &mut R,
) -> ScoredSets {
    let ranking = rank_numbers(objective, frequency, gaps, trend);
    let ranked: Vec<u8> = ranking.iter().map(|s| s.number).collect();

    let mut gap_order: Vec<u8> = number_space().collect();
    let mut freq_order: Vec<u8> = number_space().collect();
    let trend_set = match objective {
        Objective::Avoid => {
            gap_order.sort_by_key(|&n| Reverse(gaps.gap(n)));
            freq_order.sort_by(|&a, &b| frequency.percent(a).total_cmp(&frequency.percent(b)));
            trend.cold_numbers.clone()
        }
        Objective::Likely => {
            gap_order.sort_by_key(|&n| (i64::from(gaps.gap(n)) - LIKELY_GAP_TARGET).abs());
            freq_order.sort_by(|&a, &b| frequency.percent(b).total_cmp(&frequency.percent(a)));
            trend.hot_numbers()
        }
    };

    let trend_pick = if trend_set.len() >= PICK_COUNT {
        trend_set[..PICK_COUNT].to_vec()
    } else {
        let mut picks = trend_set.clone();
        picks.extend(
            ranked
                .iter()
                .filter(|n| !trend_set.contains(n))
                .take(PICK_COUNT - trend_set.len()),
        );
        picks
    };

    let mut shuffled = ranked[..SHUFFLE_POOL].to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(PICK_COUNT);

    let mut balanced = ranked[..BALANCED_EACH].to_vec();
    balanced.extend(gap_order.iter().take(BALANCED_EACH));
    balanced.extend(trend_set.iter().take(BALANCED_EACH));

    let raw: [Vec<u8>; SET_COUNT] = [
        ranked[TOP].to_vec(),
        ranked[UPPER_MID].to_vec(),
        ranked[MID].to_vec(),
        gap_order[..PICK_COUNT].to_vec(),
        freq_order[..PICK_COUNT].to_vec(),
        trend_pick,
        ranked[LOWER_MID].to_vec(),
        shuffled,
        balanced,
        ranked[TAIL].to_vec(),
    ];

    let sets = raw.into_iter().map(|s| finalize(s, &ranked)).collect();

    ScoredSets {
        objective,
        ranking,
        sets,
    }
}

/// Dedup, top up from the ranking until six, keep six, sort ascending.
fn finalize(mut picks: Vec<u8>, ranked: &[u8]) -> CandidateSet {
    picks.sort_unstable();
    picks.dedup();
    for &n in ranked {
        if picks.len() >= PICK_COUNT {
            break;
        }
        if !picks.contains(&n) {
            picks.push(n);
        }
    }
    picks.truncate(PICK_COUNT);
    picks.sort_unstable();
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{draw, rotating_history};
    use crate::analysis::{analyze_frequency, analyze_gaps, analyze_trends};
    use crate::config::NUMBER_MAX;
    use crate::types::Draw;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(objective: Objective, draws: &[Draw], seed: u64) -> ScoredSets {
        let f = analyze_frequency(draws);
        let g = analyze_gaps(draws);
        let t = analyze_trends(draws);
        generate_sets(objective, &f, &g, &t, &mut StdRng::seed_from_u64(seed))
    }

    fn assert_well_formed(sets: &[CandidateSet]) {
        assert_eq!(sets.len(), SET_COUNT);
        for set in sets {
            assert_eq!(set.len(), PICK_COUNT, "{set:?}");
            assert!(set.windows(2).all(|w| w[0] < w[1]), "{set:?} not strictly ascending");
            assert!(set.iter().all(|&n| (1..=NUMBER_MAX).contains(&n)), "{set:?}");
        }
    }

    /// 1 and 2 in every draw; 3-6, 7-10, 11-14 once each at gaps 0, 1, 2.
    fn three_draws() -> Vec<Draw> {
        vec![
            draw("103", [1, 2, 3, 4, 5, 6], 1),
            draw("102", [1, 2, 7, 8, 9, 10], 2),
            draw("101", [1, 2, 11, 12, 13, 14], 3),
        ]
    }

    fn range(r: std::ops::RangeInclusive<u8>) -> Vec<u8> {
        r.collect()
    }

    #[test]
    fn finalize_dedups_pads_from_ranking_and_sorts() {
        let ranked = [9, 4, 30, 1, 2, 3, 5];
        assert_eq!(finalize(vec![30, 4, 4, 30], &ranked), vec![1, 2, 3, 4, 9, 30]);
        assert_eq!(finalize(vec![6, 5, 4, 3, 2, 1], &ranked), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn avoid_sets_for_three_draws() {
        let s = build(Objective::Avoid, &three_draws(), 7);

        assert_eq!(s.ranking[0], NumberScore { number: 15, score: 18.4 });
        assert_eq!(s.ranking[24], NumberScore { number: 11, score: 5.6 });
        assert_eq!(s.ranking[28], NumberScore { number: 7, score: 4.8 });
        assert_eq!(s.ranking[32], NumberScore { number: 3, score: 4.0 });
        assert_eq!(s.ranking[37], NumberScore { number: 2, score: 0.0 });

        assert_eq!(s.sets[0], range(15..=20));
        assert_eq!(s.sets[1], range(17..=22));
        assert_eq!(s.sets[2], range(19..=24));
        assert_eq!(s.sets[3], range(15..=20));
        assert_eq!(s.sets[4], range(15..=20));
        assert_eq!(s.sets[5], range(3..=8));
        assert_eq!(s.sets[6], range(21..=26));
        assert!(s.sets[7].iter().all(|n| (15..=29).contains(n)));
        assert_eq!(s.sets[8], vec![3, 4, 15, 16, 17, 18]);
        assert_eq!(s.sets[9], range(23..=28));
        assert_well_formed(&s.sets);
    }

    #[test]
    fn avoid_trend_set_pads_a_short_cold_list_from_the_ranking() {
        // Twenty draws over 1..=36: every drawn number lands three or four
        // times, above the threshold of 2. Only 37 and 38 stay cold.
        let draws: Vec<Draw> = (0..20usize)
            .rev()
            .map(|i| {
                let numbers: Vec<u8> = (0..6).map(|k| ((i * 6 + k) % 36) as u8 + 1).collect();
                let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
                Draw::new(format!("{}", 1001 + i), date, &numbers, 1).unwrap()
            })
            .collect();
        let t = analyze_trends(&draws);
        assert_eq!(t.cold_numbers, vec![37, 38]);

        let s = build(Objective::Avoid, &draws, 7);

        assert_eq!(s.ranking[0], NumberScore { number: 37, score: 32.0 });
        assert_eq!(s.ranking[1], NumberScore { number: 38, score: 32.0 });
        assert!(s.sets[5].contains(&37) && s.sets[5].contains(&38));
        assert_eq!(s.sets[5], s.sets[0]);
        assert_well_formed(&s.sets);
    }

    #[test]
    fn likely_sets_for_three_draws() {
        let s = build(Objective::Likely, &three_draws(), 7);

        assert_eq!(s.ranking[0], NumberScore { number: 7, score: 45.33 });
        assert_eq!(s.ranking[8], NumberScore { number: 1, score: 40.0 });
        assert_eq!(s.ranking[10], NumberScore { number: 3, score: 36.33 });
        assert_eq!(s.ranking[14], NumberScore { number: 15, score: 12.0 });

        assert_eq!(s.sets[0], range(7..=12));
        assert_eq!(s.sets[1], range(9..=14));
        assert_eq!(s.sets[2], vec![1, 2, 11, 12, 13, 14]);
        assert_eq!(s.sets[3], range(15..=20));
        assert_eq!(s.sets[4], range(1..=6));
        // Only 1 and 2 are hot; the rest comes from the top of the ranking.
        assert_eq!(s.sets[5], vec![1, 2, 7, 8, 9, 10]);
        assert_eq!(s.sets[6], vec![1, 2, 3, 4, 13, 14]);
        assert!(s.sets[7].iter().all(|n| (1..=15).contains(n)));
        assert_eq!(s.sets[8], vec![1, 2, 7, 8, 15, 16]);
        assert_eq!(s.sets[9], range(1..=6));
        assert_well_formed(&s.sets);
    }

    #[test]
    fn every_set_is_well_formed_on_longer_history() {
        let draws = rotating_history(60);
        for objective in [Objective::Avoid, Objective::Likely] {
            for seed in 0..5 {
                assert_well_formed(&build(objective, &draws, seed).sets);
            }
        }
    }

    #[test]
    fn fixed_seed_reproduces_every_set() {
        let draws = rotating_history(25);
        for objective in [Objective::Avoid, Objective::Likely] {
            assert_eq!(build(objective, &draws, 42), build(objective, &draws, 42));
        }
    }

    #[test]
    fn only_the_shuffled_set_depends_on_the_rng() {
        let draws = rotating_history(25);
        let a = build(Objective::Avoid, &draws, 1);
        let b = build(Objective::Avoid, &draws, 2);
        assert_eq!(a.ranking, b.ranking);
        for i in (0..SET_COUNT).filter(|&i| i != 7) {
            assert_eq!(a.sets[i], b.sets[i], "set {}", i + 1);
        }
    }

    #[test]
    fn ranking_ties_keep_ascending_number_order() {
        let s = build(Objective::Avoid, &three_draws(), 0);
        let tied: Vec<u8> = s
            .ranking
            .iter()
            .filter(|r| r.score == 18.4)
            .map(|r| r.number)
            .collect();
        assert_eq!(tied, range(15..=38));
    }
}
