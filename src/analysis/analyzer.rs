use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use super::{
    analyze_frequency, analyze_gaps, analyze_special, analyze_trends, distinct_periods,
    FrequencySummary, GapSummary, SpecialSummary, TrendSummary,
};
use crate::analysis::special::special_counts;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::MIN_ANALYSIS_DRAWS;
use crate::db::DrawStore;
use crate::error::Result;
use crate::scorer::{generate_sets, CandidateSet, NumberScore, Objective};
use crate::types::{
    round2, AnalysisRecord, DateRange, Draw, NewAnalysisRecord, Period, Statistics,
};

/// Everything one analysis run produces. Only the primary avoid set and the
/// frequency/gap summaries are persisted; the rest is response-only.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisBundle {
    /// Newest period in the window; the persistence key.
    pub period: Period,
    pub avoid_number_sets: Vec<CandidateSet>,
    pub likely_number_sets: Vec<CandidateSet>,
    pub avoid_ranking: Vec<NumberScore>,
    pub likely_ranking: Vec<NumberScore>,
    pub frequency_analysis: FrequencySummary,
    pub gap_analysis: GapSummary,
    pub trend_analysis: TrendSummary,
    pub special_analysis: SpecialSummary,
    /// Draws in the analyzed window.
    pub total_periods: usize,
    pub analysis_date: DateTime<Utc>,
    pub persisted: bool,
}

impl AnalysisBundle {
    pub fn primary_avoid(&self) -> &[u8] {
        self.avoid_number_sets.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn primary_likely(&self) -> &[u8] {
        self.likely_number_sets.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Runs analysis passes over windows read from a [`DrawStore`].
///
/// Holds no history between calls. The only state is the randomness source
/// behind the shuffled candidate set, seeded once at construction.
pub struct Analyzer<S> {
    store: S,
    rng: Mutex<StdRng>,
    latency: Arc<LatencyStats>,
    health: Arc<HealthState>,
}

impl<S: DrawStore> Analyzer<S> {
    /// `seed` fixes the shuffled set for reproducible output; `None` seeds from the OS.
    pub fn new(
        store: S,
        seed: Option<u64>,
        latency: Arc<LatencyStats>,
        health: Arc<HealthState>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            rng: Mutex::new(rng),
            latency,
            health,
        }
    }

    /// Analyze the newest `window` draws, or the full history when `window`
    /// is `None` or 0.
    ///
    /// Returns `Ok(None)` when the window holds fewer than three draws. A failed
    /// save is logged and reported through `persisted`; the bundle is still returned.
    pub async fn analyze(&self, window: Option<usize>) -> Result<Option<AnalysisBundle>> {
        let limit = window.filter(|&w| w > 0);
        let draws = self.store.get_all_draws(limit).await?;
        match limit {
            Some(w) => info!(requested = w, loaded = draws.len(), "Analyzing newest draws"),
            None => info!(loaded = draws.len(), "Analyzing full history"),
        }

        if draws.len() < MIN_ANALYSIS_DRAWS {
            warn!(
                loaded = draws.len(),
                required = MIN_ANALYSIS_DRAWS,
                "Insufficient history, analysis skipped"
            );
            return Ok(None);
        }

        let started = Instant::now();
        let Some(mut bundle) = self.compute(&draws) else {
            return Ok(None);
        };
        self.latency.record(started.elapsed());

        let record = NewAnalysisRecord {
            period: bundle.period.clone(),
            avoid_numbers: bundle.primary_avoid().to_vec(),
            frequency_data: serde_json::to_value(&bundle.frequency_analysis)?,
            gap_analysis: serde_json::to_value(&bundle.gap_analysis)?,
            total_periods: bundle.total_periods,
            analysis_date: bundle.analysis_date,
        };
        bundle.persisted = self.store.save_analysis_result(&record).await;
        if !bundle.persisted {
            warn!(period = %bundle.period, "Analysis result not persisted, returning it anyway");
        }
        self.health.set_last_analysis_at_ms(bundle.analysis_date.timestamp_millis());

        info!(
            period = %bundle.period,
            total_periods = bundle.total_periods,
            avoid = ?bundle.primary_avoid(),
            likely = ?bundle.primary_likely(),
            "Analysis complete"
        );
        Ok(Some(bundle))
    }

    /// Pure computation over an already loaded window. `None` for an empty window.
    pub fn compute(&self, draws: &[Draw]) -> Option<AnalysisBundle> {
        let period = distinct_periods(draws).first().map(|p| (*p).clone())?;

        let frequency = analyze_frequency(draws);
        let gaps = analyze_gaps(draws);
        let trend = analyze_trends(draws);
        let special = analyze_special(draws);

        let (avoid, likely) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let avoid = generate_sets(Objective::Avoid, &frequency, &gaps, &trend, &mut *rng);
            let likely = generate_sets(Objective::Likely, &frequency, &gaps, &trend, &mut *rng);
            (avoid, likely)
        };

        Some(AnalysisBundle {
            period,
            avoid_number_sets: avoid.sets,
            likely_number_sets: likely.sets,
            avoid_ranking: avoid.ranking,
            likely_ranking: likely.ranking,
            frequency_analysis: frequency,
            gap_analysis: gaps,
            trend_analysis: trend,
            special_analysis: special,
            total_periods: draws.len(),
            analysis_date: Utc::now(),
            persisted: false,
        })
    }

    pub async fn latest_analysis(&self) -> Result<Option<AnalysisRecord>> {
        self.store.get_latest_analysis_result().await
    }

    /// Raw counts over the full history. Empty summary for an empty store.
    pub async fn statistics(&self) -> Result<Statistics> {
        let draws = self.store.get_all_draws(None).await?;
        if draws.is_empty() {
            return Ok(Statistics::empty());
        }

        let mut number_frequency = std::collections::BTreeMap::new();
        for draw in &draws {
            for n in draw.numbers {
                *number_frequency.entry(n).or_insert(0u32) += 1;
            }
        }
        let total: u32 = number_frequency.values().sum();
        let average_frequency = round2(f64::from(total) / number_frequency.len() as f64);

        let date_range = draws
            .iter()
            .map(|d| d.draw_date)
            .min()
            .zip(draws.iter().map(|d| d.draw_date).max())
            .map(|(start, end)| DateRange { start, end });

        Ok(Statistics {
            total_periods: draws.len(),
            number_frequency,
            special_frequency: special_counts(&draws),
            average_frequency,
            date_range,
        })
    }
}
