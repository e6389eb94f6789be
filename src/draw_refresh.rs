use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::analysis::Analyzer;
use crate::api::health::HealthState;
use crate::db::{DrawStore, SqliteStore};
use crate::error::Result;
use crate::fetcher::DrawFetcher;
use crate::types::Period;

#[derive(Debug)]
pub struct UpdateOutcome {
    pub fetched: usize,
    pub written: usize,
    pub last_period: Option<Period>,
}

/// Fetch draws newer than the latest stored one (everything when the store is
/// empty) and upsert them.
///
/// The latest stored draw's month is fetched again, so a draw the provider
/// published late in that month is still picked up.
pub async fn update_draws<S: DrawStore>(
    store: &S,
    fetcher: &DrawFetcher,
    health: &HealthState,
) -> Result<UpdateOutcome> {
    let since = store.get_latest_draw().await?.map(|d| d.draw_date);
    let (draws, stats) = fetcher.fetch_draws(since).await?;
    info!(
        "[FETCH] months={} failed={} items={} accepted={} duplicates={} rejected: no_period={} bad_numbers={} bad_date={}",
        stats.months_requested,
        stats.months_failed,
        stats.api_total,
        stats.accepted,
        stats.duplicates,
        stats.rejected_no_period,
        stats.rejected_bad_numbers,
        stats.rejected_bad_date,
    );

    let mut written = 0;
    for draw in &draws {
        if store.upsert_draw(draw).await {
            written += 1;
        }
    }
    health.record_fetch(Utc::now().timestamp_millis(), written);

    let last_period = store.get_latest_draw().await?.map(|d| d.period);
    Ok(UpdateOutcome {
        fetched: draws.len(),
        written,
        last_period,
    })
}

/// Periodic fetch + full-history analysis.
pub struct DrawRefresher {
    interval_secs: u64,
    store: SqliteStore,
    fetcher: Arc<DrawFetcher>,
    analyzer: Arc<Analyzer<SqliteStore>>,
    health: Arc<HealthState>,
}

impl DrawRefresher {
    pub fn new(
        interval_secs: u64,
        store: SqliteStore,
        fetcher: Arc<DrawFetcher>,
        analyzer: Arc<Analyzer<SqliteStore>>,
        health: Arc<HealthState>,
    ) -> Self {
        Self {
            interval_secs,
            store,
            fetcher,
            analyzer,
            health,
        }
    }

    pub async fn run(self) {
        if self.interval_secs == 0 {
            return;
        }
        let mut ticker = interval(Duration::from_secs(self.interval_secs));
        ticker.tick().await; // first tick fires immediately; startup already has data

        loop {
            ticker.tick().await;
            let Some(_guard) = self.health.try_begin_update() else {
                info!("Update already in progress, skipping scheduled refresh");
                continue;
            };
            if let Err(e) = self.refresh().await {
                error!("Scheduled refresh failed: {e}");
            }
        }
    }

    async fn refresh(&self) -> Result<()> {
        let outcome = update_draws(&self.store, &self.fetcher, &self.health).await?;
        info!(
            fetched = outcome.fetched,
            written = outcome.written,
            last_period = ?outcome.last_period,
            "Scheduled refresh complete: {} draws written",
            outcome.written,
        );

        match self.analyzer.analyze(None).await? {
            Some(bundle) => info!(
                period = %bundle.period,
                avoid = ?bundle.primary_avoid(),
                likely = ?bundle.primary_likely(),
                "Scheduled analysis complete"
            ),
            None => info!("Scheduled analysis skipped: not enough draws"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::draw;
    use crate::api::latency::LatencyStats;
    use crate::config::Config;
    use crate::db::seed::seed_if_empty;
    use crate::db::store::test_support::memory_store;
    use crate::fetcher::test_support::{provider_fetcher, spawn_provider};

    fn dead_fetcher() -> DrawFetcher {
        DrawFetcher::new(&Config::for_tests())
            .unwrap()
            .with_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn failed_fetch_leaves_the_store_untouched() {
        let store = memory_store().await;
        store.upsert_draw(&draw("114000001", [1, 2, 3, 4, 5, 6], 1)).await;
        let health = HealthState::new();

        let result = update_draws(&store, &dead_fetcher(), &health).await;

        assert!(result.is_err());
        assert_eq!(store.count_draws().await.unwrap(), 1);
        assert!(health.last_fetch_at().is_none());
    }

    #[tokio::test]
    async fn update_writes_fetched_draws_and_records_the_fetch() {
        let store = memory_store().await;
        let health = HealthState::new();
        let fetcher = provider_fetcher(spawn_provider().await);

        let outcome = update_draws(&store, &fetcher, &health).await.unwrap();

        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.last_period.unwrap().as_str(), "114000002");
        assert_eq!(store.count_draws().await.unwrap(), 2);
        assert!(health.last_fetch_at().is_some());
        assert_eq!(health.last_fetch_written(), 2);
    }

    #[tokio::test]
    async fn refresh_fetches_then_analyzes_the_full_history() {
        let store = memory_store().await;
        seed_if_empty(&store).await.unwrap();
        let health = Arc::new(HealthState::new());
        let analyzer = Arc::new(Analyzer::new(
            store.clone(),
            Some(7),
            Arc::new(LatencyStats::new()),
            Arc::clone(&health),
        ));
        let fetcher = Arc::new(provider_fetcher(spawn_provider().await));
        let refresher = DrawRefresher::new(60, store.clone(), fetcher, analyzer, Arc::clone(&health));

        refresher.refresh().await.unwrap();

        assert_eq!(store.count_draws().await.unwrap(), 7);
        assert_eq!(health.last_fetch_written(), 2);
        assert!(health.last_analysis_at().is_some());
        let stored = store.get_latest_analysis_result().await.unwrap().unwrap();
        assert_eq!(stored.period.as_str(), "114000002");
        assert_eq!(stored.total_periods, 7);
    }
}
