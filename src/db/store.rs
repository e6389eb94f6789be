use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, warn};

use crate::db::models::{AnalysisRow, DrawRow, DATE_FORMAT};
use crate::error::Result;
use crate::types::{AnalysisRecord, Draw, NewAnalysisRecord};

/// Record store the analysis core reads its windows from and writes results to.
///
/// Reads propagate errors. Writes report success as a bool and log their own
/// failures, so a failed write never aborts the caller.
#[async_trait]
pub trait DrawStore: Send + Sync {
    /// Newest period first. `None` returns the full history.
    async fn get_all_draws(&self, limit: Option<usize>) -> Result<Vec<Draw>>;

    /// 1-based `page`, newest period first.
    async fn get_draws_paginated(&self, page: usize, per_page: usize) -> Result<Vec<Draw>>;

    async fn get_latest_draw(&self) -> Result<Option<Draw>>;

    async fn count_draws(&self) -> Result<usize>;

    /// Insert or replace the draw with the same period.
    async fn upsert_draw(&self, draw: &Draw) -> bool;

    /// Insert or replace the analysis for `record.period`.
    async fn save_analysis_result(&self, record: &NewAnalysisRecord) -> bool;

    async fn get_latest_analysis_result(&self) -> Result<Option<AnalysisRecord>>;
}

/// SQLite-backed store. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: sqlx::SqlitePool,
}

const DRAW_COLUMNS: &str = "period, draw_date, numbers, special_number";

impl SqliteStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch, returning how many rows were written.
    pub async fn upsert_draws(&self, draws: &[Draw]) -> usize {
        let mut written = 0;
        for draw in draws {
            if self.upsert_draw(draw).await {
                written += 1;
            }
        }
        written
    }

    /// Every decodable draw, newest period first by [`Period`] ordering.
    ///
    /// Windows are cut from this list rather than with SQL `ORDER BY`/`LIMIT`:
    /// SQLite's `CAST` reads the leading digits of ids like `200x`, which
    /// `Period` treats as non-numeric, and a SQL limit would count rows that
    /// fail to decode.
    async fn newest_first(&self) -> Result<Vec<Draw>> {
        let rows: Vec<DrawRow> =
            sqlx::query_as(&format!("SELECT {DRAW_COLUMNS} FROM lottery_draws"))
                .fetch_all(&self.pool)
                .await?;

        let mut draws = decode_draws(rows);
        draws.sort_unstable_by(|a, b| b.period.cmp(&a.period));
        Ok(draws)
    }

    async fn write_draw(&self, draw: &Draw) -> Result<()> {
        let now_ms = Utc::now().timestamp_millis();
        let numbers = serde_json::to_string(&draw.numbers)?;
        let draw_date = draw.draw_date.format(DATE_FORMAT).to_string();

        sqlx::query(
            r#"
            INSERT INTO lottery_draws (period, draw_date, numbers, special_number, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(period) DO UPDATE SET
                draw_date = excluded.draw_date,
                numbers = excluded.numbers,
                special_number = excluded.special_number,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(draw.period.as_str())
        .bind(draw_date)
        .bind(numbers)
        .bind(i64::from(draw.special_number))
        .bind(now_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn write_analysis(&self, r: &NewAnalysisRecord) -> Result<()> {
        let avoid_numbers = serde_json::to_string(&r.avoid_numbers)?;
        let frequency_data = serde_json::to_string(&r.frequency_data)?;
        let gap_analysis = serde_json::to_string(&r.gap_analysis)?;

        sqlx::query(
            r#"
            INSERT INTO analysis_results (
                period, avoid_numbers, frequency_data, gap_analysis, total_periods, analysis_date
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(period) DO UPDATE SET
                avoid_numbers = excluded.avoid_numbers,
                frequency_data = excluded.frequency_data,
                gap_analysis = excluded.gap_analysis,
                total_periods = excluded.total_periods,
                analysis_date = excluded.analysis_date
            "#,
        )
        .bind(r.period.as_str())
        .bind(avoid_numbers)
        .bind(frequency_data)
        .bind(gap_analysis)
        .bind(r.total_periods as i64)
        .bind(r.analysis_date.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Decode rows, skipping any that no longer validate.
fn decode_draws(rows: Vec<DrawRow>) -> Vec<Draw> {
    rows.into_iter()
        .filter_map(|row| {
            let period = row.period.clone();
            match Draw::try_from(row) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(period = %period, "Skipping undecodable draw row: {e}");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl DrawStore for SqliteStore {
    async fn get_all_draws(&self, limit: Option<usize>) -> Result<Vec<Draw>> {
        let mut draws = self.newest_first().await?;
        if let Some(limit) = limit {
            draws.truncate(limit);
        }
        Ok(draws)
    }

    async fn get_draws_paginated(&self, page: usize, per_page: usize) -> Result<Vec<Draw>> {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        Ok(self
            .newest_first()
            .await?
            .into_iter()
            .skip(offset)
            .take(per_page)
            .collect())
    }

    async fn get_latest_draw(&self) -> Result<Option<Draw>> {
        Ok(self.get_all_draws(Some(1)).await?.into_iter().next())
    }

    async fn count_draws(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lottery_draws")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn upsert_draw(&self, draw: &Draw) -> bool {
        match self.write_draw(draw).await {
            Ok(()) => true,
            Err(e) => {
                error!(period = %draw.period, "Draw upsert failed: {e}");
                false
            }
        }
    }

    async fn save_analysis_result(&self, record: &NewAnalysisRecord) -> bool {
        match self.write_analysis(record).await {
            Ok(()) => true,
            Err(e) => {
                error!(period = %record.period, "Saving analysis result failed: {e}");
                false
            }
        }
    }

    async fn get_latest_analysis_result(&self) -> Result<Option<AnalysisRecord>> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT period, avoid_numbers, frequency_data, gap_analysis, total_periods, analysis_date
            FROM analysis_results
            ORDER BY analysis_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnalysisRecord::try_from).transpose()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::SqliteStore;

    /// Fresh migrated in-memory database. One connection, so every query sees
    /// the same database.
    pub async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteStore::new(pool)
    }
}
