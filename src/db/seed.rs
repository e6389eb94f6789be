use chrono::NaiveDate;
use tracing::{info, warn};

use crate::db::store::{DrawStore, SqliteStore};
use crate::error::Result;
use crate::types::Draw;

/// (period, (y, m, d), numbers, special)
const SAMPLE_DRAWS: &[(&str, (i32, u32, u32), [u8; 6], u8)] = &[
    ("114054", (2025, 7, 7), [1, 12, 23, 25, 33, 35], 5),
    ("114053", (2025, 7, 4), [3, 8, 19, 22, 28, 37], 2),
    ("114052", (2025, 7, 1), [5, 14, 18, 26, 31, 38], 7),
    ("114051", (2025, 6, 28), [2, 9, 16, 24, 29, 36], 1),
    ("114050", (2025, 6, 25), [4, 11, 17, 21, 30, 34], 6),
];

pub fn sample_draws() -> Vec<Draw> {
    SAMPLE_DRAWS
        .iter()
        .filter_map(|&(period, (y, m, d), numbers, special)| {
            let date = NaiveDate::from_ymd_opt(y, m, d)?;
            match Draw::new(period, date, &numbers, special) {
                Ok(draw) => Some(draw),
                Err(e) => {
                    warn!("Invalid sample draw {period}: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Insert the sample draws when the store is empty. Returns rows written.
pub async fn seed_if_empty(store: &SqliteStore) -> Result<usize> {
    let existing = store.count_draws().await?;
    if existing > 0 {
        info!("Store already has {existing} draws, skipping sample data");
        return Ok(0);
    }
    let written = store.upsert_draws(&sample_draws()).await;
    info!("Seeded {written} sample draws");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::test_support::memory_store;

    #[test]
    fn sample_draws_are_valid() {
        assert_eq!(sample_draws().len(), SAMPLE_DRAWS.len());
    }

    #[tokio::test]
    async fn seeds_only_an_empty_store() {
        let store = memory_store().await;
        assert_eq!(seed_if_empty(&store).await.unwrap(), 5);
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
        assert_eq!(store.count_draws().await.unwrap(), 5);
        let latest = store.get_latest_draw().await.unwrap().unwrap();
        assert_eq!(latest.period.as_str(), "114054");
    }
}
