//! Shared health state for the /health endpoint.
//! Updated by the analyzer, the update handler and the draw refresher.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Shared health metrics. Updated by service components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// True while a fetch + upsert pass is running.
    update_in_progress: AtomicBool,
    /// Unix ms of the last completed analysis (0 = none).
    last_analysis_at_ms: AtomicI64,
    /// Unix ms of the last completed fetch (0 = none).
    last_fetch_at_ms: AtomicI64,
    /// Draws written by the last fetch.
    last_fetch_written: AtomicU64,
}

/// Clears the in-progress flag when dropped.
pub struct UpdateGuard<'a> {
    state: &'a HealthState,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.state.update_in_progress.store(false, Ordering::Release);
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the update slot. `None` if another update holds it.
    pub fn try_begin_update(&self) -> Option<UpdateGuard<'_>> {
        self.update_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| UpdateGuard { state: self })
    }

    pub fn update_in_progress(&self) -> bool {
        self.update_in_progress.load(Ordering::Acquire)
    }

    pub fn set_last_analysis_at_ms(&self, ms: i64) {
        self.last_analysis_at_ms.store(ms, Ordering::Relaxed);
    }

    pub fn last_analysis_at_ms(&self) -> i64 {
        self.last_analysis_at_ms.load(Ordering::Relaxed)
    }

    pub fn record_fetch(&self, at_ms: i64, written: usize) {
        self.last_fetch_at_ms.store(at_ms, Ordering::Relaxed);
        self.last_fetch_written.store(written as u64, Ordering::Relaxed);
    }

    pub fn last_fetch_at_ms(&self) -> i64 {
        self.last_fetch_at_ms.load(Ordering::Relaxed)
    }

    pub fn last_fetch_written(&self) -> u64 {
        self.last_fetch_written.load(Ordering::Relaxed)
    }

    pub fn last_analysis_at(&self) -> Option<DateTime<Utc>> {
        non_zero_ms(self.last_analysis_at_ms())
    }

    pub fn last_fetch_at(&self) -> Option<DateTime<Utc>> {
        non_zero_ms(self.last_fetch_at_ms())
    }
}

fn non_zero_ms(ms: i64) -> Option<DateTime<Utc>> {
    if ms == 0 {
        None
    } else {
        DateTime::<Utc>::from_timestamp_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_update_at_a_time() {
        let h = HealthState::new();
        let guard = h.try_begin_update();
        assert!(guard.is_some());
        assert!(h.update_in_progress());
        assert!(h.try_begin_update().is_none());
        drop(guard);
        assert!(!h.update_in_progress());
        assert!(h.try_begin_update().is_some());
    }

    #[test]
    fn timestamps_start_unset() {
        let h = HealthState::new();
        assert!(h.last_analysis_at().is_none());
        assert!(h.last_fetch_at().is_none());
        h.record_fetch(1_700_000_000_000, 4);
        assert_eq!(h.last_fetch_at().unwrap().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(h.last_fetch_written(), 4);
    }
}
