//! In-memory histogram of analysis computation time.
//! The analyzer records one sample per run, the API reads percentiles.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Values stored in microseconds, 1us to 100s, 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<Option<hdrhistogram::Histogram<u64>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySnapshot {
    pub samples: u64,
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
    pub max_us: Option<u64>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3).ok()),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        if let Ok(mut guard) = self.inner.lock() {
            if let Some(h) = guard.as_mut() {
                let _ = h.record(us);
            }
        }
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let empty = LatencySnapshot {
            samples: 0,
            p50_us: None,
            p95_us: None,
            p99_us: None,
            max_us: None,
        };
        let Ok(guard) = self.inner.lock() else {
            return empty;
        };
        match guard.as_ref() {
            Some(h) if h.len() > 0 => LatencySnapshot {
                samples: h.len(),
                p50_us: Some(h.value_at_quantile(0.5)),
                p95_us: Some(h.value_at_quantile(0.95)),
                p99_us: Some(h.value_at_quantile(0.99)),
                max_us: Some(h.max()),
            },
            _ => empty,
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
