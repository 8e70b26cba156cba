//! Request metrics for carxd v2.5.0
//!
//! Chat response times and error counts keyed by error code, reported by
//! /api/v2/health. Only the most recent samples feed the average.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Response-time samples kept for the rolling average
const MAX_SAMPLES: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    /// Average over the last samples, in milliseconds
    pub avg_response_ms: f64,
    pub max_response_ms: f64,
    /// Error code ("DiagnosticError", "LlmError", ...) -> count
    pub errors: BTreeMap<String, u64>,
}

#[derive(Default)]
struct Counters {
    requests: u64,
    samples: VecDeque<f64>,
    max_ms: f64,
    errors: BTreeMap<String, u64>,
}

/// Never held across an await
#[derive(Default)]
pub struct RequestMetrics {
    counters: Mutex<Counters>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        // A panic mid-update leaves plain counters, still usable
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_request(&self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let mut counters = self.counters();
        counters.requests += 1;
        if counters.samples.len() == MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(ms);
        if ms > counters.max_ms {
            counters.max_ms = ms;
        }
    }

    pub fn record_error(&self, code: &str) {
        *self.counters().errors.entry(code.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters();
        let avg_response_ms = if counters.samples.is_empty() {
            0.0
        } else {
            counters.samples.iter().sum::<f64>() / counters.samples.len() as f64
        };
        MetricsSnapshot {
            requests: counters.requests,
            avg_response_ms,
            max_response_ms: counters.max_ms,
            errors: counters.errors.clone(),
        }
    }
}
