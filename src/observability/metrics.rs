//! Thread-safe metrics collection for refinement runs
//!
//! Atomic counters for high-frequency events and mutex-protected maps for
//! per-decision tallies. Independent loops share the process-wide collector
//! returned by [`metrics`].

use crate::error::CollaboratorStage;
use crate::policy::DecisionKind;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    runs_started: AtomicU64,
    runs_in_progress: AtomicU64,
    runs_failed: AtomicU64,
    iterations: AtomicU64,
    producer_failures: AtomicU64,
    scorer_failures: AtomicU64,
    out_of_scale_scores: AtomicU64,
    started_at: AtomicU64,

    // Terminal decision tallies and run durations (ms)
    terminations: Mutex<HashMap<DecisionKind, u64>>,
    run_times: Mutex<Vec<u64>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_in_progress: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            iterations: AtomicU64::new(0),
            producer_failures: AtomicU64::new(0),
            scorer_failures: AtomicU64::new(0),
            out_of_scale_scores: AtomicU64::new(0),
            started_at: AtomicU64::new(current_timestamp()),
            terminations: Mutex::new(HashMap::new()),
            run_times: Mutex::new(Vec::new()),
        }
    }

    pub fn run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
        self.runs_in_progress.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_finished(&self, decision: DecisionKind, duration: Duration) {
        self.runs_in_progress.fetch_sub(1, Ordering::Relaxed);
        if let Ok(mut terminations) = self.terminations.lock() {
            *terminations.entry(decision).or_insert(0) += 1;
        }
        self.record_run_time(duration);
    }

    pub fn run_failed(&self, duration: Duration) {
        self.runs_in_progress.fetch_sub(1, Ordering::Relaxed);
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn iteration_completed(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn collaborator_failed(&self, stage: CollaboratorStage) {
        match stage {
            CollaboratorStage::Producer => self.producer_failures.fetch_add(1, Ordering::Relaxed),
            CollaboratorStage::Scorer => self.scorer_failures.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn score_out_of_scale(&self) {
        self.out_of_scale_scores.fetch_add(1, Ordering::Relaxed);
    }

    fn record_run_time(&self, duration: Duration) {
        if let Ok(mut times) = self.run_times.lock() {
            times.push(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));

            // Keep the last 1000 measurements
            if times.len() > 1000 {
                times.remove(0);
            }
        }
    }

    /// Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.runs_started.store(0, Ordering::Relaxed);
        self.runs_in_progress.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
        self.iterations.store(0, Ordering::Relaxed);
        self.producer_failures.store(0, Ordering::Relaxed);
        self.scorer_failures.store(0, Ordering::Relaxed);
        self.out_of_scale_scores.store(0, Ordering::Relaxed);
        self.started_at.store(current_timestamp(), Ordering::Relaxed);
        if let Ok(mut terminations) = self.terminations.lock() {
            terminations.clear();
        }
        if let Ok(mut times) = self.run_times.lock() {
            times.clear();
        }
    }

    fn run_time_statistics(&self) -> (f64, f64, f64) {
        let Ok(times) = self.run_times.lock() else {
            return (0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let avg = sorted.iter().map(|&t| t as f64).sum::<f64>() / sorted.len() as f64;
        (avg, percentile(&sorted, 50.0), percentile(&sorted, 95.0))
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_run_time_ms, run_time_p50_ms, run_time_p95_ms) = self.run_time_statistics();
        let terminations = self
            .terminations
            .lock()
            .map(|t| {
                t.iter()
                    .map(|(kind, count)| (kind.as_str().to_string(), *count))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot {
            runs: RunMetrics {
                runs_started: self.runs_started.load(Ordering::Relaxed),
                runs_in_progress: self.runs_in_progress.load(Ordering::Relaxed),
                runs_failed: self.runs_failed.load(Ordering::Relaxed),
                terminations,
                avg_run_time_ms,
                run_time_p50_ms,
                run_time_p95_ms,
            },
            iterations: IterationMetrics {
                iterations: self.iterations.load(Ordering::Relaxed),
                producer_failures: self.producer_failures.load(Ordering::Relaxed),
                scorer_failures: self.scorer_failures.load(Ordering::Relaxed),
                out_of_scale_scores: self.out_of_scale_scores.load(Ordering::Relaxed),
            },
            uptime_seconds: now.saturating_sub(self.started_at.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub runs: RunMetrics,
    pub iterations: IterationMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct RunMetrics {
    pub runs_started: u64,
    pub runs_in_progress: u64,
    pub runs_failed: u64,
    /// Completed runs keyed by terminal decision
    pub terminations: HashMap<String, u64>,
    pub avg_run_time_ms: f64,
    pub run_time_p50_ms: f64,
    pub run_time_p95_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct IterationMetrics {
    pub iterations: u64,
    pub producer_failures: u64,
    pub scorer_failures: u64,
    pub out_of_scale_scores: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn percentile(sorted: &[u64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)] as f64
}
