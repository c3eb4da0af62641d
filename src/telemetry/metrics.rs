//! Conversion timing statistics.

use std::time::Duration;

/// Summary of per-frame conversion times, in microseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingStats {
    pub avg_us: f64,
    pub min_us: f64,
    pub max_us: f64,
    /// 50th percentile (median)
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

impl TimingStats {
    /// Computes statistics over `durations`; empty input yields zeros.
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut times: Vec<f64> = durations
            .into_iter()
            .map(|d| d.as_secs_f64() * 1_000_000.0)
            .collect();
        if times.is_empty() {
            return Self::default();
        }
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();
        Self {
            avg_us: sum / times.len() as f64,
            min_us: times.first().copied().unwrap_or(0.0),
            max_us: times.last().copied().unwrap_or(0.0),
            p50_us: percentile(&times, 0.50),
            p95_us: percentile(&times, 0.95),
            p99_us: percentile(&times, 0.99),
            sample_count: times.len(),
        }
    }

    /// Frames per second the average time allows.
    pub fn throughput_fps(&self) -> f64 {
        if self.avg_us > 0.0 {
            1_000_000.0 / self.avg_us
        } else {
            0.0
        }
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}
