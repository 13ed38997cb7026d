//! Performance metrics and statistics tracking for the assessment pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::assessment::AssessmentState;

/// Metrics collector for pipeline performance and decision mix.
pub struct PipelineMetrics {
    /// Total transactions assessed
    pub transactions_assessed: AtomicU64,
    /// Transactions stopped by the policy gate
    pub policy_blocks: AtomicU64,
    /// Terminal states by name
    outcomes: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// |Z|-score distribution buckets, 0.5 wide, last bucket open-ended
    z_score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            transactions_assessed: AtomicU64::new(0),
            policy_blocks: AtomicU64::new(0),
            outcomes: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            z_score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one completed assessment.
    pub fn record_assessment(
        &self,
        processing_time: Duration,
        state: AssessmentState,
        abs_z_score: Option<f64>,
    ) {
        self.transactions_assessed.fetch_add(1, Ordering::Relaxed);
        if state == AssessmentState::PolicyBlocked {
            self.policy_blocks.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut outcomes) = self.outcomes.write() {
            *outcomes.entry(format!("{state:?}")).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the recent window for memory efficiency
            if times.len() > 10_000 {
                times.drain(0..5000);
            }
        }

        if let Some(abs_z) = abs_z_score {
            let bucket = ((abs_z * 2.0) as usize).min(9);
            if let Ok(mut buckets) = self.z_score_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Get processing time statistics.
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second).
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_assessed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get outcome counts by terminal state.
    pub fn get_outcomes(&self) -> HashMap<String, u64> {
        self.outcomes.read().unwrap().clone()
    }

    /// Get the |Z|-score distribution.
    pub fn get_z_score_distribution(&self) -> [u64; 10] {
        *self.z_score_buckets.read().unwrap()
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        let assessed = self.transactions_assessed.load(Ordering::Relaxed);
        let blocked = self.policy_blocks.load(Ordering::Relaxed);
        let block_rate = if assessed > 0 {
            (blocked as f64 / assessed as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let outcomes = self.get_outcomes();
        let z_dist = self.get_z_score_distribution();

        info!("==================== RISK PIPELINE METRICS ====================");
        info!(
            "Transactions assessed: {:>8}  |  Throughput: {:>6.1} tx/s",
            assessed, throughput
        );
        info!(
            "Policy blocks:         {:>8}  |  Block rate: {:>6.1}%",
            blocked, block_rate
        );
        info!(
            "Processing time (us): mean={} p50={} p95={} p99={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("Outcomes:");
        for (state, count) in &outcomes {
            let pct = if assessed > 0 {
                (*count as f64 / assessed as f64) * 100.0
            } else {
                0.0
            };
            info!("  {:24}: {:>6} ({:>5.1}%)", state, count, pct);
        }
        info!("|Z|-score distribution:");
        let total: u64 = z_dist.iter().sum();
        for (i, &count) in z_dist.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "#".repeat(bar_len.min(40));
            let label = if i == 9 {
                ">= 4.5".to_string()
            } else {
                format!("{:.1}-{:.1}", i as f64 * 0.5, (i + 1) as f64 * 0.5)
            };
            info!("  {:>7}: {:>6} ({:>5.1}%) {}", label, count, pct, bar);
        }
        info!("===============================================================");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries.
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(
            Duration::from_micros(100),
            AssessmentState::Verified,
            Some(0.3),
        );
        metrics.record_assessment(
            Duration::from_micros(200),
            AssessmentState::PolicyBlocked,
            None,
        );

        assert_eq!(metrics.transactions_assessed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.policy_blocks.load(Ordering::Relaxed), 1);

        let outcomes = metrics.get_outcomes();
        assert_eq!(outcomes.get("Verified"), Some(&1));
        assert_eq!(outcomes.get("PolicyBlocked"), Some(&1));
    }

    #[test]
    fn test_z_score_buckets() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(Duration::from_micros(50), AssessmentState::Verified, Some(0.1));
        metrics.record_assessment(Duration::from_micros(50), AssessmentState::Verified, Some(2.1));
        metrics.record_assessment(
            Duration::from_micros(50),
            AssessmentState::VerifiedViaBiometric,
            Some(27.5),
        );

        let dist = metrics.get_z_score_distribution();
        assert_eq!(dist[0], 1); // 0.0-0.5
        assert_eq!(dist[4], 1); // 2.0-2.5
        assert_eq!(dist[9], 1); // open-ended tail
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_assessment(
                Duration::from_micros(us),
                AssessmentState::Verified,
                Some(0.5),
            );
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
