//! Amount statistics: population mean/std-dev and outlier-resistant
//! re-baselining.

/// Mean and standard deviation over a set of transaction amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl AmountStats {
    /// Population statistics (divide by N) over the given amounts.
    pub fn population(amounts: &[f64]) -> Self {
        if amounts.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// |Z| bound below which an amount counts as part of the normal baseline.
const BASELINE_Z_BOUND: f64 = 2.0;

/// Minimum surviving amounts for the filtered baseline to replace the
/// unfiltered statistics.
const MIN_BASELINE_POINTS: usize = 3;

/// Standard deviation used for scoring when history has no variance:
/// estimated as 20% of the mean.
pub fn effective_std_dev(mean: f64, std_dev: f64) -> f64 {
    if std_dev > 0.0 {
        std_dev
    } else {
        0.2 * mean
    }
}

/// Signed Z-score of `amount` against a baseline. Defined as 0 when the
/// baseline carries no usable variance (mean and std-dev both zero).
pub fn z_score(amount: f64, mean: f64, std_dev: f64) -> f64 {
    let sd = effective_std_dev(mean, std_dev);
    if sd == 0.0 {
        return 0.0;
    }
    (amount - mean) / sd
}

/// Re-baselined statistics over historical amounts.
///
/// Amounts at or beyond |Z| = 2 against the initial statistics are dropped
/// before the final mean/std-dev is computed, so past anomalies do not
/// inflate the "normal" baseline and suppress future detections. When fewer
/// than 3 amounts survive the filter, the unfiltered statistics stand.
pub fn rebaseline(amounts: &[f64]) -> AmountStats {
    let initial = AmountStats::population(amounts);

    let baseline: Vec<f64> = amounts
        .iter()
        .copied()
        .filter(|a| z_score(*a, initial.mean, initial.std_dev).abs() < BASELINE_Z_BOUND)
        .collect();

    if baseline.len() >= MIN_BASELINE_POINTS {
        AmountStats::population(&baseline)
    } else {
        initial
    }
}
