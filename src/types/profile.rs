//! User behavioral profiles: aggregated statistics, never raw history.
//!
//! A profile stores only statistical summaries of past behavior (mean,
//! standard deviation, preferred hours, trusted locations). Absence of a
//! profile means the user is new, and the classifier falls back to default
//! assumptions.

use crate::scoring::stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-insensitive substring match in either direction between two
/// location strings. Empty or whitespace-only strings never match.
pub fn fuzzy_location_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Outcome of checking a transaction location against a user's trusted
/// location list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationTrust {
    /// The user has no trusted locations configured; the check is skipped.
    NotConfigured,
    /// The location fuzzy-matched a trusted entry.
    Trusted,
    /// Trusted locations exist but none matched.
    Untrusted,
}

impl LocationTrust {
    /// Only an explicit mismatch counts against the user.
    pub fn is_match(self) -> bool {
        !matches!(self, LocationTrust::Untrusted)
    }
}

fn default_learning_enabled() -> bool {
    true
}

/// Behavioral summary for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,

    /// Historical mean transaction amount
    #[serde(default)]
    pub amount_mean: f64,

    /// Historical population standard deviation of amounts
    #[serde(default)]
    pub amount_std: f64,

    /// Number of amounts folded into the baseline statistics
    #[serde(default)]
    pub amount_count: u64,

    /// User-declared or history-derived trusted locations
    #[serde(default)]
    pub trusted_locations: Vec<String>,

    /// Hours of day (0-23) the user typically transacts in
    #[serde(default)]
    pub preferred_hours: Vec<u32>,

    /// Whether new transactions may update the baseline
    #[serde(default = "default_learning_enabled")]
    pub learning_enabled: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create an empty profile with no learned statistics.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            amount_mean: 0.0,
            amount_std: 0.0,
            amount_count: 0,
            trusted_locations: Vec::new(),
            preferred_hours: Vec::new(),
            learning_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bootstrap a profile from uploaded transaction history.
    ///
    /// The baseline is re-baselined so past outliers do not inflate the
    /// "normal" statistics. Trusted locations are the distinct history
    /// locations, preferred hours the distinct history hours.
    pub fn from_history(
        user_id: impl Into<String>,
        amounts: &[f64],
        hours: &[u32],
        locations: &[String],
    ) -> Self {
        let baseline = stats::rebaseline(amounts);

        let mut trusted: Vec<String> = Vec::new();
        for loc in locations {
            let loc = loc.trim();
            if loc.is_empty() {
                continue;
            }
            if !trusted.iter().any(|t| t.eq_ignore_ascii_case(loc)) {
                trusted.push(loc.to_string());
            }
        }

        let mut preferred: Vec<u32> = hours.iter().copied().filter(|h| *h < 24).collect();
        preferred.sort_unstable();
        preferred.dedup();

        let mut profile = Self::new(user_id);
        profile.amount_mean = baseline.mean;
        profile.amount_std = baseline.std_dev;
        profile.amount_count = amounts.len() as u64;
        profile.trusted_locations = trusted;
        profile.preferred_hours = preferred;
        profile
    }

    /// Whether the profile carries usable amount statistics. A profile
    /// without them is treated the same as no profile at all.
    pub fn has_amount_stats(&self) -> bool {
        self.amount_count > 0
    }

    /// Check a location against the trusted list.
    pub fn location_trust(&self, location: &str) -> LocationTrust {
        if self.trusted_locations.is_empty() {
            return LocationTrust::NotConfigured;
        }
        let matched = self
            .trusted_locations
            .iter()
            .any(|trusted| fuzzy_location_match(location, trusted));
        if matched {
            LocationTrust::Trusted
        } else {
            LocationTrust::Untrusted
        }
    }

    /// Whether an amount may update the baseline statistics.
    ///
    /// Amounts beyond 1.5 standard deviations are observed but excluded, so
    /// anomalous transactions cannot drag the baseline toward themselves.
    /// The first transactions always qualify while the baseline is forming.
    pub fn baseline_eligible(&self, amount: f64) -> bool {
        if self.amount_std <= 0.0 {
            return true;
        }
        let z = (amount - self.amount_mean).abs() / self.amount_std;
        z < 1.5
    }

    /// Fold a new amount into the baseline using Welford's online update,
    /// and note the transaction hour.
    pub fn record_amount(&mut self, amount: f64, hour: u32) {
        self.amount_count += 1;
        let n = self.amount_count as f64;

        if self.amount_count == 1 {
            self.amount_mean = amount;
            self.amount_std = 0.0;
        } else {
            let old_mean = self.amount_mean;
            self.amount_mean = old_mean + (amount - old_mean) / n;
            let old_var = self.amount_std * self.amount_std;
            let new_var = ((n - 2.0) / (n - 1.0)) * old_var + (amount - old_mean).powi(2) / n;
            self.amount_std = new_var.max(0.0).sqrt();
        }

        self.record_hour(hour);
    }

    /// Note a transaction hour without touching the amount baseline. Used
    /// for amounts that are not baseline-eligible.
    pub fn record_hour(&mut self, hour: u32) {
        if hour < 24 && !self.preferred_hours.contains(&hour) {
            self.preferred_hours.push(hour);
            self.preferred_hours.sort_unstable();
        }
        self.updated_at = Utc::now();
    }
}
