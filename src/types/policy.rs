//! User-defined transaction control policies.
//!
//! Policies are hard limits evaluated before any risk scoring. They are
//! loaded fresh for every assessment so a just-saved policy always applies.

use serde::{Deserialize, Serialize};

/// Daily time window in which transactions are allowed, as "HH:MM" bounds.
///
/// Overnight windows where `start > end` (e.g. 22:00-06:00) wrap across
/// midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    /// Parse an "HH:MM" string into minutes since midnight.
    pub fn parse_minutes(value: &str) -> Option<u32> {
        let (h, m) = value.trim().split_once(':')?;
        let hours: u32 = h.parse().ok()?;
        let minutes: u32 = m.parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }
        Some(hours * 60 + minutes)
    }

    /// Whether the given minutes-since-midnight falls inside the window.
    /// Returns `None` when either bound fails to parse.
    pub fn contains(&self, current: u32) -> Option<bool> {
        let start = Self::parse_minutes(&self.start)?;
        let end = Self::parse_minutes(&self.end)?;
        if start > end {
            // Overnight window wrapping midnight
            Some(current >= start || current <= end)
        } else {
            Some(current >= start && current <= end)
        }
    }
}

/// Per-user hard constraints. All fields are optional; an absent policy or
/// an empty one allows everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Block transactions above this amount
    #[serde(default)]
    pub max_amount: Option<f64>,

    /// Location allow-list, fuzzy-matched against the transaction location
    #[serde(default)]
    pub allowed_locations: Vec<String>,

    /// Whether a location outside the allow-list blocks the transaction.
    /// The allow-list is only enforced when this is set and the list is
    /// non-empty.
    #[serde(default)]
    pub block_unknown_locations: bool,

    /// Daily window in which transactions are allowed
    #[serde(default)]
    pub allowed_time_range: Option<TimeRange>,
}

/// One violated policy constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    /// Machine name of the violated policy, e.g. "max_amount"
    pub policy_name: String,

    /// Human-readable reason for the block
    pub reason: String,

    /// What the transaction actually presented
    pub observed: String,

    /// The configured limit it crossed
    pub limit: String,
}

/// Outcome of the policy gate. Any violation is terminal: the transaction
/// is never scored for statistical risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResult {
    pub allowed: bool,
    pub violations: Vec<PolicyViolation>,
}

impl PolicyResult {
    /// A clean pass with no violations.
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            violations: Vec::new(),
        }
    }

    /// A terminal block carrying every collected violation.
    pub fn blocked(violations: Vec<PolicyViolation>) -> Self {
        Self {
            allowed: false,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(TimeRange::parse_minutes("00:00"), Some(0));
        assert_eq!(TimeRange::parse_minutes("09:30"), Some(570));
        assert_eq!(TimeRange::parse_minutes("23:59"), Some(1439));
        assert_eq!(TimeRange::parse_minutes("24:00"), None);
        assert_eq!(TimeRange::parse_minutes("12:60"), None);
        assert_eq!(TimeRange::parse_minutes("noon"), None);
    }

    #[test]
    fn test_normal_window() {
        let range = TimeRange {
            start: "09:00".to_string(),
            end: "18:00".to_string(),
        };
        assert_eq!(range.contains(9 * 60), Some(true));
        assert_eq!(range.contains(12 * 60), Some(true));
        assert_eq!(range.contains(18 * 60), Some(true));
        assert_eq!(range.contains(8 * 60 + 59), Some(false));
        assert_eq!(range.contains(20 * 60), Some(false));
    }

    #[test]
    fn test_overnight_window_wraps_midnight() {
        let range = TimeRange {
            start: "22:00".to_string(),
            end: "06:00".to_string(),
        };
        assert_eq!(range.contains(23 * 60 + 30), Some(true));
        assert_eq!(range.contains(2 * 60), Some(true));
        assert_eq!(range.contains(6 * 60), Some(true));
        assert_eq!(range.contains(12 * 60), Some(false));
        assert_eq!(range.contains(21 * 60 + 59), Some(false));
    }

    #[test]
    fn test_malformed_bounds_are_unenforceable() {
        let range = TimeRange {
            start: "09:00".to_string(),
            end: "later".to_string(),
        };
        assert_eq!(range.contains(600), None);
    }

    #[test]
    fn test_policy_deserializes_with_missing_fields() {
        let policy: Policy = serde_json::from_str("{\"max_amount\": 10000}").unwrap();
        assert_eq!(policy.max_amount, Some(10000.0));
        assert!(policy.allowed_locations.is_empty());
        assert!(!policy.block_unknown_locations);
        assert!(policy.allowed_time_range.is_none());
    }
}
