//! Hard policy enforcement: user-defined limits checked before any scoring.
//!
//! Evaluation is a short, linear pass: not-evaluated, evaluating each check
//! in fixed order, then allowed or blocked. Checks are independent and every
//! violation is collected - the result reports all of them, not just the
//! first. A block is terminal: the transaction is never scored, never sent
//! to step-up verification, never recorded, and never folded into the
//! behavioral baseline.

use crate::types::policy::{Policy, PolicyResult, PolicyViolation};
use crate::types::profile::fuzzy_location_match;
use crate::types::transaction::Transaction;
use tracing::warn;

/// Evaluate a transaction against the user's policy set.
///
/// An absent policy means "no policies configured" and allows vacuously.
/// Check order is fixed: amount ceiling, location allow-list, time window.
pub fn enforce_policy(tx: &Transaction, policy: Option<&Policy>) -> PolicyResult {
    let Some(policy) = policy else {
        return PolicyResult::allowed();
    };

    let mut violations = Vec::new();

    if let Some(max_amount) = policy.max_amount {
        if tx.amount > max_amount {
            violations.push(PolicyViolation {
                policy_name: "max_amount".to_string(),
                reason: format!(
                    "amount ₹{:.2} exceeds the configured ceiling of ₹{:.2}",
                    tx.amount, max_amount
                ),
                observed: format!("{:.2}", tx.amount),
                limit: format!("{max_amount:.2}"),
            });
        }
    }

    // The allow-list only bites when the user both listed locations and
    // asked for unknown ones to be blocked.
    if policy.block_unknown_locations && !policy.allowed_locations.is_empty() {
        let matched = policy
            .allowed_locations
            .iter()
            .any(|allowed| fuzzy_location_match(&tx.location, allowed));
        if !matched {
            violations.push(PolicyViolation {
                policy_name: "allowed_locations".to_string(),
                reason: format!(
                    "location '{}' is not in the allowed location list",
                    tx.location
                ),
                observed: tx.location.clone(),
                limit: policy.allowed_locations.join(", "),
            });
        }
    }

    if let Some(range) = &policy.allowed_time_range {
        let current = tx.minutes_since_midnight();
        match range.contains(current) {
            Some(true) => {}
            Some(false) => violations.push(PolicyViolation {
                policy_name: "allowed_time_range".to_string(),
                reason: format!(
                    "transaction time {} is outside the allowed window {}-{}",
                    tx.time_string(),
                    range.start,
                    range.end
                ),
                observed: format!("{:02}:{:02}", current / 60, current % 60),
                limit: format!("{}-{}", range.start, range.end),
            }),
            None => {
                warn!(
                    start = %range.start,
                    end = %range.end,
                    "unparseable time window, skipping check"
                );
            }
        }
    }

    if violations.is_empty() {
        PolicyResult::allowed()
    } else {
        PolicyResult::blocked(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::policy::TimeRange;
    use chrono::{TimeZone, Utc};

    fn tx_at(amount: f64, location: &str, hour: u32, minute: u32) -> Transaction {
        let mut tx = Transaction::new("tx_1", "alice", "bob", amount, location);
        tx.timestamp = Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap();
        tx
    }

    #[test]
    fn test_absent_policy_allows_vacuously() {
        let tx = tx_at(1_000_000.0, "anywhere", 3, 0);
        let result = enforce_policy(&tx, None);
        assert!(result.allowed);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_amount_ceiling() {
        let policy = Policy {
            max_amount: Some(10_000.0),
            ..Policy::default()
        };

        let result = enforce_policy(&tx_at(10_000.0, "home_atm", 12, 0), Some(&policy));
        assert!(result.allowed);

        let result = enforce_policy(&tx_at(10_001.0, "home_atm", 12, 0), Some(&policy));
        assert!(!result.allowed);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].policy_name, "max_amount");
        assert_eq!(result.violations[0].limit, "10000.00");
    }

    #[test]
    fn test_location_allowlist_requires_both_flags() {
        let mut policy = Policy {
            allowed_locations: vec!["home_atm".to_string(), "office".to_string()],
            block_unknown_locations: false,
            ..Policy::default()
        };

        // Not enforced without block_unknown_locations
        let result = enforce_policy(&tx_at(100.0, "beach_kiosk", 12, 0), Some(&policy));
        assert!(result.allowed);

        policy.block_unknown_locations = true;
        let result = enforce_policy(&tx_at(100.0, "beach_kiosk", 12, 0), Some(&policy));
        assert!(!result.allowed);
        assert_eq!(result.violations[0].policy_name, "allowed_locations");

        // Fuzzy match passes in either direction, case-insensitive
        let result = enforce_policy(&tx_at(100.0, "Office Branch 2", 12, 0), Some(&policy));
        assert!(result.allowed);

        // An empty list with the flag set is also not enforced
        policy.allowed_locations.clear();
        let result = enforce_policy(&tx_at(100.0, "beach_kiosk", 12, 0), Some(&policy));
        assert!(result.allowed);
    }

    #[test]
    fn test_overnight_time_window() {
        let policy = Policy {
            allowed_time_range: Some(TimeRange {
                start: "22:00".to_string(),
                end: "06:00".to_string(),
            }),
            ..Policy::default()
        };

        let result = enforce_policy(&tx_at(100.0, "home_atm", 23, 30), Some(&policy));
        assert!(result.allowed);

        let result = enforce_policy(&tx_at(100.0, "home_atm", 12, 0), Some(&policy));
        assert!(!result.allowed);
        assert_eq!(result.violations[0].policy_name, "allowed_time_range");
        assert_eq!(result.violations[0].observed, "12:00");
    }

    #[test]
    fn test_malformed_time_window_is_skipped() {
        let policy = Policy {
            allowed_time_range: Some(TimeRange {
                start: "22:00".to_string(),
                end: "soon".to_string(),
            }),
            ..Policy::default()
        };

        let result = enforce_policy(&tx_at(100.0, "home_atm", 12, 0), Some(&policy));
        assert!(result.allowed);
    }

    #[test]
    fn test_all_violations_are_collected_in_check_order() {
        let policy = Policy {
            max_amount: Some(5000.0),
            allowed_locations: vec!["home_atm".to_string()],
            block_unknown_locations: true,
            allowed_time_range: Some(TimeRange {
                start: "09:00".to_string(),
                end: "18:00".to_string(),
            }),
        };

        let result = enforce_policy(&tx_at(50_000.0, "beach_kiosk", 2, 15), Some(&policy));
        assert!(!result.allowed);
        assert_eq!(result.violations.len(), 3);
        assert_eq!(result.violations[0].policy_name, "max_amount");
        assert_eq!(result.violations[1].policy_name, "allowed_locations");
        assert_eq!(result.violations[2].policy_name, "allowed_time_range");
    }
}
