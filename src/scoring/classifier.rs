//! Z-score risk classification: tier mapping, new-user defaults, and the
//! untrusted-location escalation.
//!
//! The tier returned here is final. Explanation factors are generated
//! afterwards from the finished classification and can never change it.

use crate::scoring::stats;
use crate::types::assessment::RiskLevel;
use crate::types::profile::{LocationTrust, UserProfile};

/// Baseline mean assumed for users with no learned amount statistics.
pub const NEW_USER_MEAN: f64 = 5000.0;

/// Baseline standard deviation assumed for users with no learned amount
/// statistics.
pub const NEW_USER_STD_DEV: f64 = 2000.0;

/// Absolute amount above which a new-user transaction is held for review
/// regardless of its Z-score.
pub const NEW_USER_REVIEW_AMOUNT: f64 = 50_000.0;

/// Minimum |Z| at which an untrusted location escalates a LOW tier.
pub const UNTRUSTED_LOCATION_MIN_Z: f64 = 1.5;

/// Finalized classification of one transaction amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub z_score: f64,
    pub abs_z_score: f64,
    pub risk_level: RiskLevel,
    /// Baseline mean the score was computed against
    pub mean: f64,
    /// Baseline std-dev the score was computed against, substituted with
    /// the 20%-of-mean estimate when history has no variance
    pub std_dev: f64,
    /// Whether new-user default assumptions were applied
    pub new_user: bool,
    pub location: LocationTrust,
}

/// Tier mapping by absolute Z-score. Boundaries are exact: |z| < 2 is LOW,
/// 2 <= |z| <= 3 is MEDIUM, |z| > 3 is HIGH.
pub fn risk_level_for(abs_z: f64) -> RiskLevel {
    if abs_z < 2.0 {
        RiskLevel::Low
    } else if abs_z <= 3.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Classify an amount against a user's behavioral baseline.
///
/// Applied in order: statistical tier from the Z-score, then the new-user
/// absolute review override, then the untrusted-location escalation. The
/// escalation is a one-way ratchet from LOW to MEDIUM and never lowers a
/// tier.
pub fn classify(amount: f64, location: &str, profile: Option<&UserProfile>) -> Classification {
    let (mean, std_dev, new_user) = match profile {
        Some(p) if p.has_amount_stats() => (p.amount_mean, p.amount_std, false),
        _ => (NEW_USER_MEAN, NEW_USER_STD_DEV, true),
    };

    let z_score = stats::z_score(amount, mean, std_dev);
    let abs_z_score = z_score.abs();
    let mut risk_level = risk_level_for(abs_z_score);

    // Without history the Z-score is an assumption, not evidence; very
    // large first transactions go to review rather than an outright block.
    if new_user && amount > NEW_USER_REVIEW_AMOUNT {
        risk_level = RiskLevel::Medium;
    }

    let location = profile
        .map(|p| p.location_trust(location))
        .unwrap_or(LocationTrust::NotConfigured);

    if location == LocationTrust::Untrusted
        && abs_z_score >= UNTRUSTED_LOCATION_MIN_Z
        && risk_level == RiskLevel::Low
    {
        risk_level = RiskLevel::Medium;
    }

    Classification {
        z_score,
        abs_z_score,
        risk_level,
        mean,
        std_dev: stats::effective_std_dev(mean, std_dev),
        new_user,
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_stats(mean: f64, std_dev: f64) -> UserProfile {
        let mut profile = UserProfile::new("alice");
        profile.amount_mean = mean;
        profile.amount_std = std_dev;
        profile.amount_count = 20;
        profile
    }

    #[test]
    fn test_tier_boundaries_are_exact() {
        assert_eq!(risk_level_for(0.0), RiskLevel::Low);
        assert_eq!(risk_level_for(1.999), RiskLevel::Low);
        assert_eq!(risk_level_for(2.0), RiskLevel::Medium);
        assert_eq!(risk_level_for(3.0), RiskLevel::Medium);
        assert_eq!(risk_level_for(3.001), RiskLevel::High);
    }

    #[test]
    fn test_scenario_high_risk() {
        let profile = profile_with_stats(5000.0, 2000.0);
        let c = classify(25_000.0, "home_atm", Some(&profile));
        assert!((c.z_score - 10.0).abs() < 1e-9);
        assert_eq!(c.risk_level, RiskLevel::High);
        assert!(!c.new_user);
    }

    #[test]
    fn test_scenario_low_risk() {
        let profile = profile_with_stats(5000.0, 2000.0);
        let c = classify(5200.0, "home_atm", Some(&profile));
        assert!((c.z_score - 0.1).abs() < 1e-9);
        assert_eq!(c.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_new_user_defaults_apply() {
        let c = classify(5200.0, "anywhere", None);
        assert!(c.new_user);
        assert_eq!(c.mean, NEW_USER_MEAN);
        assert_eq!(c.std_dev, NEW_USER_STD_DEV);
        assert_eq!(c.risk_level, RiskLevel::Low);
        assert_eq!(c.location, LocationTrust::NotConfigured);
    }

    #[test]
    fn test_new_user_absolute_override_forces_review() {
        // z-score alone would say HIGH; the override holds it at review
        let c = classify(60_000.0, "anywhere", None);
        assert!(c.new_user);
        assert!(c.abs_z_score > 3.0);
        assert_eq!(c.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_profile_without_stats_counts_as_new_user() {
        let mut profile = UserProfile::new("alice");
        profile.trusted_locations = vec!["home_atm".to_string()];
        let c = classify(60_000.0, "home_atm", Some(&profile));
        assert!(c.new_user);
        assert_eq!(c.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_untrusted_location_escalates_borderline_low() {
        let mut profile = profile_with_stats(5000.0, 2000.0);
        profile.trusted_locations = vec!["home_atm".to_string()];

        // |z| = 1.6, LOW by score, escalated by the unfamiliar location
        let c = classify(8200.0, "beach_kiosk", Some(&profile));
        assert_eq!(c.location, LocationTrust::Untrusted);
        assert_eq!(c.risk_level, RiskLevel::Medium);

        // Same amount from a trusted location stays LOW
        let c = classify(8200.0, "home_atm", Some(&profile));
        assert_eq!(c.location, LocationTrust::Trusted);
        assert_eq!(c.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_escalation_needs_borderline_score() {
        let mut profile = profile_with_stats(5000.0, 2000.0);
        profile.trusted_locations = vec!["home_atm".to_string()];

        // |z| = 0.5: unfamiliar location alone is not enough
        let c = classify(6000.0, "beach_kiosk", Some(&profile));
        assert_eq!(c.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_escalation_never_deescalates() {
        let mut profile = profile_with_stats(5000.0, 2000.0);
        profile.trusted_locations = vec!["home_atm".to_string()];

        // Already MEDIUM from the score; the location rule leaves it alone
        let c = classify(10_000.0, "beach_kiosk", Some(&profile));
        assert!((c.z_score - 2.5).abs() < 1e-9);
        assert_eq!(c.risk_level, RiskLevel::Medium);

        // HIGH stays HIGH
        let c = classify(25_000.0, "beach_kiosk", Some(&profile));
        assert_eq!(c.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_below_average_amounts_use_signed_score() {
        let profile = profile_with_stats(5000.0, 2000.0);
        let c = classify(200.0, "home_atm", Some(&profile));
        assert!(c.z_score < 0.0);
        assert_eq!(c.risk_level, RiskLevel::Medium); // |z| = 2.4
    }
}
