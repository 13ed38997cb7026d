//! Human-readable explanation factors for a finalized classification.
//!
//! Factors are pure presentation: they are generated after the risk tier
//! is already final and can never change it. Order matters - amount first,
//! then location, then time - so the explanation reads as one narrative.
//! Step-up and remote-assessment factors are appended later by the
//! orchestrator using the helpers at the bottom of this module.

use crate::scoring::classifier::Classification;
use crate::signals::RemoteAssessment;
use crate::types::assessment::{Factor, FactorKind, RiskLevel};
use crate::types::profile::{LocationTrust, UserProfile};

/// Late-night band treated as unusual: 23:00 through 05:59.
pub fn is_late_night(hour: u32) -> bool {
    hour >= 23 || hour <= 5
}

/// Whether the hour counts as unusual for this user: late-night always
/// does; otherwise an hour outside the learned preferred hours does.
pub fn is_unusual_time(hour: u32, profile: Option<&UserProfile>) -> bool {
    if is_late_night(hour) {
        return true;
    }
    match profile {
        Some(p) if !p.preferred_hours.is_empty() => !p.preferred_hours.contains(&hour),
        _ => false,
    }
}

fn format_amount(amount: f64) -> String {
    format!("₹{amount:.0}")
}

/// Build the ordered explanation factors for a finished classification.
pub fn explain(
    amount: f64,
    location: &str,
    hour: u32,
    classification: &Classification,
    profile: Option<&UserProfile>,
) -> Vec<Factor> {
    vec![
        amount_factor(amount, classification),
        location_factor(location, classification.location, profile),
        time_factor(hour, profile),
    ]
}

fn amount_factor(amount: f64, classification: &Classification) -> Factor {
    let formatted = format_amount(amount);
    let factor = match classification.risk_level {
        RiskLevel::Low => Factor::new(
            FactorKind::Good,
            format!("Amount {formatted} is in line with this user's usual spending"),
        ),
        RiskLevel::Medium => Factor::new(
            FactorKind::Warn,
            format!("Amount {formatted} is noticeably above this user's usual spending"),
        ),
        RiskLevel::High => Factor::new(
            FactorKind::Bad,
            format!("Amount {formatted} is far outside this user's usual spending"),
        ),
    };

    let baseline = if classification.new_user {
        format!(
            "z-score {:.2} against assumed baseline {} ± {}",
            classification.z_score,
            format_amount(classification.mean),
            format_amount(classification.std_dev),
        )
    } else {
        format!(
            "z-score {:.2} against baseline {} ± {}",
            classification.z_score,
            format_amount(classification.mean),
            format_amount(classification.std_dev),
        )
    };
    factor.with_detail(baseline)
}

fn location_factor(
    location: &str,
    trust: LocationTrust,
    profile: Option<&UserProfile>,
) -> Factor {
    match trust {
        LocationTrust::NotConfigured => Factor::new(
            FactorKind::Info,
            "No trusted locations configured; location check skipped",
        ),
        LocationTrust::Trusted => Factor::new(
            FactorKind::Good,
            format!("Location '{location}' matches a trusted location"),
        ),
        LocationTrust::Untrusted => {
            let trusted = profile
                .map(|p| p.trusted_locations.join(", "))
                .unwrap_or_default();
            Factor::new(
                FactorKind::Warn,
                format!("Location '{location}' does not match any trusted location"),
            )
            .with_detail(format!("Trusted locations: {trusted}"))
        }
    }
}

fn time_factor(hour: u32, profile: Option<&UserProfile>) -> Factor {
    if is_late_night(hour) {
        return Factor::new(
            FactorKind::Warn,
            format!("Late-night transaction at {hour:02}:00"),
        );
    }
    if let Some(p) = profile {
        if !p.preferred_hours.is_empty() && !p.preferred_hours.contains(&hour) {
            let usual = p
                .preferred_hours
                .iter()
                .map(|h| format!("{h:02}:00"))
                .collect::<Vec<_>>()
                .join(", ");
            return Factor::new(
                FactorKind::Info,
                format!("{hour:02}:00 is outside this user's usual hours"),
            )
            .with_detail(format!("Usual hours: {usual}"));
        }
    }
    Factor::new(
        FactorKind::Good,
        "Transaction time is consistent with past activity",
    )
}

/// Factor appended after the step-up biometric check completes.
pub fn biometric_factor(verified: bool) -> Factor {
    if verified {
        Factor::new(FactorKind::Good, "Identity confirmed via biometric check")
    } else {
        Factor::new(FactorKind::Bad, "Biometric verification failed")
    }
}

/// Factor appended when the biometric capability could not run at all.
pub fn biometric_unavailable_factor(reason: &str) -> Factor {
    Factor::new(FactorKind::Bad, "Biometric verification unavailable").with_detail(reason)
}

/// Factor appended when the best-effort remote assessment succeeds.
pub fn remote_factor(assessment: &RemoteAssessment) -> Factor {
    let factor = Factor::new(
        FactorKind::Info,
        format!(
            "Backend assessment scored this transaction {:.3}",
            assessment.risk_score
        ),
    );
    if assessment.reasons.is_empty() {
        factor
    } else {
        factor.with_detail(assessment.reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::classifier;

    fn profile() -> UserProfile {
        let mut p = UserProfile::new("alice");
        p.amount_mean = 5000.0;
        p.amount_std = 2000.0;
        p.amount_count = 20;
        p.trusted_locations = vec!["home_atm".to_string()];
        p.preferred_hours = vec![9, 14, 20];
        p
    }

    #[test]
    fn test_factor_order_is_amount_location_time() {
        let p = profile();
        let c = classifier::classify(5200.0, "home_atm", Some(&p));
        let factors = explain(5200.0, "home_atm", 14, &c, Some(&p));

        assert_eq!(factors.len(), 3);
        assert!(factors[0].message.contains("Amount"));
        assert!(factors[1].message.contains("Location"));
        assert!(factors[2].message.contains("time"));
    }

    #[test]
    fn test_amount_factor_carries_z_score_detail() {
        let p = profile();
        let c = classifier::classify(5200.0, "home_atm", Some(&p));
        let factors = explain(5200.0, "home_atm", 14, &c, Some(&p));

        assert_eq!(factors[0].kind, FactorKind::Good);
        let detail = factors[0].detail.as_deref().unwrap();
        assert!(detail.contains("0.10"), "missing z-score in: {detail}");
        assert!(factors[0].message.contains("₹5200"));
    }

    #[test]
    fn test_amount_factor_tone_follows_tier() {
        let p = profile();

        let c = classifier::classify(10_000.0, "home_atm", Some(&p));
        let factors = explain(10_000.0, "home_atm", 14, &c, Some(&p));
        assert_eq!(factors[0].kind, FactorKind::Warn);

        let c = classifier::classify(25_000.0, "home_atm", Some(&p));
        let factors = explain(25_000.0, "home_atm", 14, &c, Some(&p));
        assert_eq!(factors[0].kind, FactorKind::Bad);
    }

    #[test]
    fn test_location_factor_variants() {
        let mut p = profile();

        let c = classifier::classify(5200.0, "beach_kiosk", Some(&p));
        let factors = explain(5200.0, "beach_kiosk", 14, &c, Some(&p));
        assert_eq!(factors[1].kind, FactorKind::Warn);
        assert!(factors[1].detail.as_deref().unwrap().contains("home_atm"));

        p.trusted_locations.clear();
        let c = classifier::classify(5200.0, "beach_kiosk", Some(&p));
        let factors = explain(5200.0, "beach_kiosk", 14, &c, Some(&p));
        assert_eq!(factors[1].kind, FactorKind::Info);
    }

    #[test]
    fn test_time_factor_bands() {
        let p = profile();

        // Late-night band is inclusive of hour 5
        assert!(is_late_night(23));
        assert!(is_late_night(0));
        assert!(is_late_night(5));
        assert!(!is_late_night(6));
        assert!(!is_late_night(22));

        let c = classifier::classify(5200.0, "home_atm", Some(&p));
        let factors = explain(5200.0, "home_atm", 2, &c, Some(&p));
        assert_eq!(factors[2].kind, FactorKind::Warn);

        // Daytime hour outside preferred hours
        let factors = explain(5200.0, "home_atm", 11, &c, Some(&p));
        assert_eq!(factors[2].kind, FactorKind::Info);

        // Preferred hour
        let factors = explain(5200.0, "home_atm", 14, &c, Some(&p));
        assert_eq!(factors[2].kind, FactorKind::Good);
    }

    #[test]
    fn test_unusual_time_helper() {
        let p = profile();
        assert!(is_unusual_time(3, Some(&p)));
        assert!(is_unusual_time(11, Some(&p)));
        assert!(!is_unusual_time(14, Some(&p)));
        // No preferred hours learned: only the late-night band applies
        assert!(!is_unusual_time(11, None));
        assert!(is_unusual_time(4, None));
    }
}
