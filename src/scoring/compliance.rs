//! Compliance score: a bounded 10-100 presentation scale derived from the
//! Z-score.
//!
//! The scale supports explanations and dashboards only. The risk tier is
//! decided elsewhere and never reads this value.

/// Stepped table for non-negative Z-scores, scanned from the highest
/// threshold down; the first threshold at or below the score wins.
const ELEVATED_STEPS: &[(f64, i64)] = &[
    (20.0, 10),
    (15.0, 15),
    (10.0, 20),
    (8.0, 25),
    (6.0, 35),
    (5.0, 42),
    (4.0, 50),
    (3.5, 55),
    (3.0, 60),
    (2.5, 68),
    (2.2, 72),
    (2.0, 77),
    (1.7, 82),
    (1.5, 86),
    (1.2, 90),
    (1.0, 93),
    (0.7, 96),
    (0.5, 98),
];

pub const MIN_SCORE: i64 = 10;
pub const MAX_SCORE: i64 = 100;

const UNTRUSTED_LOCATION_DEDUCTION: i64 = 5;
const UNUSUAL_TIME_DEDUCTION: i64 = 3;

/// Map a signed Z-score plus location/time context to a compliance score
/// in [10, 100].
///
/// Negative scores (spending below the personal average) are inherently
/// safer and collapse to a narrow high band. Deductions for an untrusted
/// location and an unusual hour apply after the table lookup.
pub fn compliance_score(z_score: f64, location_match: bool, unusual_time: bool) -> i64 {
    let base = if z_score < 0.0 {
        let below = -z_score;
        if below >= 2.0 {
            98
        } else if below >= 1.0 {
            96
        } else {
            95
        }
    } else {
        ELEVATED_STEPS
            .iter()
            .find(|(threshold, _)| z_score >= *threshold)
            .map(|(_, score)| *score)
            .unwrap_or(100)
    };

    let mut score = base;
    if !location_match {
        score -= UNTRUSTED_LOCATION_DEDUCTION;
    }
    if unusual_time {
        score -= UNUSUAL_TIME_DEDUCTION;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}
