//! Error types for the risk assessment pipeline.
//!
//! Policy violations and biometric outcomes are ordinary result states
//! carried on the assessment itself, not errors. Only input validation
//! failures and unexpected internal failures surface through these types.

use thiserror::Error;

/// Top-level failure of an orchestrated assessment.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The transaction was rejected before any engine ran.
    #[error("invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    /// A persistence collaborator failed in a way that cannot be treated
    /// as "record absent".
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// An internal invariant was violated. No partial decision applies.
    #[error("internal assessment failure: {0}")]
    Internal(String),
}

/// Transaction input validation failures, surfaced to the caller before
/// the policy and risk engines are touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("amount must be a finite number")]
    NonFiniteAmount,

    #[error("sender id must not be empty")]
    MissingSender,
}

/// Unexpected persistence failures from profile, policy, or history stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Step-up biometric verification failures.
///
/// `NotEnrolled` is distinct so callers can render a different message
/// than for an ordinary mismatch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BiometricError {
    #[error("no biometric enrollment on file for this user")]
    NotEnrolled,

    #[error("biometric capability unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort remote assessment failures. Always logged and swallowed,
/// never propagated to the caller.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("remote assessment unavailable: {0}")]
    Unavailable(String),

    #[error("malformed remote assessment response: {0}")]
    Malformed(#[from] serde_json::Error),
}
