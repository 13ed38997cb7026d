//! Transaction data structures for risk assessment

use crate::error::ValidationError;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A payment transaction submitted for risk assessment.
///
/// Immutable once submitted: the pipeline never mutates a transaction, and
/// a re-assessment always starts from the same input. The hour used by the
/// scoring and policy engines is derived from `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub transaction_id: String,

    /// Account initiating the payment (the profile owner)
    pub sender_id: String,

    /// Receiving account
    pub receiver_id: String,

    /// Transaction amount, must be positive and finite
    pub amount: f64,

    /// Free-text location identifier, e.g. "home_atm" or "City Mall Branch"
    pub location: String,

    /// Transaction type, e.g. "transfer", "withdrawal"
    #[serde(rename = "type")]
    pub tx_type: String,

    /// Channel the transaction arrived on, e.g. "upi", "card", "netbanking"
    pub channel: String,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with the current timestamp.
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        location: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            location: location.into(),
            tx_type: "transfer".to_string(),
            channel: "upi".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Hour of day (0-23) derived from the timestamp.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Minutes since midnight, used by the policy time-window check.
    pub fn minutes_since_midnight(&self) -> u32 {
        self.timestamp.hour() * 60 + self.timestamp.minute()
    }

    /// Date portion as "YYYY-MM-DD", used when recording history.
    pub fn date_string(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// Time portion as "HH:MM:SS", used when recording history.
    pub fn time_string(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Reject malformed input before any engine runs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() {
            return Err(ValidationError::NonFiniteAmount);
        }
        if self.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.sender_id.trim().is_empty() {
            return Err(ValidationError::MissingSender);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transaction_serialization() {
        let tx = Transaction::new("tx_123", "alice", "bob", 4500.0, "home_atm");

        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"type\":\"transfer\""));

        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.transaction_id, deserialized.transaction_id);
        assert_eq!(tx.amount, deserialized.amount);
        assert_eq!(tx.location, deserialized.location);
    }

    #[test]
    fn test_hour_and_minutes_derived_from_timestamp() {
        let mut tx = Transaction::new("tx_1", "alice", "bob", 100.0, "home_atm");
        tx.timestamp = Utc.with_ymd_and_hms(2025, 3, 14, 23, 30, 0).unwrap();

        assert_eq!(tx.hour(), 23);
        assert_eq!(tx.minutes_since_midnight(), 23 * 60 + 30);
        assert_eq!(tx.date_string(), "2025-03-14");
        assert_eq!(tx.time_string(), "23:30:00");
    }

    #[test]
    fn test_validation_rejects_bad_amounts() {
        let mut tx = Transaction::new("tx_1", "alice", "bob", 0.0, "home_atm");
        assert_eq!(tx.validate(), Err(ValidationError::NonPositiveAmount(0.0)));

        tx.amount = -50.0;
        assert_eq!(tx.validate(), Err(ValidationError::NonPositiveAmount(-50.0)));

        tx.amount = f64::NAN;
        assert_eq!(tx.validate(), Err(ValidationError::NonFiniteAmount));

        tx.amount = 100.0;
        tx.sender_id = "  ".to_string();
        assert_eq!(tx.validate(), Err(ValidationError::MissingSender));
    }
}
