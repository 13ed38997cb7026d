//! Step-up signal collaborators: biometric verification, intent
//! confirmation, and best-effort remote assessment.
//!
//! Signals gate or enrich a decision but never compute risk themselves.
//! The NATS implementations speak request/reply so the service binary can
//! delegate each signal to whatever responder is registered on the subject.

use crate::error::{BiometricError, EnrichmentError};
use crate::types::transaction::Transaction;
use async_nats::Client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The minimal transaction view shared with signal collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub transaction_id: String,
    pub sender_id: String,
    pub amount: f64,
    pub location: String,
}

impl From<&Transaction> for TransactionSummary {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.clone(),
            sender_id: tx.sender_id.clone(),
            amount: tx.amount,
            location: tx.location.clone(),
        }
    }
}

/// Step-up identity check for elevated-risk transactions.
#[async_trait]
pub trait BiometricVerifier: Send + Sync {
    /// Whether the live biometric sample matched the enrolled one.
    async fn verify(&self, summary: &TransactionSummary) -> Result<bool, BiometricError>;
}

/// Asks the user to confirm they intend this transaction. A decline is an
/// ordinary answer, not an error.
#[async_trait]
pub trait IntentConfirmer: Send + Sync {
    async fn confirm(&self, summary: &TransactionSummary) -> bool;
}

/// Features shared with the remote assessment service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFeatures {
    pub amount: f64,
    pub hour: u32,
    pub abs_z_score: f64,
    pub location_match: bool,
    pub new_user: bool,
}

/// Successful remote assessment response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAssessment {
    pub risk_score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Best-effort secondary scoring, requested after the local decision is
/// already rendered. Never authoritative.
#[async_trait]
pub trait RemoteAssessor: Send + Sync {
    async fn assess(&self, features: &RemoteFeatures) -> Result<RemoteAssessment, EnrichmentError>;
}

#[derive(Debug, Deserialize)]
struct BiometricReply {
    enrolled: bool,
    #[serde(default)]
    verified: bool,
}

/// Biometric verification over NATS request/reply.
///
/// The responder answers `{"enrolled": bool, "verified": bool}`; a missing
/// responder is reported as the capability being unavailable.
pub struct NatsBiometricVerifier {
    client: Client,
    subject: String,
}

impl NatsBiometricVerifier {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl BiometricVerifier for NatsBiometricVerifier {
    async fn verify(&self, summary: &TransactionSummary) -> Result<bool, BiometricError> {
        let payload = serde_json::to_vec(summary)
            .map_err(|e| BiometricError::Unavailable(e.to_string()))?;

        let response = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .map_err(|e| BiometricError::Unavailable(e.to_string()))?;

        let reply: BiometricReply = serde_json::from_slice(&response.payload)
            .map_err(|e| BiometricError::Unavailable(e.to_string()))?;

        if !reply.enrolled {
            return Err(BiometricError::NotEnrolled);
        }
        Ok(reply.verified)
    }
}

#[derive(Debug, Deserialize)]
struct ConfirmationReply {
    confirmed: bool,
}

/// Intent confirmation over NATS request/reply. Any transport failure
/// counts as a decline.
pub struct NatsIntentConfirmer {
    client: Client,
    subject: String,
}

impl NatsIntentConfirmer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl IntentConfirmer for NatsIntentConfirmer {
    async fn confirm(&self, summary: &TransactionSummary) -> bool {
        let Ok(payload) = serde_json::to_vec(summary) else {
            return false;
        };

        match self.client.request(self.subject.clone(), payload.into()).await {
            Ok(response) => serde_json::from_slice::<ConfirmationReply>(&response.payload)
                .map(|reply| reply.confirmed)
                .unwrap_or(false),
            Err(e) => {
                debug!(error = %e, "confirmation request failed, treating as declined");
                false
            }
        }
    }
}

/// Remote assessment over NATS request/reply.
pub struct NatsRemoteAssessor {
    client: Client,
    subject: String,
}

impl NatsRemoteAssessor {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl RemoteAssessor for NatsRemoteAssessor {
    async fn assess(&self, features: &RemoteFeatures) -> Result<RemoteAssessment, EnrichmentError> {
        let payload = serde_json::to_vec(features)?;

        let response = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        Ok(serde_json::from_slice(&response.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_transaction() {
        let tx = Transaction::new("tx_9", "alice", "bob", 7500.0, "home_atm");
        let summary = TransactionSummary::from(&tx);
        assert_eq!(summary.transaction_id, "tx_9");
        assert_eq!(summary.sender_id, "alice");
        assert_eq!(summary.amount, 7500.0);
    }

    #[test]
    fn test_remote_assessment_deserializes_without_reasons() {
        let reply: RemoteAssessment = serde_json::from_str("{\"risk_score\": 0.42}").unwrap();
        assert_eq!(reply.risk_score, 0.42);
        assert!(reply.reasons.is_empty());
    }
}
