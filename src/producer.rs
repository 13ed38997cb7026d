//! NATS message producer for assessment outcomes

use crate::types::assessment::Assessment;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Producer for publishing terminal assessments.
#[derive(Clone)]
pub struct DecisionProducer {
    client: Client,
    subject: String,
}

impl DecisionProducer {
    /// Create a new decision producer.
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish an assessment to the decision subject.
    pub async fn publish(&self, assessment: &Assessment) -> Result<()> {
        let payload = serde_json::to_vec(assessment)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            assessment_id = %assessment.assessment_id,
            transaction_id = %assessment.transaction_id,
            state = ?assessment.state,
            "Published assessment"
        );

        Ok(())
    }

    /// Answer a request/reply submission on its reply subject, in addition
    /// to the regular decision stream.
    pub async fn reply(&self, reply_to: Subject, assessment: &Assessment) -> Result<()> {
        let payload = serde_json::to_vec(assessment)?;
        self.client.publish(reply_to, payload.into()).await?;
        Ok(())
    }

    /// Get the subject name.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
