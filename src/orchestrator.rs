//! Decision orchestration: policy gate, risk scoring, step-up
//! verification, recording, and best-effort remote enrichment.
//!
//! One transaction flows end-to-end per submission:
//! submitted -> policy check -> policy_blocked (terminal)
//!                            | risk scored -> verified (terminal)
//!                            | needs verification -> verified_via_biometric
//!                                                  | blocked_biometric_fail
//!                                                  | cancelled_by_user
//!
//! A policy block is unconditional: no scoring, no step-up, no recording,
//! no baseline learning. Recording and remote enrichment are fire-and-forget;
//! their failures are logged and never revert a rendered decision.

use crate::error::{AssessmentError, BiometricError, ValidationError};
use crate::policy::enforce_policy;
use crate::scoring::{classifier, compliance, explain};
use crate::signals::{
    BiometricVerifier, IntentConfirmer, RemoteAssessor, RemoteFeatures, TransactionSummary,
};
use crate::stores::{HistoryRecord, HistoryRecorder, PolicyStore, ProfileStore};
use crate::types::assessment::{Assessment, AssessmentState, RiskAnalysis, RiskLevel};
use crate::types::policy::{Policy, PolicyResult};
use crate::types::profile::UserProfile;
use crate::types::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequences one transaction through policy enforcement, scoring, step-up
/// verification, and recording.
pub struct DecisionOrchestrator {
    profiles: Arc<dyn ProfileStore>,
    policies: Arc<dyn PolicyStore>,
    biometric: Arc<dyn BiometricVerifier>,
    confirmer: Arc<dyn IntentConfirmer>,
    recorder: Arc<dyn HistoryRecorder>,
    remote: Option<Arc<dyn RemoteAssessor>>,
    step_timeout: Duration,
}

impl DecisionOrchestrator {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        policies: Arc<dyn PolicyStore>,
        biometric: Arc<dyn BiometricVerifier>,
        confirmer: Arc<dyn IntentConfirmer>,
        recorder: Arc<dyn HistoryRecorder>,
    ) -> Self {
        Self {
            profiles,
            policies,
            biometric,
            confirmer,
            recorder,
            remote: None,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Attach a best-effort remote assessor for decision enrichment.
    pub fn with_remote_assessor(mut self, remote: Arc<dyn RemoteAssessor>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Override the timeout applied to each step-up and enrichment call.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Score a transaction against a profile and policy with no
    /// collaborator calls: the deterministic core of every assessment.
    ///
    /// A policy violation short-circuits scoring entirely and the risk
    /// analysis is absent from the result.
    pub fn assess(
        tx: &Transaction,
        profile: Option<&UserProfile>,
        policy: Option<&Policy>,
    ) -> Result<(PolicyResult, Option<RiskAnalysis>), ValidationError> {
        tx.validate()?;

        let policy_result = enforce_policy(tx, policy);
        if !policy_result.allowed {
            return Ok((policy_result, None));
        }

        Ok((policy_result, Some(Self::score(tx, profile))))
    }

    /// Build the full risk analysis for a transaction. The tier is
    /// finalized by the classifier before any explanation factor exists.
    fn score(tx: &Transaction, profile: Option<&UserProfile>) -> RiskAnalysis {
        let classification = classifier::classify(tx.amount, &tx.location, profile);
        let location_match = classification.location.is_match();
        let unusual_time = explain::is_unusual_time(tx.hour(), profile);
        let compliance_score =
            compliance::compliance_score(classification.z_score, location_match, unusual_time);
        let factors = explain::explain(tx.amount, &tx.location, tx.hour(), &classification, profile);

        RiskAnalysis {
            z_score: classification.z_score,
            abs_z_score: classification.abs_z_score,
            risk_level: classification.risk_level,
            status: classification.risk_level.review_status(),
            action: classification.risk_level.action(),
            compliance_score,
            factors,
            location_match,
            mean: classification.mean,
            std_dev: classification.std_dev,
            new_user: classification.new_user,
        }
    }

    /// Run one transaction end-to-end and return its terminal assessment.
    pub async fn submit(&self, tx: Transaction) -> Result<Assessment, AssessmentError> {
        tx.validate().map_err(AssessmentError::Validation)?;

        // Policies are read fresh on every submission so the latest save
        // always applies.
        let policy = self.load_policy(&tx.sender_id).await;
        let policy_result = enforce_policy(&tx, policy.as_ref());
        if !policy_result.allowed {
            info!(
                transaction_id = %tx.transaction_id,
                violations = policy_result.violations.len(),
                "transaction blocked by policy"
            );
            return Ok(Assessment::terminal(
                tx.transaction_id,
                AssessmentState::PolicyBlocked,
                "transaction blocked by policy",
                policy_result,
                None,
            ));
        }

        let profile = self.load_profile(&tx.sender_id).await;
        let mut analysis = Self::score(&tx, profile.as_ref());

        debug!(
            transaction_id = %tx.transaction_id,
            z_score = analysis.z_score,
            risk_level = ?analysis.risk_level,
            "transaction scored"
        );

        match analysis.risk_level {
            RiskLevel::Low => {
                self.record(&tx, &analysis, "VERIFIED").await;
                self.learn(&tx, profile).await;
                self.enrich(&tx, &mut analysis).await;
                Ok(Assessment::terminal(
                    tx.transaction_id.clone(),
                    AssessmentState::Verified,
                    "transaction verified",
                    policy_result,
                    Some(analysis),
                ))
            }
            RiskLevel::Medium | RiskLevel::High => {
                self.step_up(tx, policy_result, analysis, profile).await
            }
        }
    }

    /// Elevated-risk path: biometric verification, then intent confirmation.
    async fn step_up(
        &self,
        tx: Transaction,
        policy_result: PolicyResult,
        mut analysis: RiskAnalysis,
        profile: Option<UserProfile>,
    ) -> Result<Assessment, AssessmentError> {
        let summary = TransactionSummary::from(&tx);

        let verified =
            match tokio::time::timeout(self.step_timeout, self.biometric.verify(&summary)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(transaction_id = %tx.transaction_id, "biometric verification timed out");
                    Err(BiometricError::Unavailable("verification timed out".to_string()))
                }
            };

        match verified {
            Err(BiometricError::NotEnrolled) => {
                analysis
                    .factors
                    .push(explain::biometric_unavailable_factor(
                        "no biometric enrollment on file",
                    ));
                Ok(Assessment::terminal(
                    tx.transaction_id,
                    AssessmentState::BlockedBiometricFail,
                    "additional verification required but no biometric enrollment on file",
                    policy_result,
                    Some(analysis),
                ))
            }
            Err(BiometricError::Unavailable(reason)) => {
                analysis
                    .factors
                    .push(explain::biometric_unavailable_factor(&reason));
                Ok(Assessment::terminal(
                    tx.transaction_id,
                    AssessmentState::BlockedBiometricFail,
                    "biometric verification unavailable",
                    policy_result,
                    Some(analysis),
                ))
            }
            Ok(false) => {
                analysis.factors.push(explain::biometric_factor(false));
                Ok(Assessment::terminal(
                    tx.transaction_id,
                    AssessmentState::BlockedBiometricFail,
                    "biometric verification failed",
                    policy_result,
                    Some(analysis),
                ))
            }
            Ok(true) => {
                analysis.factors.push(explain::biometric_factor(true));

                let confirmed =
                    match tokio::time::timeout(self.step_timeout, self.confirmer.confirm(&summary))
                        .await
                    {
                        Ok(confirmed) => confirmed,
                        Err(_) => {
                            warn!(
                                transaction_id = %tx.transaction_id,
                                "confirmation timed out, treating as declined"
                            );
                            false
                        }
                    };

                if !confirmed {
                    return Ok(Assessment::terminal(
                        tx.transaction_id,
                        AssessmentState::CancelledByUser,
                        "transaction cancelled before completion",
                        policy_result,
                        Some(analysis),
                    ));
                }

                self.record(&tx, &analysis, "VERIFIED_VIA_BIOMETRIC").await;
                self.learn(&tx, profile).await;
                self.enrich(&tx, &mut analysis).await;
                Ok(Assessment::terminal(
                    tx.transaction_id.clone(),
                    AssessmentState::VerifiedViaBiometric,
                    "transaction verified after biometric check",
                    policy_result,
                    Some(analysis),
                ))
            }
        }
    }

    async fn load_policy(&self, user_id: &str) -> Option<Policy> {
        match self.policies.get(user_id).await {
            Ok(policy) => policy,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "policy store unavailable, treating as no policies configured"
                );
                None
            }
        }
    }

    async fn load_profile(&self, user_id: &str) -> Option<UserProfile> {
        match self.profiles.get(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "profile store unavailable, treating as new user"
                );
                None
            }
        }
    }

    /// Append the transaction to history. Failure is logged; the decision
    /// already shown to the caller stands.
    async fn record(&self, tx: &Transaction, analysis: &RiskAnalysis, status: &str) {
        let record = HistoryRecord {
            amount: tx.amount,
            location: tx.location.clone(),
            date: tx.date_string(),
            time: tx.time_string(),
            status: status.to_string(),
            z_score: analysis.z_score,
        };
        if let Err(e) = self.recorder.append(&tx.sender_id, &record).await {
            warn!(
                transaction_id = %tx.transaction_id,
                error = %e,
                "history append failed, decision stands"
            );
        }
    }

    /// Fold an approved transaction into the user's behavioral baseline.
    /// Amounts outside the baseline eligibility band only contribute their
    /// hour, so anomalous-but-approved transactions cannot drag the
    /// statistics toward themselves.
    async fn learn(&self, tx: &Transaction, profile: Option<UserProfile>) {
        let Some(mut profile) = profile else {
            return;
        };
        if !profile.learning_enabled {
            return;
        }

        if profile.baseline_eligible(tx.amount) {
            profile.record_amount(tx.amount, tx.hour());
        } else {
            debug!(
                transaction_id = %tx.transaction_id,
                amount = tx.amount,
                "amount excluded from baseline update"
            );
            profile.record_hour(tx.hour());
        }

        if let Err(e) = self.profiles.put(&profile).await {
            warn!(user_id = %profile.user_id, error = %e, "profile update failed");
        }
    }

    /// Best-effort remote assessment. On success one info factor is
    /// appended; every failure mode is swallowed. The already-rendered
    /// decision never changes.
    async fn enrich(&self, tx: &Transaction, analysis: &mut RiskAnalysis) {
        let Some(remote) = &self.remote else {
            return;
        };

        let features = RemoteFeatures {
            amount: tx.amount,
            hour: tx.hour(),
            abs_z_score: analysis.abs_z_score,
            location_match: analysis.location_match,
            new_user: analysis.new_user,
        };

        match tokio::time::timeout(self.step_timeout, remote.assess(&features)).await {
            Ok(Ok(assessment)) => {
                analysis.factors.push(explain::remote_factor(&assessment));
            }
            Ok(Err(e)) => {
                debug!(transaction_id = %tx.transaction_id, error = %e, "remote assessment skipped");
            }
            Err(_) => {
                debug!(transaction_id = %tx.transaction_id, "remote assessment timed out");
            }
        }
    }
}
