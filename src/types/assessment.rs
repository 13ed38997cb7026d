//! Risk assessment outputs: tiers, decision vocabularies, explanation
//! factors, and the terminal assessment record.

use crate::types::policy::PolicyResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-tier ordinal risk level.
///
/// Every decision vocabulary in the system derives from this single enum;
/// no logic ever branches on which presentation a caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Reviewer-facing decision vocabulary.
    pub fn review_status(self) -> ReviewStatus {
        match self {
            RiskLevel::Low => ReviewStatus::Verified,
            RiskLevel::Medium => ReviewStatus::Flagged,
            RiskLevel::High => ReviewStatus::Blocked,
        }
    }

    /// Action vocabulary used on the wire by the assessment service.
    pub fn action(self) -> Action {
        match self {
            RiskLevel::Low => Action::Allow,
            RiskLevel::Medium => Action::Delay,
            RiskLevel::High => Action::Block,
        }
    }
}

/// Reviewer-facing decision: how the transaction is presented in history
/// and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    Verified,
    Flagged,
    Blocked,
}

/// Actionable decision for the caller processing the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Allow,
    Delay,
    Block,
}

/// Tone of an explanation factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorKind {
    Good,
    Warn,
    Info,
    Bad,
}

/// One human-readable justification for an assessment. Factor order is
/// significant: amount first, then location, then time, then any step-up
/// or remote-assessment factors appended later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    pub kind: FactorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Factor {
    pub fn new(kind: FactorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Complete risk analysis for one transaction. Created once per assessment
/// and never mutated afterwards, apart from enrichment factors appended to
/// `factors` after the decision is already final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Signed Z-score of the amount against the user's baseline
    pub z_score: f64,

    /// Absolute Z-score
    pub abs_z_score: f64,

    /// Final risk tier, fixed before explanation factors are built
    pub risk_level: RiskLevel,

    /// Reviewer vocabulary, always `risk_level.review_status()`
    pub status: ReviewStatus,

    /// Action vocabulary, always `risk_level.action()`
    pub action: Action,

    /// Presentation-only compliance score in [10, 100]
    pub compliance_score: i64,

    /// Ordered explanation factors
    pub factors: Vec<Factor>,

    /// False only when trusted locations exist and none matched
    pub location_match: bool,

    /// Baseline mean used for scoring (possibly the new-user default)
    pub mean: f64,

    /// Baseline standard deviation used for scoring (possibly estimated)
    pub std_dev: f64,

    /// Whether new-user default assumptions were applied
    pub new_user: bool,
}

/// Terminal state of an orchestrated assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentState {
    /// A hard policy violation ended the assessment before scoring
    PolicyBlocked,
    /// Low risk, approved without step-up verification
    Verified,
    /// Elevated risk, approved after biometric verification and confirmation
    VerifiedViaBiometric,
    /// Elevated risk and the biometric step failed or was unavailable
    BlockedBiometricFail,
    /// The user declined to confirm the transaction
    CancelledByUser,
}

impl AssessmentState {
    /// Whether the transaction may proceed.
    pub fn is_approved(self) -> bool {
        matches!(
            self,
            AssessmentState::Verified | AssessmentState::VerifiedViaBiometric
        )
    }
}

/// The published outcome of one orchestrated assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// The transaction this assessment decided
    pub transaction_id: String,

    pub state: AssessmentState,

    /// Short human-readable summary of the outcome
    pub message: String,

    /// Policy gate outcome, including every collected violation
    pub policy_result: PolicyResult,

    /// Risk analysis, absent when the policy gate blocked the transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskAnalysis>,

    pub timestamp: DateTime<Utc>,
}

impl Assessment {
    /// Build a terminal assessment record.
    pub fn terminal(
        transaction_id: impl Into<String>,
        state: AssessmentState,
        message: impl Into<String>,
        policy_result: PolicyResult,
        risk_analysis: Option<RiskAnalysis>,
    ) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: transaction_id.into(),
            state,
            message: message.into(),
            policy_result,
            risk_analysis,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_vocabularies_stay_in_lockstep() {
        let pairs = [
            (RiskLevel::Low, ReviewStatus::Verified, Action::Allow),
            (RiskLevel::Medium, ReviewStatus::Flagged, Action::Delay),
            (RiskLevel::High, ReviewStatus::Blocked, Action::Block),
        ];
        for (level, status, action) in pairs {
            assert_eq!(level.review_status(), status);
            assert_eq!(level.action(), action);
        }
    }

    #[test]
    fn test_risk_level_is_ordinal() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_factor_serialization() {
        let factor = Factor::new(FactorKind::Warn, "Amount is higher than usual")
            .with_detail("z-score 2.41");

        let json = serde_json::to_string(&factor).unwrap();
        assert!(json.contains("\"kind\":\"warn\""));

        let bare = Factor::new(FactorKind::Good, "ok");
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("detail"));
    }

    #[test]
    fn test_assessment_serialization_roundtrip() {
        let assessment = Assessment::terminal(
            "tx_1",
            AssessmentState::PolicyBlocked,
            "blocked by policy",
            PolicyResult::blocked(Vec::new()),
            None,
        );

        let json = serde_json::to_string(&assessment).unwrap();
        assert!(json.contains("\"state\":\"policy_blocked\""));

        let decoded: Assessment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.state, AssessmentState::PolicyBlocked);
        assert!(!decoded.state.is_approved());
        assert!(decoded.risk_analysis.is_none());
    }
}
