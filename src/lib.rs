//! Transaction Risk Pipeline Library
//!
//! A deterministic, explainable fraud-risk assessment pipeline: user-defined
//! hard policies gate every transaction, a Z-score classifier turns amounts
//! and behavioral baselines into a three-tier risk level, and elevated-risk
//! transactions pass through step-up biometric verification before they are
//! approved and recorded.

pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod policy;
pub mod producer;
pub mod scoring;
pub mod signals;
pub mod stores;
pub mod types;

pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use error::AssessmentError;
pub use orchestrator::DecisionOrchestrator;
pub use policy::enforce_policy;
pub use producer::DecisionProducer;
pub use types::{
    assessment::{Assessment, AssessmentState, RiskAnalysis, RiskLevel},
    policy::{Policy, PolicyResult},
    profile::UserProfile,
    transaction::Transaction,
};
