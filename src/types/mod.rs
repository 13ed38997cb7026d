//! Type definitions for the risk assessment pipeline

pub mod assessment;
pub mod policy;
pub mod profile;
pub mod transaction;

pub use assessment::{Assessment, AssessmentState, RiskAnalysis, RiskLevel};
pub use policy::{Policy, PolicyResult};
pub use profile::UserProfile;
pub use transaction::Transaction;
