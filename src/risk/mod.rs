//! Applicant risk assessment

mod engine;

pub use engine::{RiskAssessment, RiskAssessmentEngine, RiskConfig, RiskDriver};
