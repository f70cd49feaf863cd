//! Premium Optimizer - per-customer motor insurance pricing
//!
//! This library provides:
//! - Risk scoring from applicant attributes (trained classifier or weighted heuristic)
//! - Actuarial base premium calculation
//! - Expected-profit price optimization over a bounded multiplier grid
//! - JSON model artifacts and graceful fallbacks when they are missing
//! - Parallel batch pricing with portfolio summaries

pub mod applicant;
pub mod models;
pub mod market;
pub mod risk;
pub mod pricing;
pub mod pipeline;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use applicant::{load_applicants, ApplicantProfile, ApplicantRecord};
pub use config::EngineConfig;
pub use error::{PricingError, Result};
pub use market::{ConversionEstimator, OptimizationResult, OptimizerConfig, PriceOptimizer};
pub use models::{EstimatorSource, MissingModelWarning};
pub use pipeline::{CustomerQuote, PortfolioSummary, PricingPipeline, PricingResponse, Quote};
pub use pricing::PricingCalculator;
pub use risk::RiskAssessmentEngine;
