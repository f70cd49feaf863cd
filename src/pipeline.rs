//! Three-stage pricing pipeline: risk score -> base premium -> optimized premium
//!
//! Engines are built once and shared read-only, so customers can be priced in
//! parallel without any cross-request state.

use crate::applicant::{ApplicantProfile, ApplicantRecord};
use crate::config::EngineConfig;
use crate::error::{PricingError, Result};
use crate::market::{ConversionEstimator, ConversionModel, OptimizationResult, PriceOptimizer};
use crate::models::{EstimatorSource, MissingModelWarning};
use crate::pricing::{PricingBreakdown, PricingCalculator};
use crate::risk::{RiskAssessment, RiskAssessmentEngine};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Pipeline output for one applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResponse {
    pub risk_score: f64,
    pub base_premium: f64,
    pub final_premium: f64,
    pub optimal_multiplier: f64,
    pub expected_profit: f64,
    pub simulated_competitor_price: f64,
    pub risk_method: EstimatorSource,
    pub conversion_method: EstimatorSource,
}

/// A response together with the per-stage detail used to explain it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub response: PricingResponse,
    pub assessment: RiskAssessment,
    pub breakdown: PricingBreakdown,
    pub optimization: OptimizationResult,
}

/// A priced customer from a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerQuote {
    pub record: ApplicantRecord,
    pub quote: Quote,
}

impl CustomerQuote {
    /// Final premium minus the premium the customer currently pays
    pub fn company_profit(&self) -> Option<f64> {
        self.record
            .reference_premium
            .map(|reference| self.quote.response.final_premium - reference)
    }
}

/// Aggregate figures over a batch of quotes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub quoted: usize,
    pub rejected: usize,
    pub total_final_premium: f64,
    pub mean_final_premium: f64,
    pub total_expected_profit: f64,
    pub mean_risk_score: f64,
    /// Sum of `company_profit` over customers with a reference premium
    pub total_company_profit: Option<f64>,
    pub fallback_quotes: usize,
}

impl PortfolioSummary {
    pub fn from_responses(results: &[Result<CustomerQuote>]) -> Self {
        let mut summary = Self::default();
        let mut total_risk = 0.0;

        for result in results {
            let Ok(customer) = result else {
                summary.rejected += 1;
                continue;
            };
            let response = &customer.quote.response;
            summary.quoted += 1;
            summary.total_final_premium += response.final_premium;
            summary.total_expected_profit += response.expected_profit;
            total_risk += response.risk_score;
            if response.conversion_method == EstimatorSource::Fallback {
                summary.fallback_quotes += 1;
            }
            if let Some(profit) = customer.company_profit() {
                *summary.total_company_profit.get_or_insert(0.0) += profit;
            }
        }

        if summary.quoted > 0 {
            summary.mean_final_premium = summary.total_final_premium / summary.quoted as f64;
            summary.mean_risk_score = total_risk / summary.quoted as f64;
        }
        summary
    }
}

/// Risk engine, pricing calculator and optimizer wired in sequence
#[derive(Debug, Clone)]
pub struct PricingPipeline {
    risk: RiskAssessmentEngine,
    pricing: PricingCalculator,
    optimizer: PriceOptimizer,
    advisories: Vec<MissingModelWarning>,
}

impl PricingPipeline {
    /// Build all engines from configuration, loading any configured model artifacts
    ///
    /// Invalid configuration fails here; unavailable models only add advisories.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut advisories = Vec::new();

        let (risk, warning) =
            RiskAssessmentEngine::load(config.risk.clone(), config.models.risk_model.as_deref())?;
        advisories.extend(warning);

        let (estimator, warning) = ConversionEstimator::load(
            config.models.conversion_model.as_deref(),
            config.optimizer.fallback,
        );
        advisories.extend(warning);

        let pricing = PricingCalculator::new(config.pricing.clone())?;
        let optimizer = PriceOptimizer::new(config.optimizer, estimator)?;

        info!(
            "Pricing pipeline ready: risk={}, conversion={}, {} candidate multipliers",
            risk.method().as_str(),
            optimizer.estimator().source().as_str(),
            optimizer.grid().len()
        );

        Ok(Self {
            risk,
            pricing,
            optimizer,
            advisories,
        })
    }

    /// Assemble a pipeline from already-built engines
    pub fn from_engines(
        risk: RiskAssessmentEngine,
        pricing: PricingCalculator,
        optimizer: PriceOptimizer,
    ) -> Self {
        Self {
            risk,
            pricing,
            optimizer,
            advisories: Vec::new(),
        }
    }

    /// Models that could not be loaded and were replaced by fallbacks
    pub fn advisories(&self) -> &[MissingModelWarning] {
        &self.advisories
    }

    pub fn risk_engine(&self) -> &RiskAssessmentEngine {
        &self.risk
    }

    pub fn pricing_calculator(&self) -> &PricingCalculator {
        &self.pricing
    }

    pub fn optimizer(&self) -> &PriceOptimizer {
        &self.optimizer
    }

    /// Price one applicant
    pub fn quote(&self, applicant: &ApplicantProfile) -> Result<PricingResponse> {
        Ok(self.quote_detailed(applicant)?.response)
    }

    /// Price one applicant, keeping every stage's detail
    pub fn quote_detailed(&self, applicant: &ApplicantProfile) -> Result<Quote> {
        let assessment = self.risk.assess(applicant)?;
        let breakdown = self.pricing.breakdown(assessment.risk_score)?;
        let optimization = self.optimizer.optimize(breakdown.base_premium, applicant)?;

        let response = PricingResponse {
            risk_score: assessment.risk_score,
            base_premium: breakdown.base_premium,
            final_premium: optimization.final_premium,
            optimal_multiplier: optimization.optimal_multiplier,
            expected_profit: optimization.expected_profit,
            simulated_competitor_price: optimization.simulated_competitor_price,
            risk_method: assessment.method,
            conversion_method: optimization.estimator,
        };

        Ok(Quote {
            response,
            assessment,
            breakdown,
            optimization,
        })
    }

    /// Price one dataset record
    pub fn quote_record(&self, record: &ApplicantRecord) -> Result<CustomerQuote> {
        let quote = self.quote_detailed(&record.profile).map_err(|e| match e {
            PricingError::InvalidInput { field, reason } => PricingError::InvalidInput {
                field,
                reason: format!("customer {}: {}", record.customer_id, reason),
            },
            other => other,
        })?;
        Ok(CustomerQuote {
            record: record.clone(),
            quote,
        })
    }

    /// Price many records in parallel, keeping input order
    pub fn quote_batch(&self, records: &[ApplicantRecord]) -> Vec<Result<CustomerQuote>> {
        records.par_iter().map(|record| self.quote_record(record)).collect()
    }

    /// Full explanation text for a quote
    pub fn explain(&self, quote: &Quote) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            quote.assessment.explanation(),
            quote.breakdown.explanation(self.pricing.config().margin_rate),
            quote.optimization.explanation()
        )
    }
}
