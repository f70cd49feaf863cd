//! Actuarial base premium from a risk score
//!
//! `base_premium = risk_score * cost_per_unit_risk * (1 + margin_rate) + fixed_fee`

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

/// Pricing formula constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Expected claims cost per unit of risk score
    pub cost_per_unit_risk: f64,

    /// Profit loading as a fraction of the pure risk cost
    pub margin_rate: f64,

    /// Flat administration fee
    pub fixed_fee: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cost_per_unit_risk: 550.0,
            margin_rate: 0.15,
            fixed_fee: 150.0,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("cost_per_unit_risk", self.cost_per_unit_risk),
            ("margin_rate", self.margin_rate),
            ("fixed_fee", self.fixed_fee),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PricingError::config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        // A zero-risk applicant must still get a positive premium to optimize
        if self.fixed_fee == 0.0 && self.cost_per_unit_risk == 0.0 {
            return Err(PricingError::config(
                "cost_per_unit_risk and fixed_fee cannot both be zero",
            ));
        }
        Ok(())
    }
}

/// Components of a base premium calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub risk_score: f64,
    pub pure_risk_cost: f64,
    pub profit_loading: f64,
    pub fixed_fee: f64,
    pub base_premium: f64,
}

impl PricingBreakdown {
    pub fn explanation(&self, margin_rate: f64) -> String {
        format!(
            "Pricing Calculation Details (Actuarial Logic):\n\
             - Risk Score Used: {:.2}\n\
             - Pure Risk Cost: ${:.2}\n\
             - Profit Margin ({:.0}%): +${:.2}\n\
             - Fixed Admin Fee: +${:.2}\n\
             - Base Premium (Before Market Adjustment): ${:.2}",
            self.risk_score,
            self.pure_risk_cost,
            margin_rate * 100.0,
            self.profit_loading,
            self.fixed_fee,
            self.base_premium
        )
    }
}

/// Pure function from risk score to base premium
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Base premium for a risk score; negative scores are rejected, not clamped
    pub fn price(&self, risk_score: f64) -> Result<f64> {
        Ok(self.breakdown(risk_score)?.base_premium)
    }

    pub fn breakdown(&self, risk_score: f64) -> Result<PricingBreakdown> {
        if !risk_score.is_finite() || risk_score < 0.0 {
            return Err(PricingError::invalid(
                "risk_score",
                format!("must be a non-negative number, got {}", risk_score),
            ));
        }

        let pure_risk_cost = risk_score * self.config.cost_per_unit_risk;
        let profit_loading = pure_risk_cost * self.config.margin_rate;
        let base_premium = pure_risk_cost + profit_loading + self.config.fixed_fee;

        Ok(PricingBreakdown {
            risk_score,
            pure_risk_cost,
            profit_loading,
            fixed_fee: self.config.fixed_fee,
            base_premium,
        })
    }
}
