//! Risk scoring from applicant attributes
//!
//! Trained path: `P(high risk) * risk_score_max` from a classifier over
//! `[driver_age, previous_accidents, annual_mileage]`.
//! Fallback path: a weighted sum of accidents, mileage and age, clamped into
//! `[0, risk_score_max]`.

use crate::applicant::ApplicantProfile;
use crate::error::{PricingError, Result};
use crate::models::{
    load_or_warn, ArtifactKind, EstimatorSource, MissingModelWarning, TrainedClassifier,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Configuration for risk scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Upper end of the risk score range
    pub risk_score_max: f64,

    /// Fallback heuristic weight per previous accident
    pub accident_weight: f64,

    /// Fallback heuristic weight per thousand km of annual mileage
    pub mileage_weight: f64,

    /// Fallback heuristic weight per year of driver age
    pub age_weight: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_score_max: 10.0,
            accident_weight: 1.8,
            mileage_weight: 0.05,
            age_weight: 0.02,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.risk_score_max.is_finite() && self.risk_score_max > 0.0) {
            return Err(PricingError::config(format!(
                "risk_score_max must be positive, got {}",
                self.risk_score_max
            )));
        }
        let weights = [self.accident_weight, self.mileage_weight, self.age_weight];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(PricingError::config("risk heuristic weights must be finite"));
        }
        Ok(())
    }
}

/// The attribute that dominates an applicant's risk profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskDriver {
    /// More than two previous accidents
    VeryHighClaims,
    /// Younger than 25 or older than 60
    AgeOutsideOptimalBracket,
    /// More than 25 thousand km per year
    HighAnnualMileage,
    FavorableProfile,
}

impl RiskDriver {
    pub fn classify(applicant: &ApplicantProfile) -> Self {
        if applicant.previous_accidents > 2.0 {
            RiskDriver::VeryHighClaims
        } else if applicant.driver_age < 25.0 || applicant.driver_age > 60.0 {
            RiskDriver::AgeOutsideOptimalBracket
        } else if applicant.annual_mileage_thousands_km > 25.0 {
            RiskDriver::HighAnnualMileage
        } else {
            RiskDriver::FavorableProfile
        }
    }
}

impl fmt::Display for RiskDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RiskDriver::VeryHighClaims => "Very High Claims",
            RiskDriver::AgeOutsideOptimalBracket => "Age outside optimal bracket",
            RiskDriver::HighAnnualMileage => "High Annual Mileage",
            RiskDriver::FavorableProfile => "Favorable / Average Profile",
        };
        f.write_str(text)
    }
}

/// Outcome of scoring one applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    /// Predicted high-risk probability (trained path only)
    pub high_risk_probability: Option<f64>,
    pub method: EstimatorSource,
    pub primary_driver: RiskDriver,
    pub risk_score_max: f64,
}

impl RiskAssessment {
    pub fn explanation(&self) -> String {
        let method = match self.method {
            EstimatorSource::Trained => "Trained classifier",
            EstimatorSource::Fallback => "Fallback heuristic (no trained model)",
        };
        let probability = match self.high_risk_probability {
            Some(p) => format!("{:.4}", p),
            None => "n/a".to_string(),
        };
        format!(
            "Risk Assessment Summary:\n\
             - Prediction Method: {}\n\
             - Predicted High-Risk Probability: {}\n\
             - Primary Risk Driver: {}\n\
             - Final Risk Score (0 - {}): {:.2}",
            method, probability, self.primary_driver, self.risk_score_max, self.risk_score
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RiskModel {
    Trained(TrainedClassifier),
    Heuristic,
}

/// Converts applicant attributes into a bounded risk score
#[derive(Debug, Clone)]
pub struct RiskAssessmentEngine {
    config: RiskConfig,
    model: RiskModel,
}

impl RiskAssessmentEngine {
    /// Engine backed by a trained classifier
    pub fn with_classifier(config: RiskConfig, classifier: TrainedClassifier) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: RiskModel::Trained(classifier),
        })
    }

    /// Engine using only the fallback heuristic
    pub fn heuristic(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: RiskModel::Heuristic,
        })
    }

    /// Load the classifier at `path`, degrading to the heuristic when it is unavailable
    pub fn load(
        config: RiskConfig,
        path: Option<&Path>,
    ) -> Result<(Self, Option<MissingModelWarning>)> {
        match load_or_warn(path, ArtifactKind::Risk) {
            Ok(classifier) => Ok((Self::with_classifier(config, classifier)?, None)),
            Err(warning) => Ok((Self::heuristic(config)?, Some(warning))),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn method(&self) -> EstimatorSource {
        match self.model {
            RiskModel::Trained(_) => EstimatorSource::Trained,
            RiskModel::Heuristic => EstimatorSource::Fallback,
        }
    }

    /// Risk score in `[0, risk_score_max]`
    pub fn score(&self, applicant: &ApplicantProfile) -> Result<f64> {
        Ok(self.assess(applicant)?.risk_score)
    }

    /// Score an applicant and report how the score was produced
    pub fn assess(&self, applicant: &ApplicantProfile) -> Result<RiskAssessment> {
        applicant.validate()?;

        let max = self.config.risk_score_max;
        let (raw_score, probability) = match &self.model {
            RiskModel::Trained(classifier) => {
                let p = classifier.predict_proba(&applicant.risk_features());
                (p * max, Some(p))
            }
            RiskModel::Heuristic => (self.heuristic_score(applicant), None),
        };

        Ok(RiskAssessment {
            risk_score: raw_score.clamp(0.0, max),
            high_risk_probability: probability,
            method: self.method(),
            primary_driver: RiskDriver::classify(applicant),
            risk_score_max: max,
        })
    }

    fn heuristic_score(&self, applicant: &ApplicantProfile) -> f64 {
        applicant.previous_accidents * self.config.accident_weight
            + applicant.annual_mileage_thousands_km * self.config.mileage_weight
            + applicant.driver_age * self.config.age_weight
    }
}
