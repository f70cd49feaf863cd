//! Conversion probability estimation
//!
//! The optimizer only sees [`ConversionModel`]: a feature vector goes in, the
//! probability that the quote is accepted comes out. [`ConversionEstimator`] is
//! the production implementation, backed either by a trained classifier or by a
//! deterministic fallback rule when no classifier could be loaded.

use crate::models::{
    load_or_warn, ArtifactKind, EstimatorSource, MissingModelWarning, TrainedClassifier,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inputs to the conversion classifier, in training order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionFeatures {
    /// Quoted premium minus the simulated competitor price
    pub price_difference: f64,
    pub driver_age: f64,
    pub previous_accidents: f64,
}

impl ConversionFeatures {
    pub fn as_array(&self) -> [f64; 3] {
        [self.price_difference, self.driver_age, self.previous_accidents]
    }
}

/// Conversion probability used when no trained classifier is available
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FallbackRule {
    /// `below_competitor` when quoting under the competitor, `otherwise` at or above it
    Fixed { below_competitor: f64, otherwise: f64 },
    /// Uniform draw in `[low, high]`, seeded by the feature vector
    UniformBand { low: f64, high: f64 },
}

impl Default for FallbackRule {
    fn default() -> Self {
        FallbackRule::Fixed {
            below_competitor: 1.0,
            otherwise: 0.5,
        }
    }
}

impl FallbackRule {
    /// Default band for [`FallbackRule::UniformBand`]
    pub fn uniform_default() -> Self {
        FallbackRule::UniformBand { low: 0.4, high: 0.8 }
    }

    pub fn validate(&self) -> Result<(), String> {
        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        match *self {
            FallbackRule::Fixed {
                below_competitor,
                otherwise,
            } => {
                if !in_unit(below_competitor) || !in_unit(otherwise) {
                    return Err(format!(
                        "fallback probabilities must lie in [0, 1], got {} and {}",
                        below_competitor, otherwise
                    ));
                }
            }
            FallbackRule::UniformBand { low, high } => {
                if !in_unit(low) || !in_unit(high) || low > high {
                    return Err(format!(
                        "fallback band must satisfy 0 <= low <= high <= 1, got [{}, {}]",
                        low, high
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn probability(&self, features: &ConversionFeatures) -> f64 {
        match *self {
            FallbackRule::Fixed {
                below_competitor,
                otherwise,
            } => {
                if features.price_difference < 0.0 {
                    below_competitor
                } else {
                    otherwise
                }
            }
            FallbackRule::UniformBand { low, high } => {
                if low == high {
                    return low;
                }
                let mut rng = ChaCha20Rng::seed_from_u64(feature_seed(features));
                rng.random_range(low..=high)
            }
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            FallbackRule::Fixed {
                below_competitor,
                otherwise,
            } => format!(
                "P = {} below competitor, {} otherwise",
                below_competitor, otherwise
            ),
            FallbackRule::UniformBand { low, high } => {
                format!("P ~ Uniform[{}, {}]", low, high)
            }
        }
    }
}

/// Stable seed from the bit patterns of the feature vector
fn feature_seed(features: &ConversionFeatures) -> u64 {
    features
        .as_array()
        .iter()
        .fold(0x9E37_79B9_7F4A_7C15_u64, |acc, x| {
            (acc ^ x.to_bits()).rotate_left(23).wrapping_mul(0x1000_0000_01B3)
        })
}

/// Capability the optimizer queries once per candidate multiplier
///
/// Implementations must be stateless across calls.
pub trait ConversionModel: Send + Sync {
    /// Probability in `[0, 1]` that a quote with these features is accepted
    fn predict(&self, features: &ConversionFeatures) -> f64;

    /// Which path answers the queries
    fn source(&self) -> EstimatorSource;

    /// Human-readable name used in result explanations
    fn label(&self) -> String {
        self.source().as_str().to_string()
    }
}

/// Production conversion estimator
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionEstimator {
    Trained(TrainedClassifier),
    Fallback(FallbackRule),
}

impl ConversionEstimator {
    /// Load the trained classifier at `path`, degrading to `fallback` on any failure
    pub fn load(
        path: Option<&Path>,
        fallback: FallbackRule,
    ) -> (Self, Option<MissingModelWarning>) {
        match load_or_warn(path, ArtifactKind::Conversion) {
            Ok(model) => (ConversionEstimator::Trained(model), None),
            Err(warning) => (ConversionEstimator::Fallback(fallback), Some(warning)),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ConversionEstimator::Fallback(_))
    }
}

impl Default for ConversionEstimator {
    fn default() -> Self {
        ConversionEstimator::Fallback(FallbackRule::default())
    }
}

impl ConversionModel for ConversionEstimator {
    fn predict(&self, features: &ConversionFeatures) -> f64 {
        match self {
            ConversionEstimator::Trained(model) => model.predict_proba(&features.as_array()),
            ConversionEstimator::Fallback(rule) => rule.probability(features),
        }
    }

    fn source(&self) -> EstimatorSource {
        match self {
            ConversionEstimator::Trained(_) => EstimatorSource::Trained,
            ConversionEstimator::Fallback(_) => EstimatorSource::Fallback,
        }
    }

    fn label(&self) -> String {
        match self {
            ConversionEstimator::Trained(model) => format!("{} (trained)", model.name()),
            ConversionEstimator::Fallback(rule) => {
                format!("Fallback rule, no trained model ({})", rule.describe())
            }
        }
    }
}
