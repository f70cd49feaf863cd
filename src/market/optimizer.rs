//! Expected-profit price optimization over a bounded multiplier grid
//!
//! For every candidate multiplier `m` the quote is `base_premium * m`, the
//! conversion model is asked how likely that quote is to be accepted against a
//! simulated competitor, and the expected profit is
//! `P(conversion) * (quote - base_premium)`. The first multiplier (in ascending
//! order) reaching the maximum expected profit wins.

use super::conversion::{ConversionEstimator, ConversionFeatures, ConversionModel, FallbackRule};
use crate::applicant::ApplicantProfile;
use crate::error::{PricingError, Result};
use crate::models::EstimatorSource;
use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Default lower guardrail on the premium multiplier
pub const DEFAULT_MIN_MULTIPLIER: f64 = 0.90;

/// Default upper guardrail on the premium multiplier
pub const DEFAULT_MAX_MULTIPLIER: f64 = 1.10;

/// Default number of grid points (step 0.01 between the default guardrails)
pub const DEFAULT_GRID_STEPS: usize = 21;

/// Largest accepted number of grid points
pub const MAX_GRID_STEPS: usize = 100_001;

/// Default half-width of the competitor price band around the base premium
pub const DEFAULT_COMPETITOR_BAND: f64 = 0.02;

/// Multiplier used if the grid search never records an improvement
const NEUTRAL_MULTIPLIER: f64 = 1.0;

/// Configuration for the price optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Lowest multiplier the optimizer may quote (regulatory/profit guardrail)
    pub min_multiplier: f64,

    /// Highest multiplier the optimizer may quote
    pub max_multiplier: f64,

    /// Number of evenly spaced candidates, both endpoints included
    pub grid_steps: usize,

    /// Competitor price is `base_premium * U`, `U ~ Uniform[1 - band, 1 + band]`
    pub competitor_band: f64,

    /// Conversion rule used when no trained classifier is available
    pub fallback: FallbackRule,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_multiplier: DEFAULT_MIN_MULTIPLIER,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            grid_steps: DEFAULT_GRID_STEPS,
            competitor_band: DEFAULT_COMPETITOR_BAND,
            fallback: FallbackRule::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_multiplier.is_finite() || !self.max_multiplier.is_finite() {
            return Err(PricingError::config("multiplier bounds must be finite"));
        }
        if self.min_multiplier <= 0.0 {
            return Err(PricingError::config(format!(
                "min_multiplier must be positive, got {}",
                self.min_multiplier
            )));
        }
        if self.min_multiplier >= self.max_multiplier {
            return Err(PricingError::config(format!(
                "min_multiplier ({}) must be below max_multiplier ({})",
                self.min_multiplier, self.max_multiplier
            )));
        }
        if !(2..=MAX_GRID_STEPS).contains(&self.grid_steps) {
            return Err(PricingError::config(format!(
                "grid_steps must lie in [2, {}], got {}",
                MAX_GRID_STEPS, self.grid_steps
            )));
        }
        if !(0.0..1.0).contains(&self.competitor_band) {
            return Err(PricingError::config(format!(
                "competitor_band must lie in [0, 1), got {}",
                self.competitor_band
            )));
        }
        self.fallback.validate().map_err(PricingError::Configuration)
    }
}

/// Ordered candidate multipliers spanning `[min, max]`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplierGrid {
    values: Vec<f64>,
}

impl MultiplierGrid {
    /// Evenly spaced grid; the endpoints are stored exactly
    pub fn new(min: f64, max: f64, steps: usize) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(PricingError::config(format!(
                "invalid multiplier range [{}, {}]",
                min, max
            )));
        }
        if !(2..=MAX_GRID_STEPS).contains(&steps) {
            return Err(PricingError::config(format!(
                "grid_steps must lie in [2, {}], got {}",
                MAX_GRID_STEPS, steps
            )));
        }

        let last = steps - 1;
        let span = max - min;
        let values = (0..steps)
            .map(|i| match i {
                0 => min,
                i if i == last => max,
                i => min + span * i as f64 / last as f64,
            })
            .collect();

        Ok(Self { values })
    }

    pub fn from_config(config: &OptimizerConfig) -> Result<Self> {
        Self::new(config.min_multiplier, config.max_multiplier, config.grid_steps)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// Deterministic seed for the competitor simulation: the base premium in whole cents
pub fn seed_from(base_premium: f64) -> u64 {
    // `as` saturates: negative and NaN map to 0
    (base_premium * 100.0) as u64
}

/// Competitor price drawn from a generator seeded by the base premium
///
/// Identical base premiums always produce identical competitor prices.
pub fn simulate_competitor_price(base_premium: f64, band: f64) -> f64 {
    if band == 0.0 {
        return base_premium;
    }
    let mut rng = ChaCha20Rng::seed_from_u64(seed_from(base_premium));
    base_premium * rng.random_range((1.0 - band)..=(1.0 + band))
}

/// Round to cents without leaving `[lo, hi]`
///
/// Falls back to the unrounded value when no whole-cent amount fits the band.
pub fn round_currency_within(value: f64, lo: f64, hi: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    let candidate = if rounded < lo {
        (lo * 100.0).ceil() / 100.0
    } else if rounded > hi {
        (hi * 100.0).floor() / 100.0
    } else {
        rounded
    };

    if candidate >= lo && candidate <= hi {
        candidate
    } else {
        value
    }
}

/// Everything computed for one candidate multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub multiplier: f64,
    pub quoted_premium: f64,
    pub price_difference: f64,
    pub conversion_probability: f64,
    pub profit_margin: f64,
    pub expected_profit: f64,
}

/// Pick the first candidate with the strictly greatest expected profit
///
/// Later candidates with an equal expected profit never replace an earlier one.
pub fn select_optimal(evaluations: &[CandidateEvaluation]) -> Option<&CandidateEvaluation> {
    let mut best: Option<&CandidateEvaluation> = None;
    let mut best_profit = f64::NEG_INFINITY;

    for eval in evaluations {
        if eval.expected_profit > best_profit {
            best_profit = eval.expected_profit;
            best = Some(eval);
        }
    }

    best
}

/// Outcome of one optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub base_premium: f64,
    pub optimal_multiplier: f64,
    /// `base_premium * optimal_multiplier`, rounded to cents
    pub final_premium: f64,
    pub expected_profit: f64,
    pub simulated_competitor_price: f64,
    /// Conversion probability of the winning quote
    pub conversion_probability: f64,
    pub estimator: EstimatorSource,
    pub estimator_label: String,
}

impl OptimizationResult {
    pub fn adjustment_amount(&self) -> f64 {
        self.final_premium - self.base_premium
    }

    pub fn adjustment_percentage(&self) -> f64 {
        (self.optimal_multiplier - 1.0) * 100.0
    }

    pub fn used_fallback(&self) -> bool {
        self.estimator == EstimatorSource::Fallback
    }

    pub fn explanation(&self) -> String {
        let kind = if self.optimal_multiplier < 1.0 {
            "Discount"
        } else if self.optimal_multiplier > 1.0 {
            "Surcharge"
        } else {
            "No adjustment"
        };
        let mut text = format!(
            "Market Adjustment Details (Expected Profit Optimization):\n\
             - Conversion Estimator: {}\n\
             - Simulated Competitor Price: ${:.2}\n\
             - Optimal Multiplier: {:.2}\n\
             - Conversion Probability at Optimum: {:.4}\n\
             - Expected Profit: ${:.2}\n\
             - {} Applied: {:+.2}% (Amount: ${:+.2})\n\
             - Final Price Quoted: ${:.2}",
            self.estimator_label,
            self.simulated_competitor_price,
            self.optimal_multiplier,
            self.conversion_probability,
            self.expected_profit,
            kind,
            self.adjustment_percentage(),
            self.adjustment_amount(),
            self.final_premium,
        );
        if self.used_fallback() {
            text.push_str(
                "\n- Note: no trained conversion model available; heuristic fallback used",
            );
        }
        text
    }
}

/// Searches the multiplier grid for the quote with the highest expected profit
///
/// Holds no per-request state, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct PriceOptimizer<M = ConversionEstimator> {
    config: OptimizerConfig,
    grid: MultiplierGrid,
    estimator: M,
}

impl<M: ConversionModel> PriceOptimizer<M> {
    /// Create an optimizer, failing fast on invalid configuration
    pub fn new(config: OptimizerConfig, estimator: M) -> Result<Self> {
        config.validate()?;
        let grid = MultiplierGrid::from_config(&config)?;
        Ok(Self {
            config,
            grid,
            estimator,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn grid(&self) -> &MultiplierGrid {
        &self.grid
    }

    pub fn estimator(&self) -> &M {
        &self.estimator
    }

    /// Evaluate every grid candidate in ascending order
    ///
    /// Returns the simulated competitor price together with the evaluations.
    pub fn evaluate_grid(
        &self,
        base_premium: f64,
        applicant: &ApplicantProfile,
    ) -> Result<(f64, Vec<CandidateEvaluation>)> {
        if !(base_premium.is_finite() && base_premium > 0.0) {
            return Err(PricingError::invalid(
                "base_premium",
                format!("must be positive and finite, got {}", base_premium),
            ));
        }

        let competitor_price = simulate_competitor_price(base_premium, self.config.competitor_band);
        let evaluations = self
            .grid
            .values()
            .iter()
            .map(|&m| self.evaluate_candidate(base_premium, m, competitor_price, applicant))
            .collect();

        Ok((competitor_price, evaluations))
    }

    fn evaluate_candidate(
        &self,
        base_premium: f64,
        multiplier: f64,
        competitor_price: f64,
        applicant: &ApplicantProfile,
    ) -> CandidateEvaluation {
        let quoted_premium = base_premium * multiplier;
        let price_difference = quoted_premium - competitor_price;

        let features = ConversionFeatures {
            price_difference,
            driver_age: applicant.driver_age,
            previous_accidents: applicant.previous_accidents,
        };
        let raw = self.estimator.predict(&features);
        let conversion_probability = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

        let profit_margin = quoted_premium - base_premium;
        let expected_profit = conversion_probability * profit_margin;

        trace!(
            "m={:.4} quote={:.2} diff={:.2} p={:.4} ev={:.4}",
            multiplier, quoted_premium, price_difference, conversion_probability, expected_profit
        );

        CandidateEvaluation {
            multiplier,
            quoted_premium,
            price_difference,
            conversion_probability,
            profit_margin,
            expected_profit,
        }
    }

    /// Find the expected-profit maximizing multiplier for one applicant
    pub fn optimize(
        &self,
        base_premium: f64,
        applicant: &ApplicantProfile,
    ) -> Result<OptimizationResult> {
        let (competitor_price, evaluations) = self.evaluate_grid(base_premium, applicant)?;

        let (optimal_multiplier, expected_profit, conversion_probability) =
            match select_optimal(&evaluations) {
                Some(best) => (best.multiplier, best.expected_profit, best.conversion_probability),
                // Unreachable with a non-empty grid; quote the base premium unchanged
                None => (NEUTRAL_MULTIPLIER, 0.0, 0.0),
            };

        let final_premium = round_currency_within(
            base_premium * optimal_multiplier,
            base_premium * self.grid.min(),
            base_premium * self.grid.max(),
        );

        debug!(
            "base={:.2} competitor={:.2} -> m={:.2} final={:.2} ev={:.2} ({})",
            base_premium,
            competitor_price,
            optimal_multiplier,
            final_premium,
            expected_profit,
            self.estimator.source().as_str()
        );

        Ok(OptimizationResult {
            base_premium,
            optimal_multiplier,
            final_premium,
            expected_profit,
            simulated_competitor_price: competitor_price,
            conversion_probability,
            estimator: self.estimator.source(),
            estimator_label: self.estimator.label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classifier, LogisticRegression, StandardScaler, TrainedClassifier};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn applicant() -> ApplicantProfile {
        ApplicantProfile::new(45.0, 1.0, 12.0)
    }

    fn fallback_optimizer() -> PriceOptimizer {
        PriceOptimizer::new(OptimizerConfig::default(), ConversionEstimator::default()).unwrap()
    }

    /// Conversion probability falls steeply as the quote rises above the competitor
    fn price_sensitive_estimator(slope: f64) -> ConversionEstimator {
        let model = TrainedClassifier::new(
            StandardScaler::identity(3),
            Classifier::Logistic(LogisticRegression::new(vec![-slope, 0.0, 0.0], 0.0)),
            3,
        )
        .unwrap();
        ConversionEstimator::Trained(model)
    }

    /// Test oracle answering from a table keyed by grid index
    struct TableModel {
        base_premium: f64,
        competitor_price: f64,
        min: f64,
        step: f64,
        probabilities: Vec<f64>,
    }

    impl ConversionModel for TableModel {
        fn predict(&self, features: &ConversionFeatures) -> f64 {
            let multiplier =
                (features.price_difference + self.competitor_price) / self.base_premium;
            let idx = ((multiplier - self.min) / self.step).round() as usize;
            self.probabilities[idx]
        }

        fn source(&self) -> EstimatorSource {
            EstimatorSource::Trained
        }
    }

    #[test]
    fn test_default_grid_endpoints_and_spacing() {
        let grid = MultiplierGrid::from_config(&OptimizerConfig::default()).unwrap();
        let values = grid.values();

        assert_eq!(values.len(), 21);
        assert_eq!(values[0], 0.90);
        assert_eq!(values[20], 1.10);
        for pair in values.windows(2) {
            assert_abs_diff_eq!(pair[1] - pair[0], 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_two_step_grid_is_just_the_endpoints() {
        let grid = MultiplierGrid::new(0.95, 1.05, 2).unwrap();
        assert_eq!(grid.values(), &[0.95, 1.05]);
    }

    #[test]
    fn test_config_validation() {
        let ok = OptimizerConfig::default();
        assert!(ok.validate().is_ok());

        let inverted = OptimizerConfig {
            min_multiplier: 1.1,
            max_multiplier: 0.9,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(PricingError::Configuration(_))));

        let equal = OptimizerConfig {
            min_multiplier: 1.0,
            max_multiplier: 1.0,
            ..Default::default()
        };
        assert!(equal.validate().is_err());

        let one_step = OptimizerConfig {
            grid_steps: 1,
            ..Default::default()
        };
        assert!(one_step.validate().is_err());

        let wide_band = OptimizerConfig {
            competitor_band: 1.5,
            ..Default::default()
        };
        assert!(wide_band.validate().is_err());

        assert!(PriceOptimizer::new(one_step, ConversionEstimator::default()).is_err());
    }

    #[test]
    fn test_oversized_grid_is_a_configuration_error() {
        let huge = OptimizerConfig {
            grid_steps: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(PricingError::Configuration(_))));
        assert!(matches!(
            MultiplierGrid::new(0.9, 1.1, usize::MAX),
            Err(PricingError::Configuration(_))
        ));

        let largest = MultiplierGrid::new(0.9, 1.1, MAX_GRID_STEPS).unwrap();
        assert_eq!(largest.len(), MAX_GRID_STEPS);
        assert_eq!(largest.max(), 1.1);
    }

    /// Records every feature vector it is asked about
    struct RecordingModel {
        seen: Mutex<Vec<ConversionFeatures>>,
    }

    impl ConversionModel for RecordingModel {
        fn predict(&self, features: &ConversionFeatures) -> f64 {
            self.seen.lock().unwrap().push(*features);
            0.5
        }

        fn source(&self) -> EstimatorSource {
            EstimatorSource::Trained
        }
    }

    #[test]
    fn test_applicant_attributes_reach_conversion_features() {
        let model = RecordingModel {
            seen: Mutex::new(Vec::new()),
        };
        let optimizer = PriceOptimizer::new(OptimizerConfig::default(), model).unwrap();
        let applicant = ApplicantProfile::new(61.0, 4.0, 12.0);
        let (competitor, evaluations) = optimizer.evaluate_grid(800.0, &applicant).unwrap();

        let seen = optimizer.estimator().seen.lock().unwrap();
        assert_eq!(seen.len(), evaluations.len());
        for (features, eval) in seen.iter().zip(&evaluations) {
            let row = features.as_array();
            assert_abs_diff_eq!(row[0], 800.0 * eval.multiplier - competitor, epsilon = 1e-9);
            assert_eq!(row[1], 61.0);
            assert_eq!(row[2], 4.0);
        }
    }

    #[test]
    fn test_age_weighted_model_sees_driver_age() {
        // Only the age slot carries weight, so older applicants convert more
        let model = TrainedClassifier::new(
            StandardScaler::identity(3),
            Classifier::Logistic(LogisticRegression::new(vec![0.0, 0.2, 0.0], -8.0)),
            3,
        )
        .unwrap();
        let optimizer =
            PriceOptimizer::new(OptimizerConfig::default(), ConversionEstimator::Trained(model))
                .unwrap();

        let young = optimizer
            .optimize(1000.0, &ApplicantProfile::new(20.0, 0.0, 10.0))
            .unwrap();
        let old = optimizer
            .optimize(1000.0, &ApplicantProfile::new(60.0, 0.0, 10.0))
            .unwrap();

        // sigmoid(-4) and sigmoid(4) at the 1.10 optimum
        assert_abs_diff_eq!(
            young.conversion_probability,
            1.0 / (1.0 + 4.0f64.exp()),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            old.conversion_probability,
            1.0 / (1.0 + (-4.0f64).exp()),
            epsilon = 1e-12
        );
        assert!(old.expected_profit > young.expected_profit);
    }

    #[test]
    fn test_seed_from_is_whole_cents() {
        assert_eq!(seed_from(1000.0), 100_000);
        assert_eq!(seed_from(1234.567), 123_456);
        assert_eq!(seed_from(0.0), 0);
        assert_eq!(seed_from(-5.0), 0);
    }

    #[test]
    fn test_competitor_price_is_reproducible_and_in_band() {
        let a = simulate_competitor_price(1000.0, 0.02);
        let b = simulate_competitor_price(1000.0, 0.02);
        assert_eq!(a, b);
        assert!((980.0..=1020.0).contains(&a));

        assert_eq!(simulate_competitor_price(812.5, 0.0), 812.5);
    }

    #[test]
    fn test_round_currency_within() {
        assert_eq!(round_currency_within(1100.0, 900.0, 1100.0), 1100.0);
        assert_eq!(round_currency_within(123.456, 100.0, 200.0), 123.46);
        // Rounding up would break the upper guardrail
        assert_eq!(round_currency_within(110.0051, 90.0, 110.0051), 110.0);
        // Rounding down would break the lower guardrail
        assert_eq!(round_currency_within(90.0041, 90.0041, 110.0), 90.01);
        // No whole cent inside the band
        assert_eq!(round_currency_within(0.0015, 0.0011, 0.0019), 0.0015);
    }

    #[test]
    fn test_end_to_end_fallback_scenario() {
        let optimizer = fallback_optimizer();
        let result = optimizer.optimize(1000.0, &applicant()).unwrap();

        // Every candidate priced below the competitor sits under 1.02 and earns at
        // most 0.02 * 1000 at P = 1; 1.10 earns 0.5 * 100 = 50 at P = 0.5.
        assert_eq!(result.optimal_multiplier, 1.10);
        assert_abs_diff_eq!(result.final_premium, 1100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.expected_profit, 50.0, epsilon = 1e-9);
        assert_eq!(result.conversion_probability, 0.5);
        assert!(result.used_fallback());
        assert!(result.explanation().contains("fallback"));
        assert!((900.0..=1100.0).contains(&result.final_premium));

        let again = optimizer.optimize(1000.0, &applicant()).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_fallback_law_probabilities() {
        let optimizer = fallback_optimizer();
        let (_, evaluations) = optimizer.evaluate_grid(1000.0, &applicant()).unwrap();

        for eval in &evaluations {
            let expected = if eval.price_difference < 0.0 { 1.0 } else { 0.5 };
            assert_eq!(eval.conversion_probability, expected);
            assert_abs_diff_eq!(
                eval.expected_profit,
                expected * (eval.quoted_premium - 1000.0),
                epsilon = 1e-9
            );
        }
        // Quotes under the 0.98 floor of the competitor band always undercut it
        assert_eq!(evaluations[0].conversion_probability, 1.0);
    }

    #[test]
    fn test_zero_band_fallback_prefers_highest_margin() {
        // Competitor equals base premium, so only m < 1 undercuts it and every
        // positive-margin candidate converts at 0.5
        let config = OptimizerConfig {
            competitor_band: 0.0,
            ..Default::default()
        };
        let optimizer = PriceOptimizer::new(config, ConversionEstimator::default()).unwrap();
        let result = optimizer.optimize(640.0, &applicant()).unwrap();

        assert_eq!(result.simulated_competitor_price, 640.0);
        assert_eq!(result.optimal_multiplier, 1.10);
        assert_abs_diff_eq!(result.final_premium, 704.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tie_break_prefers_first_multiplier() {
        // Grid 0.5, 0.625, ..., 1.5 and a power-of-two premium keep all products exact
        let config = OptimizerConfig {
            min_multiplier: 0.5,
            max_multiplier: 1.5,
            grid_steps: 9,
            ..Default::default()
        };
        let base = 1024.0;
        let competitor_price = simulate_competitor_price(base, config.competitor_band);

        // Margins: 1.125 -> 128, 1.25 -> 256, 1.375 -> 384, 1.5 -> 512
        let mut probabilities = vec![0.0; 9];
        probabilities[5] = 1.0; // 1.125: 128
        probabilities[6] = 0.25; // 1.25: 64
        probabilities[8] = 0.25; // 1.5: 128
        let model = TableModel {
            base_premium: base,
            competitor_price,
            min: 0.5,
            step: 0.125,
            probabilities,
        };

        let optimizer = PriceOptimizer::new(config, model).unwrap();
        let (_, evaluations) = optimizer.evaluate_grid(base, &applicant()).unwrap();
        assert_eq!(evaluations[5].expected_profit, 128.0);
        assert_eq!(evaluations[8].expected_profit, 128.0);

        let result = optimizer.optimize(base, &applicant()).unwrap();
        assert_eq!(result.optimal_multiplier, 1.125);
        assert_eq!(result.final_premium, 1152.0);
    }

    #[test]
    fn test_select_optimal_keeps_first_of_equal_maxima() {
        let eval = |multiplier: f64, expected_profit: f64| CandidateEvaluation {
            multiplier,
            quoted_premium: 0.0,
            price_difference: 0.0,
            conversion_probability: 0.0,
            profit_margin: 0.0,
            expected_profit,
        };
        let evaluations = [eval(0.9, -3.0), eval(1.0, 7.0), eval(1.05, 2.0), eval(1.1, 7.0)];
        assert_eq!(select_optimal(&evaluations).unwrap().multiplier, 1.0);
        assert!(select_optimal(&[]).is_none());
    }

    #[test]
    fn test_all_zero_probabilities_pick_lowest_multiplier() {
        let config = OptimizerConfig::default();
        let model = TableModel {
            base_premium: 500.0,
            competitor_price: simulate_competitor_price(500.0, config.competitor_band),
            min: 0.9,
            step: 0.01,
            probabilities: vec![0.0; 21],
        };
        let optimizer = PriceOptimizer::new(config, model).unwrap();
        let result = optimizer.optimize(500.0, &applicant()).unwrap();

        // Every expected profit is zero; the first candidate is kept
        assert_eq!(result.optimal_multiplier, 0.90);
        assert_eq!(result.expected_profit, 0.0);
    }

    #[test]
    fn test_price_sensitive_model_does_not_pick_max_multiplier() {
        let optimizer =
            PriceOptimizer::new(OptimizerConfig::default(), price_sensitive_estimator(0.1))
                .unwrap();
        let result = optimizer.optimize(1000.0, &applicant()).unwrap();

        assert!(result.optimal_multiplier < 1.10);
        assert!(result.optimal_multiplier >= 0.90);
        assert_eq!(result.estimator, EstimatorSource::Trained);
        assert!(!result.explanation().contains("fallback"));
    }

    #[test]
    fn test_invalid_base_premium_is_rejected() {
        let optimizer = fallback_optimizer();
        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = optimizer.optimize(bad, &applicant()).unwrap_err();
            assert!(matches!(err, PricingError::InvalidInput { field: "base_premium", .. }));
        }
    }

    #[test]
    fn test_negative_margin_is_computed_not_guarded() {
        let optimizer = fallback_optimizer();
        let (_, evaluations) = optimizer.evaluate_grid(750.0, &applicant()).unwrap();
        let first = evaluations[0];
        assert!(first.profit_margin < 0.0);
        assert!(first.expected_profit < 0.0);
    }

    proptest! {
        #[test]
        fn prop_final_premium_within_guardrails(base in 1.0f64..50_000.0, slope in 0.0f64..0.5) {
            let optimizer =
                PriceOptimizer::new(OptimizerConfig::default(), price_sensitive_estimator(slope))
                    .unwrap();
            let result = optimizer.optimize(base, &applicant()).unwrap();

            prop_assert!(result.optimal_multiplier >= 0.90 && result.optimal_multiplier <= 1.10);
            prop_assert!(result.final_premium >= 0.90 * base);
            prop_assert!(result.final_premium <= 1.10 * base);
        }

        #[test]
        fn prop_optimize_is_deterministic(
            base in 1.0f64..50_000.0,
            age in 18.0f64..90.0,
            accidents in 0u32..6,
        ) {
            let optimizer = fallback_optimizer();
            let profile = ApplicantProfile::new(age, accidents as f64, 12.0);
            let first = optimizer.optimize(base, &profile).unwrap();
            let second = optimizer.optimize(base, &profile).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
