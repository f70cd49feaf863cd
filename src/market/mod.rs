//! Market-driven price optimization
//!
//! The optimizer searches a bounded multiplier grid around the actuarial base
//! premium, using a conversion model as an oracle for each candidate quote.

mod conversion;
mod optimizer;

pub use crate::models::EstimatorSource;

pub use conversion::{ConversionEstimator, ConversionFeatures, ConversionModel, FallbackRule};
pub use optimizer::{
    round_currency_within, seed_from, select_optimal, simulate_competitor_price,
    CandidateEvaluation, MultiplierGrid, OptimizationResult, OptimizerConfig, PriceOptimizer,
    DEFAULT_COMPETITOR_BAND, DEFAULT_GRID_STEPS, DEFAULT_MAX_MULTIPLIER, DEFAULT_MIN_MULTIPLIER,
    MAX_GRID_STEPS,
};
