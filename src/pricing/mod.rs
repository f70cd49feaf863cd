//! Base premium calculation

mod calculator;

pub use calculator::{PricingBreakdown, PricingCalculator, PricingConfig};
