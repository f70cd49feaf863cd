//! Engine configuration
//!
//! All options are fixed when the engines are constructed. Every field has a
//! default, so a JSON file only needs the values it overrides:
//!
//! ```json
//! {
//!   "optimizer": { "min_multiplier": 0.95, "grid_steps": 11 },
//!   "pricing": { "fixed_fee": 120.0 },
//!   "models": { "conversion_model": "models/rf_conversion_model.json" }
//! }
//! ```

use crate::error::Result;
use crate::market::OptimizerConfig;
use crate::pricing::PricingConfig;
use crate::risk::RiskConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the trained model artifacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub risk_model: Option<PathBuf>,
    pub conversion_model: Option<PathBuf>,
}

/// Configuration for the full pricing pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub optimizer: OptimizerConfig,
    pub risk: RiskConfig,
    pub pricing: PricingConfig,
    pub models: ModelPaths,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, returning the first configuration error
    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        self.risk.validate()?;
        self.pricing.validate()
    }

    pub fn with_risk_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.models.risk_model = Some(path.into());
        self
    }

    pub fn with_conversion_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.models.conversion_model = Some(path.into());
        self
    }
}
