//! Trained model artifacts
//!
//! Artifacts are JSON exports of a fitted scaler and classifier. A model that
//! cannot be loaded is never fatal: callers receive a [`MissingModelWarning`]
//! and switch to their documented fallback.

use super::{Classifier, StandardScaler};
use crate::error::PricingError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Feature order the risk classifier was trained on
pub const RISK_FEATURES: [&str; 3] = [
    "Driver Age",
    "Previous Accidents",
    "Annual Mileage (x1000 km)",
];

/// Feature order the conversion classifier was trained on
pub const CONVERSION_FEATURES: [&str; 3] = ["Price_Difference", "Driver Age", "Previous Accidents"];

/// Which engine an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Risk,
    Conversion,
}

impl ArtifactKind {
    pub fn expected_features(&self) -> &'static [&'static str; 3] {
        match self {
            ArtifactKind::Risk => &RISK_FEATURES,
            ArtifactKind::Conversion => &CONVERSION_FEATURES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Risk => "risk classifier",
            ArtifactKind::Conversion => "conversion classifier",
        }
    }
}

/// Which path produced a model output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorSource {
    /// Trained statistical classifier
    Trained,
    /// Heuristic used because no trained classifier is available
    Fallback,
}

impl EstimatorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorSource::Trained => "trained model",
            EstimatorSource::Fallback => "fallback rule",
        }
    }
}

/// On-disk artifact layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: Classifier,
}

/// A validated scaler + classifier pair
///
/// Stateless: prediction only reads the fitted parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedClassifier {
    scaler: StandardScaler,
    classifier: Classifier,
}

impl TrainedClassifier {
    /// Pair a scaler with a classifier, checking both accept `n_features` inputs
    pub fn new(
        scaler: StandardScaler,
        classifier: Classifier,
        n_features: usize,
    ) -> Result<Self, String> {
        scaler.validate()?;
        if scaler.n_features() != n_features {
            return Err(format!(
                "scaler expects {} features, model needs {}",
                scaler.n_features(),
                n_features
            ));
        }
        classifier.validate(n_features)?;
        Ok(Self { scaler, classifier })
    }

    /// Validate a deserialized artifact against the feature contract of `kind`
    pub fn from_artifact(artifact: ModelArtifact, kind: ArtifactKind) -> Result<Self, String> {
        let expected = kind.expected_features();
        if artifact.features.len() != expected.len()
            || artifact.features.iter().zip(expected.iter()).any(|(a, e)| a != e)
        {
            return Err(format!(
                "{} features {:?} do not match expected {:?}",
                kind.as_str(),
                artifact.features,
                expected
            ));
        }
        Self::new(artifact.scaler, artifact.classifier, expected.len())
    }

    /// Positive-class probability for a raw (unscaled) feature vector
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let scaled = self.scaler.transform(features);
        self.classifier.predict_proba(&scaled)
    }

    pub fn name(&self) -> &'static str {
        self.classifier.name()
    }
}

/// Advisory raised when a trained artifact could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingModelWarning {
    pub artifact: ArtifactKind,
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl fmt::Display for MissingModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "{} not loaded from {}: {}; using fallback",
                self.artifact.as_str(),
                path.display(),
                self.reason
            ),
            None => write!(f, "{} not configured; using fallback", self.artifact.as_str()),
        }
    }
}

/// Read and validate an artifact file
pub fn load_classifier(path: &Path, kind: ArtifactKind) -> Result<TrainedClassifier, PricingError> {
    let contents = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&contents)?;
    TrainedClassifier::from_artifact(artifact, kind)
        .map_err(|reason| PricingError::Configuration(format!("{}: {}", path.display(), reason)))
}

/// Load an artifact if one is configured, converting every failure into a warning
pub fn load_or_warn(
    path: Option<&Path>,
    kind: ArtifactKind,
) -> Result<TrainedClassifier, MissingModelWarning> {
    let Some(path) = path else {
        let warning = MissingModelWarning {
            artifact: kind,
            path: None,
            reason: "no artifact path configured".to_string(),
        };
        warn!("{}", warning);
        return Err(warning);
    };

    info!("Loading {} from {}", kind.as_str(), path.display());
    match load_classifier(path, kind) {
        Ok(model) => {
            info!("{} loaded ({})", kind.as_str(), model.name());
            Ok(model)
        }
        Err(e) => {
            let warning = MissingModelWarning {
                artifact: kind,
                path: Some(path.to_path_buf()),
                reason: e.to_string(),
            };
            warn!("{}", warning);
            Err(warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogisticRegression;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("premium_optimizer_{}_{}.json", name, std::process::id()))
    }

    fn conversion_artifact_json() -> String {
        r#"{
            "features": ["Price_Difference", "Driver Age", "Previous Accidents"],
            "scaler": {"mean": [0.0, 40.0, 1.0], "scale": [25.0, 12.0, 1.0]},
            "classifier": {"kind": "logistic", "coefficients": [-1.5, 0.1, -0.2], "intercept": 0.3}
        }"#
        .to_string()
    }

    #[test]
    fn test_load_valid_artifact() {
        let path = temp_path("conversion_ok");
        std::fs::write(&path, conversion_artifact_json()).unwrap();

        let model = load_or_warn(Some(&path), ArtifactKind::Conversion);
        std::fs::remove_file(&path).ok();

        let model = model.expect("artifact should load");
        let p = model.predict_proba(&[0.0, 40.0, 1.0]);
        assert!((p - 1.0 / (1.0 + (-0.3f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_becomes_warning() {
        let path = temp_path("does_not_exist");
        let warning = load_or_warn(Some(&path), ArtifactKind::Risk).unwrap_err();
        assert_eq!(warning.artifact, ArtifactKind::Risk);
        assert_eq!(warning.path.as_deref(), Some(path.as_path()));
        assert!(warning.to_string().contains("using fallback"));
    }

    #[test]
    fn test_unconfigured_path_becomes_warning() {
        let warning = load_or_warn(None, ArtifactKind::Conversion).unwrap_err();
        assert!(warning.path.is_none());
    }

    #[test]
    fn test_feature_order_mismatch_is_rejected() {
        // A risk artifact wired into the conversion slot
        let artifact = ModelArtifact {
            features: RISK_FEATURES.iter().map(|s| s.to_string()).collect(),
            scaler: StandardScaler::identity(3),
            classifier: Classifier::Logistic(LogisticRegression::new(vec![0.0; 3], 0.0)),
        };
        assert!(
            TrainedClassifier::from_artifact(artifact.clone(), ArtifactKind::Conversion).is_err()
        );
        assert!(TrainedClassifier::from_artifact(artifact, ArtifactKind::Risk).is_ok());
    }

    #[test]
    fn test_malformed_json_becomes_warning() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        let result = load_or_warn(Some(&path), ArtifactKind::Conversion);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_scaler_dimension_mismatch() {
        let result = TrainedClassifier::new(
            StandardScaler::identity(2),
            Classifier::Logistic(LogisticRegression::new(vec![0.0; 3], 0.0)),
            3,
        );
        assert!(result.is_err());
    }
}
