//! Trained classifier artifacts shared by the risk and market engines

mod scaler;
mod classifier;
pub mod artifact;

pub use scaler::StandardScaler;
pub use classifier::{Classifier, DecisionTree, LogisticRegression, RandomForest, TreeNode};
pub use artifact::{
    load_classifier, load_or_warn, ArtifactKind, EstimatorSource, MissingModelWarning,
    ModelArtifact, TrainedClassifier, CONVERSION_FEATURES, RISK_FEATURES,
};
