//! Binary classifiers evaluated on standardized features
//!
//! Both variants return the positive-class probability, mirroring
//! `predict_proba(x)[1]` of the models they were exported from.

use serde::{Deserialize, Serialize};

/// Logistic regression (GLM with logit link)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let linear: f64 = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid(linear)
    }
}

fn sigmoid(z: f64) -> f64 {
    // Split by sign so exp() never overflows
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// A node of an exported decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Positive-class fraction of the training samples reaching this leaf
    Leaf { probability: f64 },
}

/// Flattened decision tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Children must sit after their parent, so every walk reaches a leaf
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("decision tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but only {} features exist",
                            idx, feature, n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", idx));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child index {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(format!(
                            "leaf {} probability {} outside [0, 1]",
                            idx, probability
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { probability } => return probability,
            }
        }
    }
}

/// Random forest: mean of the trees' leaf probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(trees: Vec<DecisionTree>) -> Self {
        Self { trees }
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        total / self.trees.len() as f64
    }
}

/// Classifier families that can be loaded from a model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticRegression),
    RandomForest(RandomForest),
}

impl Classifier {
    /// Check the classifier is consistent with `n_features` inputs
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            Classifier::Logistic(model) => {
                if model.coefficients.len() != n_features {
                    return Err(format!(
                        "logistic model has {} coefficients for {} features",
                        model.coefficients.len(),
                        n_features
                    ));
                }
                if !model.intercept.is_finite()
                    || model.coefficients.iter().any(|c| !c.is_finite())
                {
                    return Err("logistic model parameters must be finite".to_string());
                }
                Ok(())
            }
            Classifier::RandomForest(forest) => {
                if forest.trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in forest.trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|e| format!("tree {}: {}", i, e))?;
                }
                Ok(())
            }
        }
    }

    /// Positive-class probability for already-standardized features
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        match self {
            Classifier::Logistic(model) => model.predict_proba(features),
            Classifier::RandomForest(forest) => forest.predict_proba(features),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Logistic(_) => "Logistic Regression (GLM)",
            Classifier::RandomForest(_) => "Random Forest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree::new(vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { probability: low },
            TreeNode::Leaf { probability: high },
        ])
    }

    #[test]
    fn test_logistic_probability() {
        let model = LogisticRegression::new(vec![0.0, 0.0], 0.0);
        assert_relative_eq!(model.predict_proba(&[3.0, -1.0]), 0.5);

        let model = LogisticRegression::new(vec![1.0, 2.0], -1.0);
        // z = -1 + 1 + 2 = 2
        assert_relative_eq!(model.predict_proba(&[1.0, 1.0]), 1.0 / (1.0 + (-2.0f64).exp()));
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn test_tree_goes_left_on_equal_threshold() {
        let forest = RandomForest::new(vec![stump(0, 0.5, 0.2, 0.9)]);
        assert_eq!(forest.predict_proba(&[0.5]), 0.2);
        assert_eq!(forest.predict_proba(&[0.6]), 0.9);
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest::new(vec![stump(0, 0.0, 0.2, 0.8), stump(1, 0.0, 0.4, 1.0)]);
        assert_relative_eq!(forest.predict_proba(&[-1.0, 1.0]), (0.2 + 1.0) / 2.0);
        assert_relative_eq!(forest.predict_proba(&[1.0, -1.0]), (0.8 + 0.4) / 2.0);
    }

    #[test]
    fn test_validation() {
        let logistic = Classifier::Logistic(LogisticRegression::new(vec![1.0, 2.0], 0.0));
        assert!(logistic.validate(2).is_ok());
        assert!(logistic.validate(3).is_err());

        let forest = Classifier::RandomForest(RandomForest::new(vec![stump(2, 0.0, 0.1, 0.9)]));
        assert!(forest.validate(3).is_ok());
        assert!(forest.validate(2).is_err());

        // A child pointing back at its parent would loop forever
        let cyclic = Classifier::RandomForest(RandomForest::new(vec![DecisionTree::new(vec![
            TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 1,
            },
            TreeNode::Leaf { probability: 0.5 },
        ])]));
        assert!(cyclic.validate(1).is_err());

        let empty = Classifier::RandomForest(RandomForest::new(vec![]));
        assert!(empty.validate(1).is_err());
    }

    #[test]
    fn test_deserialize_tagged_nodes() {
        let json = r#"{
            "kind": "random_forest",
            "trees": [{"nodes": [
                {"type": "split", "feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"type": "leaf", "probability": 0.25},
                {"type": "leaf", "probability": 0.75}
            ]}]
        }"#;
        let classifier: Classifier = serde_json::from_str(json).unwrap();
        assert!(classifier.validate(1).is_ok());
        assert_eq!(classifier.predict_proba(&[2.0]), 0.75);
        assert_eq!(classifier.name(), "Random Forest");
    }
}
