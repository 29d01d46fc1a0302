//! Tabular estimators: tree ensembles and linear classifiers.
//!
//! These are the only variants the explainability stage can attribute, so
//! the tree walk exposes its decision path for closed-form attribution.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// A tabular estimator artifact.
///
/// Tagged by `kind` so artifacts are self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Estimator {
    /// Averaged ensemble of decision trees.
    Trees(TreeEnsemble),
    /// Logistic-style linear classifier.
    Linear(LinearModel),
}

impl Estimator {
    /// Validate shape invariants after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Trees(e) => e.validate(),
            Self::Linear(m) => m.validate(),
        }
    }

    /// Number of input features the estimator expects.
    pub fn num_features(&self) -> usize {
        match self {
            Self::Trees(e) => e.num_features,
            Self::Linear(m) => m.weights.len(),
        }
    }

    /// Classify one row to a 0/1 label.
    pub fn classify(&self, row: &[f64]) -> Result<u8, ModelError> {
        match self {
            Self::Trees(e) => Ok(u8::from(e.score(row)? > 0.5)),
            Self::Linear(m) => Ok(u8::from(m.probability(row)? > 0.5)),
        }
    }
}

/// Averaged ensemble of decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Expected input width; every split index must stay below this.
    pub num_features: usize,
    /// Member trees; the ensemble score is their mean.
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.root
                .check_feature_bounds(self.num_features)
                .map_err(|feature| {
                    format!("tree {i} splits on feature {feature} but num_features is {}", self.num_features)
                })?;
        }
        Ok(())
    }

    /// Mean score across member trees.
    pub fn score(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.num_features {
            return Err(ModelError::Prediction(format!(
                "row has {} features, ensemble expects {}",
                row.len(),
                self.num_features
            )));
        }
        let total: f64 = self.trees.iter().map(|t| t.root.score(row)).sum();
        Ok(total / self.trees.len() as f64)
    }
}

/// A single decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Root node.
    pub root: TreeNode,
}

/// A decision-tree node.
///
/// Untagged: a node with `feature`/`threshold`/children is a split, a node
/// with only `value` is a leaf. Split nodes also carry a `value` (the mean
/// prediction of the subtree) so attribution can read the value delta along
/// the decision path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split node.
    Split {
        /// Feature column index tested at this node.
        feature: usize,
        /// Rows with `row[feature] <= threshold` go left.
        threshold: f64,
        /// Mean prediction of this subtree (baseline for attribution).
        value: f64,
        /// Left child.
        left: Box<TreeNode>,
        /// Right child.
        right: Box<TreeNode>,
    },
    /// Terminal leaf.
    Leaf {
        /// Predicted value.
        value: f64,
    },
}

impl TreeNode {
    /// The node's value (leaf prediction or subtree mean).
    pub fn value(&self) -> f64 {
        match self {
            Self::Split { value, .. } | Self::Leaf { value } => *value,
        }
    }

    fn check_feature_bounds(&self, num_features: usize) -> Result<(), usize> {
        match self {
            Self::Leaf { .. } => Ok(()),
            Self::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= num_features {
                    return Err(*feature);
                }
                left.check_feature_bounds(num_features)?;
                right.check_feature_bounds(num_features)
            }
        }
    }

    /// Walk the tree for one row and return the leaf value.
    pub fn score(&self, row: &[f64]) -> f64 {
        match self {
            Self::Leaf { value } => *value,
            Self::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                if row[*feature] <= *threshold {
                    left.score(row)
                } else {
                    right.score(row)
                }
            }
        }
    }

    /// Walk the tree for one row, attributing the value change at each
    /// split to the feature tested there.
    ///
    /// `attribution` must have one slot per feature; the deltas along the
    /// decision path sum to `leaf value - root value`.
    pub fn attribute(&self, row: &[f64], attribution: &mut [f64]) -> f64 {
        match self {
            Self::Leaf { value } => *value,
            Self::Split {
                feature,
                threshold,
                value,
                left,
                right,
            } => {
                let child = if row[*feature] <= *threshold {
                    left
                } else {
                    right
                };
                attribution[*feature] += child.value() - *value;
                child.attribute(row, attribution)
            }
        }
    }
}

/// Logistic-style linear classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// One weight per feature.
    pub weights: Vec<f64>,
    /// Intercept term.
    pub bias: f64,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        if self.weights.is_empty() {
            return Err("linear model has no weights".to_string());
        }
        Ok(())
    }

    /// Sigmoid of the weighted sum.
    pub fn probability(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.weights.len() {
            return Err(ModelError::Prediction(format!(
                "row has {} features, model expects {}",
                row.len(),
                self.weights.len()
            )));
        }
        let z: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        Ok(sigmoid(z))
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            root: TreeNode::Split {
                feature,
                threshold,
                value: (low + high) / 2.0,
                left: Box::new(TreeNode::Leaf { value: low }),
                right: Box::new(TreeNode::Leaf { value: high }),
            },
        }
    }

    #[test]
    fn test_tree_walk() {
        let tree = stump(0, 0.5, 0.0, 1.0);
        assert_eq!(tree.root.score(&[0.2, 9.0]), 0.0);
        assert_eq!(tree.root.score(&[0.8, 9.0]), 1.0);
    }

    #[test]
    fn test_ensemble_mean() {
        let ensemble = TreeEnsemble {
            num_features: 1,
            trees: vec![stump(0, 0.5, 0.0, 1.0), stump(0, 0.5, 0.0, 0.5)],
        };
        assert_eq!(ensemble.score(&[0.9]).unwrap(), 0.75);
    }

    #[test]
    fn test_ensemble_rejects_out_of_bounds_split() {
        let ensemble = TreeEnsemble {
            num_features: 1,
            trees: vec![stump(3, 0.5, 0.0, 1.0)],
        };
        assert!(ensemble.validate().is_err());
    }

    #[test]
    fn test_ensemble_rejects_width_mismatch() {
        let ensemble = TreeEnsemble {
            num_features: 2,
            trees: vec![stump(0, 0.5, 0.0, 1.0)],
        };
        assert!(matches!(
            ensemble.score(&[1.0]),
            Err(ModelError::Prediction(_))
        ));
    }

    #[test]
    fn test_path_attribution_sums_to_leaf_minus_root() {
        let tree = DecisionTree {
            root: TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                value: 0.5,
                left: Box::new(TreeNode::Leaf { value: 0.1 }),
                right: Box::new(TreeNode::Split {
                    feature: 1,
                    threshold: 1.0,
                    value: 0.7,
                    left: Box::new(TreeNode::Leaf { value: 0.6 }),
                    right: Box::new(TreeNode::Leaf { value: 0.9 }),
                }),
            },
        };

        let row = [1.0, 2.0];
        let mut attribution = vec![0.0; 2];
        let leaf = tree.root.attribute(&row, &mut attribution);

        assert_eq!(leaf, 0.9);
        let total: f64 = attribution.iter().sum();
        assert!((total - (leaf - tree.root.value())).abs() < 1e-12);
        // Split on feature 0 moved 0.5 -> 0.7, feature 1 moved 0.7 -> 0.9.
        assert!((attribution[0] - 0.2).abs() < 1e-12);
        assert!((attribution[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_linear_probability() {
        let model = LinearModel {
            weights: vec![1.0, 1.0],
            bias: 0.0,
        };
        assert_eq!(model.probability(&[0.0, 0.0]).unwrap(), 0.5);
        assert!(model.probability(&[5.0, 5.0]).unwrap() > 0.99);
        assert!(model.probability(&[-5.0, -5.0]).unwrap() < 0.01);
    }

    #[test]
    fn test_estimator_artifact_round_trips() {
        let json = r#"{"kind": "trees", "model": {"num_features": 1, "trees": [
            {"root": {"feature": 0, "threshold": 0.5, "value": 0.5,
                      "left": {"value": 0.0}, "right": {"value": 1.0}}}
        ]}}"#;
        let estimator: Estimator = serde_json::from_str(json).unwrap();
        estimator.validate().unwrap();
        assert_eq!(estimator.classify(&[0.9]).unwrap(), 1);
        assert_eq!(estimator.classify(&[0.1]).unwrap(), 0);
    }
}
