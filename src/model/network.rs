//! Network-style model variants.
//!
//! Three artifact shapes share the same prediction contract (forward pass
//! producing one probability in [0, 1]) but differ in how much structure
//! the artifact carries:
//!
//! - [`CheckpointModel`]: raw dense-layer weights, fixed activation scheme
//!   (ReLU hidden, sigmoid output)
//! - [`LayeredModel`]: layers with explicit per-layer activations
//! - [`GraphModel`]: a named-input op graph executed in declaration order
//!
//! None of these expose per-feature structure the attribution stage can
//! use, so explainability treats them as opaque.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::estimator::sigmoid;
use super::ModelError;

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// A dense layer: `output[j] = sum_i(input[i] * weights[i][j]) + biases[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Row-major weights, one row per input unit.
    pub weights: Vec<Vec<f64>>,
    /// One bias per output unit.
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn validate(&self, index: usize) -> Result<(), String> {
        if self.weights.is_empty() {
            return Err(format!("layer {index} has no weights"));
        }
        let width = self.biases.len();
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "layer {index} weight row {i} has width {}, biases have width {width}",
                    row.len()
                ));
            }
        }
        Ok(())
    }

    fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        if input.len() != self.weights.len() {
            return Err(ModelError::Prediction(format!(
                "layer expects {} inputs, got {}",
                self.weights.len(),
                input.len()
            )));
        }
        let mut output = self.biases.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            for (o, w) in output.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        Ok(output)
    }
}

/// Raw weight checkpoint: dense layers with a fixed activation scheme.
///
/// Hidden layers use ReLU; the final layer must have width 1 and is passed
/// through sigmoid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointModel {
    /// Dense layers applied in order.
    pub layers: Vec<DenseLayer>,
}

impl CheckpointModel {
    /// Validate shape invariants after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("checkpoint has no layers".to_string());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate(i)?;
        }
        let last = self.layers.last().expect("checked non-empty");
        if last.biases.len() != 1 {
            return Err(format!(
                "final layer must have width 1, has {}",
                last.biases.len()
            ));
        }
        Ok(())
    }

    /// Forward pass producing one probability.
    pub fn forward(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut current = row.to_vec();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.apply(&current)?;
            if i < last {
                for v in &mut current {
                    *v = relu(*v);
                }
            }
        }
        Ok(sigmoid(current[0]))
    }
}

/// Per-layer activation for layered archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Rectified linear unit.
    Relu,
    /// Logistic sigmoid.
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
    /// Identity.
    Linear,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => relu(x),
            Self::Sigmoid => sigmoid(x),
            Self::Tanh => x.tanh(),
            Self::Linear => x,
        }
    }
}

/// One layer of a layered archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivatedLayer {
    /// Dense weights and biases.
    #[serde(flatten)]
    pub dense: DenseLayer,
    /// Activation applied to this layer's output.
    pub activation: Activation,
}

/// Layered archive: dense layers with explicit activations.
///
/// The final layer must have width 1; its output is clamped to [0, 1] so
/// an artifact ending in a `linear` activation still yields a probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredModel {
    /// Layers applied in order.
    pub layers: Vec<ActivatedLayer>,
}

impl LayeredModel {
    /// Validate shape invariants after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("archive has no layers".to_string());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.dense.validate(i)?;
        }
        let last = self.layers.last().expect("checked non-empty");
        if last.dense.biases.len() != 1 {
            return Err(format!(
                "final layer must have width 1, has {}",
                last.dense.biases.len()
            ));
        }
        Ok(())
    }

    /// Forward pass producing one probability.
    pub fn forward(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut current = row.to_vec();
        for layer in &self.layers {
            current = layer.dense.apply(&current)?;
            for v in &mut current {
                *v = layer.activation.apply(*v);
            }
        }
        Ok(current[0].clamp(0.0, 1.0))
    }
}

/// One operation in an inference graph.
///
/// Ops read named values and write their `output` name. The feature row is
/// bound to the name `input` before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphOp {
    /// Dense layer over a named vector.
    Dense {
        /// Value name to read.
        input: String,
        /// Value name to write.
        output: String,
        /// Weights and biases.
        #[serde(flatten)]
        layer: DenseLayer,
    },
    /// Elementwise activation over a named vector.
    Activate {
        /// Value name to read.
        input: String,
        /// Value name to write.
        output: String,
        /// Activation applied elementwise.
        activation: Activation,
    },
}

impl GraphOp {
    fn input(&self) -> &str {
        match self {
            Self::Dense { input, .. } | Self::Activate { input, .. } => input,
        }
    }

    fn output(&self) -> &str {
        match self {
            Self::Dense { output, .. } | Self::Activate { output, .. } => output,
        }
    }
}

/// Portable inference graph with named intermediate values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphModel {
    /// Ops executed in declaration order.
    pub ops: Vec<GraphOp>,
    /// Name of the value holding the final probability (width 1).
    pub output: String,
}

impl GraphModel {
    /// Validate that every op's input is defined by the feature row or an
    /// earlier op, and that the declared output is produced.
    pub fn validate(&self) -> Result<(), String> {
        if self.ops.is_empty() {
            return Err("graph has no ops".to_string());
        }
        let mut defined: Vec<&str> = vec!["input"];
        for (i, op) in self.ops.iter().enumerate() {
            if !defined.contains(&op.input()) {
                return Err(format!("op {i} reads undefined value '{}'", op.input()));
            }
            if let GraphOp::Dense { layer, .. } = op {
                layer.validate(i)?;
            }
            defined.push(op.output());
        }
        if !defined.contains(&self.output.as_str()) {
            return Err(format!("graph output '{}' is never produced", self.output));
        }
        Ok(())
    }

    /// Execute the graph for one row and return the output probability.
    pub fn execute(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut values: HashMap<&str, Vec<f64>> = HashMap::new();
        values.insert("input", row.to_vec());

        for op in &self.ops {
            let input = values
                .get(op.input())
                .ok_or_else(|| {
                    ModelError::Prediction(format!("undefined graph value '{}'", op.input()))
                })?
                .clone();
            let result = match op {
                GraphOp::Dense { layer, .. } => layer.apply(&input)?,
                GraphOp::Activate { activation, .. } => {
                    input.iter().map(|&x| activation.apply(x)).collect()
                }
            };
            values.insert(op.output(), result);
        }

        let out = values.get(self.output.as_str()).ok_or_else(|| {
            ModelError::Prediction(format!("graph output '{}' missing", self.output))
        })?;
        if out.len() != 1 {
            return Err(ModelError::Prediction(format!(
                "graph output has width {}, expected 1",
                out.len()
            )));
        }
        Ok(out[0].clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_to_scalar(weight: f64, bias: f64) -> DenseLayer {
        DenseLayer {
            weights: vec![vec![weight]],
            biases: vec![bias],
        }
    }

    #[test]
    fn test_checkpoint_forward_relu_then_sigmoid() {
        let model = CheckpointModel {
            layers: vec![identity_to_scalar(1.0, 0.0), identity_to_scalar(1.0, 0.0)],
        };
        model.validate().unwrap();

        // Negative input dies in the hidden ReLU; sigmoid(0) = 0.5.
        assert_eq!(model.forward(&[-3.0]).unwrap(), 0.5);
        assert!(model.forward(&[3.0]).unwrap() > 0.9);
    }

    #[test]
    fn test_checkpoint_rejects_wide_output() {
        let model = CheckpointModel {
            layers: vec![DenseLayer {
                weights: vec![vec![1.0, 1.0]],
                biases: vec![0.0, 0.0],
            }],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_layered_explicit_activations() {
        let model = LayeredModel {
            layers: vec![ActivatedLayer {
                dense: identity_to_scalar(1.0, 0.0),
                activation: Activation::Sigmoid,
            }],
        };
        model.validate().unwrap();
        assert_eq!(model.forward(&[0.0]).unwrap(), 0.5);
    }

    #[test]
    fn test_layered_linear_output_is_clamped() {
        let model = LayeredModel {
            layers: vec![ActivatedLayer {
                dense: identity_to_scalar(10.0, 0.0),
                activation: Activation::Linear,
            }],
        };
        assert_eq!(model.forward(&[5.0]).unwrap(), 1.0);
        assert_eq!(model.forward(&[-5.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_graph_execution() {
        let model = GraphModel {
            ops: vec![
                GraphOp::Dense {
                    input: "input".to_string(),
                    output: "h".to_string(),
                    layer: identity_to_scalar(2.0, 0.0),
                },
                GraphOp::Activate {
                    input: "h".to_string(),
                    output: "p".to_string(),
                    activation: Activation::Sigmoid,
                },
            ],
            output: "p".to_string(),
        };
        model.validate().unwrap();
        assert_eq!(model.execute(&[0.0]).unwrap(), 0.5);
        assert!(model.execute(&[2.0]).unwrap() > 0.9);
    }

    #[test]
    fn test_graph_rejects_undefined_input() {
        let model = GraphModel {
            ops: vec![GraphOp::Activate {
                input: "missing".to_string(),
                output: "p".to_string(),
                activation: Activation::Relu,
            }],
            output: "p".to_string(),
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_graph_rejects_unproduced_output() {
        let model = GraphModel {
            ops: vec![GraphOp::Activate {
                input: "input".to_string(),
                output: "h".to_string(),
                activation: Activation::Relu,
            }],
            output: "p".to_string(),
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_checkpoint_artifact_parses() {
        let json = r#"{"layers": [
            {"weights": [[0.5], [0.5]], "biases": [0.1]}
        ]}"#;
        let model: CheckpointModel = serde_json::from_str(json).unwrap();
        model.validate().unwrap();
        assert!(model.forward(&[1.0, 1.0]).unwrap() > 0.5);
    }
}
