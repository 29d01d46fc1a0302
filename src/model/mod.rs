//! Model adapters.
//!
//! Multi-framework loading is a closed tagged-variant problem: a fixed
//! enumeration of formats selected by file extension, with one fallback
//! loader for unrecognized extensions. Adding a framework means adding a
//! variant, not ad-hoc branching.
//!
//! All artifacts are JSON model definitions validated on load; prediction
//! semantics are variant-specific (direct classification for estimators,
//! forward pass plus a fixed 0.5 threshold for the network variants).

pub mod estimator;
pub mod network;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::dataset::{FeatureTable, PredictionSet};

pub use estimator::{DecisionTree, Estimator, LinearModel, TreeEnsemble, TreeNode};
pub use network::{Activation, CheckpointModel, DenseLayer, GraphModel, GraphOp, LayeredModel};

/// Decision threshold applied to probability-producing variants.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Error type for model loading and prediction.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The artifact path does not exist.
    #[error("Model file not found: {0}")]
    MissingFile(PathBuf),
    /// Extension unrecognized and the fallback loader failed.
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
    /// The artifact matched a format but failed to parse or validate.
    #[error("Invalid {format} artifact {path}: {reason}")]
    InvalidArtifact {
        /// Format the artifact claimed.
        format: ModelFormat,
        /// Artifact path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
    /// Prediction-time shape disagreement.
    #[error("Prediction failed: {0}")]
    Prediction(String),
    /// Underlying I/O failure.
    #[error("I/O error reading model: {0}")]
    Io(#[from] std::io::Error),
}

/// Closed set of supported model artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Tabular estimator: tree ensemble or linear classifier.
    Estimator,
    /// Raw dense-layer weight checkpoint.
    Checkpoint,
    /// Layered archive with explicit activations.
    Layered,
    /// Portable named-input inference graph.
    Graph,
}

impl ModelFormat {
    /// Select a format from a file extension, if recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "est" | "estimator" => Some(Self::Estimator),
            "ckpt" => Some(Self::Checkpoint),
            "layers" => Some(Self::Layered),
            "graph" => Some(Self::Graph),
            _ => None,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimator => write!(f, "estimator"),
            Self::Checkpoint => write!(f, "checkpoint"),
            Self::Layered => write!(f, "layered"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// A loaded model with its format tag.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    format: ModelFormat,
    kind: ModelKind,
}

#[derive(Debug, Clone)]
enum ModelKind {
    Estimator(Estimator),
    Checkpoint(CheckpointModel),
    Layered(LayeredModel),
    Graph(GraphModel),
}

impl LoadedModel {
    /// The format this model was loaded as.
    pub fn format(&self) -> ModelFormat {
        self.format
    }

    /// The estimator, when this is the tabular-estimator variant.
    /// The explainability stage only attributes estimators.
    pub fn as_estimator(&self) -> Option<&Estimator> {
        match &self.kind {
            ModelKind::Estimator(e) => Some(e),
            _ => None,
        }
    }

    /// Predict a label per row of the feature table.
    ///
    /// Estimators classify directly; the network variants run a forward
    /// pass and threshold the resulting probability at
    /// [`DECISION_THRESHOLD`].
    pub fn predict(&self, features: &FeatureTable) -> Result<PredictionSet, ModelError> {
        let mut labels = Vec::with_capacity(features.num_rows());
        for row in features.rows() {
            let label = match &self.kind {
                ModelKind::Estimator(e) => e.classify(row)?,
                ModelKind::Checkpoint(m) => threshold(m.forward(row)?),
                ModelKind::Layered(m) => threshold(m.forward(row)?),
                ModelKind::Graph(m) => threshold(m.execute(row)?),
            };
            labels.push(label);
        }
        Ok(PredictionSet::new(labels))
    }
}

fn threshold(probability: f64) -> u8 {
    u8::from(probability > DECISION_THRESHOLD)
}

/// Load a model artifact, selecting the adapter by file extension.
///
/// An unrecognized extension falls back to the estimator loader; if that
/// also fails the artifact is unsupported. A missing file is reported
/// before any parse attempt.
pub fn load_model(path: &Path) -> Result<LoadedModel, ModelError> {
    if !path.exists() {
        return Err(ModelError::MissingFile(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ModelFormat::from_extension(ext) {
        Some(format) => {
            tracing::debug!(path = %path.display(), %format, "loading model");
            load_as(path, format)
        }
        None => {
            // Unknown extension: one fallback attempt with the default
            // (estimator) loader before giving up.
            tracing::debug!(path = %path.display(), ext, "unrecognized extension, trying estimator fallback");
            load_as(path, ModelFormat::Estimator)
                .map_err(|_| ModelError::UnsupportedFormat(path.to_path_buf()))
        }
    }
}

fn load_as(path: &Path, format: ModelFormat) -> Result<LoadedModel, ModelError> {
    let kind = match format {
        ModelFormat::Estimator => {
            let estimator: Estimator = parse_artifact(path, format)?;
            estimator.validate().map_err(|reason| invalid(path, format, reason))?;
            ModelKind::Estimator(estimator)
        }
        ModelFormat::Checkpoint => {
            let model: CheckpointModel = parse_artifact(path, format)?;
            model.validate().map_err(|reason| invalid(path, format, reason))?;
            ModelKind::Checkpoint(model)
        }
        ModelFormat::Layered => {
            let model: LayeredModel = parse_artifact(path, format)?;
            model.validate().map_err(|reason| invalid(path, format, reason))?;
            ModelKind::Layered(model)
        }
        ModelFormat::Graph => {
            let model: GraphModel = parse_artifact(path, format)?;
            model.validate().map_err(|reason| invalid(path, format, reason))?;
            ModelKind::Graph(model)
        }
    };
    Ok(LoadedModel { format, kind })
}

fn parse_artifact<T: DeserializeOwned>(path: &Path, format: ModelFormat) -> Result<T, ModelError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| invalid(path, format, e.to_string()))
}

fn invalid(path: &Path, format: ModelFormat, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidArtifact {
        format,
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
