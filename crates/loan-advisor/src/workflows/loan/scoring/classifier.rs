use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::encoder::{Feature, FeatureVector, FEATURE_COUNT};
use super::standardizer::{ParameterError, StandardizationParameters};

/// Fitted binary classifier. Input is an encoded, standardized vector in
/// canonical order; output is `1` (approve) or `0` (reject).
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> u8;
}

/// Serialized classifier families the artifact bundle can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// Raw decision function, e.g. a linear SVM.
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    DecisionTree(DecisionTree),
    RandomForest {
        trees: Vec<DecisionTree>,
    },
}

fn default_threshold() -> f64 {
    0.5
}

/// Flattened tree in the layout scikit-learn exports: parallel node arrays,
/// `children_left[i] == -1` marks a leaf whose `value[i]` is the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<u8>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    fn predict(&self, features: &FeatureVector) -> u8 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }

    /// Children must point strictly forward so traversal always terminates.
    fn validate(&self) -> Result<(), ModelShapeError> {
        let nodes = self.children_left.len();
        if nodes == 0
            || self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(ModelShapeError::RaggedTree);
        }

        for node in 0..nodes {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left == LEAF {
                continue;
            }
            let in_range = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_range(left) || !in_range(right) {
                return Err(ModelShapeError::InvalidChild { node });
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(ModelShapeError::FeatureOutOfRange {
                    index: feature,
                    features: FEATURE_COUNT,
                });
            }
        }
        Ok(())
    }
}

fn dot(coefficients: &[f64], features: &FeatureVector) -> f64 {
    coefficients
        .iter()
        .zip(features.as_slice())
        .map(|(weight, value)| weight * value)
        .sum()
}

impl ClassifierModel {
    pub const fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::LogisticRegression { .. } => "logistic_regression",
            ClassifierModel::Linear { .. } => "linear",
            ClassifierModel::DecisionTree(_) => "decision_tree",
            ClassifierModel::RandomForest { .. } => "random_forest",
        }
    }

    pub fn validate(&self) -> Result<(), ModelShapeError> {
        match self {
            ClassifierModel::LogisticRegression { coefficients, .. }
            | ClassifierModel::Linear { coefficients, .. } => {
                if coefficients.len() == FEATURE_COUNT {
                    Ok(())
                } else {
                    Err(ModelShapeError::CoefficientCount {
                        expected: FEATURE_COUNT,
                        found: coefficients.len(),
                    })
                }
            }
            ClassifierModel::DecisionTree(tree) => tree.validate(),
            ClassifierModel::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelShapeError::EmptyForest);
                }
                trees.iter().try_for_each(DecisionTree::validate)
            }
        }
    }
}

impl Classifier for ClassifierModel {
    fn predict(&self, features: &FeatureVector) -> u8 {
        match self {
            ClassifierModel::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => {
                let margin = dot(coefficients, features) + intercept;
                let probability = 1.0 / (1.0 + (-margin).exp());
                u8::from(probability >= *threshold)
            }
            ClassifierModel::Linear {
                coefficients,
                intercept,
            } => u8::from(dot(coefficients, features) + intercept > 0.0),
            ClassifierModel::DecisionTree(tree) => tree.predict(features),
            ClassifierModel::RandomForest { trees } => {
                let approvals = trees
                    .iter()
                    .filter(|tree| tree.predict(features) == 1)
                    .count();
                u8::from(approvals * 2 >= trees.len())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelShapeError {
    #[error("model expects {expected} coefficients, found {found}")]
    CoefficientCount { expected: usize, found: usize },
    #[error("decision tree node arrays differ in length or are empty")]
    RaggedTree,
    #[error("decision tree node {node} points to an invalid child")]
    InvalidChild { node: usize },
    #[error("split feature {index} outside the {features} model inputs")]
    FeatureOutOfRange { index: i64, features: usize },
    #[error("random forest has no trees")]
    EmptyForest,
}

/// On-disk bundle: the classifier plus the scaler it was trained behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub model: ClassifierModel,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl ArtifactBundle {
    /// Bundle with the canonical feature order filled in.
    pub fn new(model: ClassifierModel, parameters: StandardizationParameters) -> Self {
        Self {
            model,
            scaler_mean: parameters.center,
            scaler_scale: parameters.scale,
            feature_names: canonical_feature_names(),
        }
    }
}

pub fn canonical_feature_names() -> Vec<String> {
    Feature::ORDERED
        .iter()
        .map(|feature| feature.training_column().to_string())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("unable to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model artifact: {0}")]
    Format(#[from] serde_json::Error),
    #[error("artifact feature order {found:?} does not match the encoder")]
    FeatureOrder { found: Vec<String> },
    #[error("invalid standardization parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("invalid classifier: {0}")]
    InvalidModel(#[from] ModelShapeError),
}

/// A classifier together with the scaling it expects, shared read-only.
#[derive(Clone)]
pub struct LoadedModel {
    classifier: Arc<dyn Classifier>,
    parameters: Arc<StandardizationParameters>,
    kind: &'static str,
}

impl LoadedModel {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        parameters: StandardizationParameters,
        kind: &'static str,
    ) -> Result<Self, ParameterError> {
        parameters.validate()?;
        Ok(Self {
            classifier,
            parameters: Arc::new(parameters),
            kind,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ArtifactError> {
        if bundle.feature_names != canonical_feature_names() {
            return Err(ArtifactError::FeatureOrder {
                found: bundle.feature_names,
            });
        }
        bundle.model.validate()?;

        let kind = bundle.model.kind();
        let parameters = StandardizationParameters::new(bundle.scaler_mean, bundle.scaler_scale);
        Ok(Self::new(Arc::new(bundle.model), parameters, kind)?)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn parameters(&self) -> &StandardizationParameters {
        &self.parameters
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

pub fn load_artifact(path: &Path) -> Result<LoadedModel, ArtifactError> {
    let reader = BufReader::new(File::open(path)?);
    let bundle: ArtifactBundle = serde_json::from_reader(reader)?;
    LoadedModel::from_bundle(bundle)
}

/// Outcome of the startup load. A missing or corrupt artifact is not fatal:
/// scoring falls back to the rule engine.
#[derive(Debug, Clone)]
pub enum ArtifactState {
    Loaded(LoadedModel),
    Unavailable { reason: String },
}

impl ArtifactState {
    pub fn load(path: &Path) -> Self {
        match load_artifact(path) {
            Ok(model) => {
                info!(path = %path.display(), kind = model.kind(), "model artifact loaded");
                ArtifactState::Loaded(model)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "model artifact unavailable, using rule-based fallback"
                );
                ArtifactState::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactState::Loaded(_))
    }
}
