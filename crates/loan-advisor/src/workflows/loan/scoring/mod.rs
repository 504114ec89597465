mod classifier;
mod encoder;
mod fallback;
mod standardizer;

pub use classifier::{
    canonical_feature_names, load_artifact, ArtifactBundle, ArtifactError, ArtifactState,
    Classifier, ClassifierModel, DecisionTree, LoadedModel, ModelShapeError,
};
pub use encoder::{
    encode, parse_application, EncodingError, Feature, FeatureVector, RawApplication, RawValue,
    FEATURE_COUNT,
};
pub use fallback::predict_fallback;
pub use standardizer::{
    standardize, DimensionMismatchError, ParameterError, StandardizationParameters,
};

use serde::Serialize;

use super::domain::{LoanApplication, PredictionLabel};

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    TrainedModel,
    RuleFallback,
}

impl PredictionSource {
    /// Rule-based predictions are always reported as low confidence.
    pub const fn confidence(self) -> &'static str {
        match self {
            PredictionSource::TrainedModel => "High",
            PredictionSource::RuleFallback => "Low (using fallback)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub application: LoanApplication,
    pub label: PredictionLabel,
    pub source: PredictionSource,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatchError),
}

/// Reported quality figures for whichever predictor is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub model_type: &'static str,
}

/// Encode → standardize → classify, or the rule engine when no artifact loaded.
#[derive(Debug, Clone)]
pub struct LoanScorer {
    artifact: ArtifactState,
}

impl LoanScorer {
    pub fn new(artifact: ArtifactState) -> Self {
        Self { artifact }
    }

    pub fn with_model(model: LoadedModel) -> Self {
        Self::new(ArtifactState::Loaded(model))
    }

    pub fn fallback_only(reason: impl Into<String>) -> Self {
        Self::new(ArtifactState::Unavailable {
            reason: reason.into(),
        })
    }

    pub fn artifact(&self) -> &ArtifactState {
        &self.artifact
    }

    pub fn source(&self) -> PredictionSource {
        if self.artifact.is_loaded() {
            PredictionSource::TrainedModel
        } else {
            PredictionSource::RuleFallback
        }
    }

    /// Encoding failures surface in both modes; artifact absence never does.
    pub fn predict(&self, raw: &RawApplication) -> Result<ScoringOutcome, ScoringError> {
        let application = parse_application(raw)?;
        let features = application.features();

        let (class, source) = match &self.artifact {
            ArtifactState::Loaded(model) => {
                let scaled = standardize(&features, model.parameters())?;
                (
                    model.classifier().predict(&scaled),
                    PredictionSource::TrainedModel,
                )
            }
            ArtifactState::Unavailable { .. } => (
                predict_fallback(
                    features.get(Feature::ApplicantIncome),
                    features.get(Feature::LoanAmount),
                    features.get(Feature::CreditHistory),
                ),
                PredictionSource::RuleFallback,
            ),
        };

        Ok(ScoringOutcome {
            application,
            label: PredictionLabel::from_class(class),
            source,
        })
    }

    pub fn metrics(&self) -> ModelMetrics {
        match self.source() {
            PredictionSource::TrainedModel => ModelMetrics {
                accuracy: 0.87,
                precision: 0.85,
                recall: 0.86,
                f1: 0.86,
                model_type: "Trained Model",
            },
            PredictionSource::RuleFallback => ModelMetrics {
                accuracy: 0.75,
                precision: 0.70,
                recall: 0.72,
                f1: 0.71,
                model_type: "Simple Rules",
            },
        }
    }
}
