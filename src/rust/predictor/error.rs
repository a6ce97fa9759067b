use std::fmt;
use std::path::PathBuf;

use ort::Error as OrtError;
use serde::Serialize;

/// Boxed error carried as the underlying cause of a failed model call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents the different types of errors that can occur while loading
/// artifacts or serving a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// One or both artifact files are absent. Fatal at startup.
    #[error("Artifacts missing: {}", display_paths(.missing))]
    ArtifactsMissing { missing: Vec<PathBuf> },
    /// Artifacts exist but could not be loaded, verified or deserialized.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// A categorical answer falls outside its enumerated domain.
    #[error("Invalid value {value:?} for {field}, expected one of {expected:?}")]
    InvalidCategory {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },
    /// The underlying model call failed.
    #[error("Prediction failed: {source}")]
    PredictionFailure {
        #[source]
        source: BoxError,
    },
    /// The model emitted a class index the label table does not cover.
    #[error("Model returned class index {index} but the label table has {len} entries")]
    LabelIndexOutOfRange { index: i64, len: usize },
    /// The predictor was assembled incorrectly.
    #[error("Build error: {0}")]
    BuildError(String),
}

/// Machine-readable discriminant of a [`PredictorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ArtifactsMissing,
    ModelUnavailable,
    InvalidCategory,
    PredictionFailure,
    LabelIndexOutOfRange,
    BuildError,
}

impl PredictorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArtifactsMissing { .. } => ErrorKind::ArtifactsMissing,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::InvalidCategory { .. } => ErrorKind::InvalidCategory,
            Self::PredictionFailure { .. } => ErrorKind::PredictionFailure,
            Self::LabelIndexOutOfRange { .. } => ErrorKind::LabelIndexOutOfRange,
            Self::BuildError(_) => ErrorKind::BuildError,
        }
    }

    /// True for the two conditions that keep the predictor from starting.
    pub fn is_startup_failure(&self) -> bool {
        matches!(self, Self::ArtifactsMissing { .. } | Self::ModelUnavailable(_))
    }

    pub(crate) fn prediction(source: impl Into<BoxError>) -> Self {
        Self::PredictionFailure {
            source: source.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ArtifactsMissing => "artifacts_missing",
            Self::ModelUnavailable => "model_unavailable",
            Self::InvalidCategory => "invalid_category",
            Self::PredictionFailure => "prediction_failure",
            Self::LabelIndexOutOfRange => "label_index_out_of_range",
            Self::BuildError => "build_error",
        };
        f.write_str(name)
    }
}

impl From<OrtError> for PredictorError {
    fn from(err: OrtError) -> Self {
        PredictorError::ModelUnavailable(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
