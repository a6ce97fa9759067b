use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{error, info};

use super::error::{BoxError, PredictorError};
use super::features::FeatureVector;
use super::onnx::OnnxModel;
use super::tree::TreeEnsembleModel;
use crate::runtime::RuntimeConfig;

/// A pre-trained classifier treated as an opaque function from a feature
/// vector to a class index.
///
/// Implementations are immutable once loaded and must be callable from
/// several threads at once.
pub trait ClassModel: Send + Sync + fmt::Debug {
    /// Classifies a single row and returns the predicted class index.
    fn predict_class(&self, features: &FeatureVector) -> Result<i64, BoxError>;

    /// Short name of the inference backend, used in logs and `info()`.
    fn backend(&self) -> &'static str;

    /// Number of classes the model can emit, when the artifact declares it.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// Serialized model formats understood by the loader, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// ONNX graph, run through ONNX Runtime
    Onnx,
    /// JSON dump of a decision tree or forest
    TreeEnsemble,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("onnx") {
            Some(Self::Onnx)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::TreeEnsemble)
        } else {
            None
        }
    }
}

/// Loads a model artifact, choosing the backend from the file extension.
pub(crate) fn load_model(
    path: &Path,
    runtime_config: &RuntimeConfig,
) -> Result<Arc<dyn ClassModel>, PredictorError> {
    let format = ModelFormat::from_path(path).ok_or_else(|| {
        PredictorError::ModelUnavailable(format!(
            "Unsupported model format: {} (expected .onnx or .json)",
            path.display()
        ))
    })?;

    let model: Arc<dyn ClassModel> = match format {
        ModelFormat::Onnx => Arc::new(OnnxModel::from_file(path, runtime_config).map_err(|e| {
            error!("Failed to load ONNX model {}: {}", path.display(), e);
            e
        })?),
        ModelFormat::TreeEnsemble => Arc::new(TreeEnsembleModel::from_file(path).map_err(|e| {
            error!("Failed to load tree model {}: {}", path.display(), e);
            e
        })?),
    };

    info!("Model loaded from {} ({} backend)", path.display(), model.backend());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ModelFormat::from_path(Path::new("m.onnx")), Some(ModelFormat::Onnx));
        assert_eq!(ModelFormat::from_path(Path::new("m.ONNX")), Some(ModelFormat::Onnx));
        assert_eq!(
            ModelFormat::from_path(Path::new("dir/m.json")),
            Some(ModelFormat::TreeEnsemble)
        );
        assert_eq!(ModelFormat::from_path(Path::new("model.pkl")), None);
        assert_eq!(ModelFormat::from_path(Path::new("model")), None);
    }

    #[test]
    fn test_unsupported_format_is_unavailable() {
        let err = load_model(Path::new("model.pkl"), &RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, PredictorError::ModelUnavailable(_)));
    }
}
