use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::error::PredictorError;
use super::labels::LabelTable;
use super::model::{load_model, ClassModel};
use super::predictor::Predictor;
use crate::artifacts::{missing_paths, ArtifactHashes, ArtifactManager};
use crate::runtime::RuntimeConfig;

/// A builder for constructing a [`Predictor`] with a fluent interface.
///
/// Either load both artifacts from disk with [`with_artifacts`] (or
/// [`with_default_artifacts`]), or inject an already loaded model and label
/// table with [`with_model`] and [`with_labels`].
///
/// [`with_artifacts`]: PredictorBuilder::with_artifacts
/// [`with_default_artifacts`]: PredictorBuilder::with_default_artifacts
/// [`with_model`]: PredictorBuilder::with_model
/// [`with_labels`]: PredictorBuilder::with_labels
#[derive(Default, Debug)]
pub struct PredictorBuilder {
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    model: Option<Arc<dyn ClassModel>>,
    labels: Option<LabelTable>,
    expected_hashes: Option<ArtifactHashes>,
    runtime_config: RuntimeConfig,
}

impl PredictorBuilder {
    /// Creates a new empty PredictorBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when an ONNX model is loaded.
    /// Must be called before the artifacts are loaded.
    ///
    /// # Example
    /// ```
    /// use disease_predictor::{PredictorBuilder, RuntimeConfig};
    ///
    /// let builder = PredictorBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default().with_threads(1));
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Requires the artifact files to match these SHA-256 digests.
    /// Must be called before the artifacts are loaded.
    pub fn with_expected_hashes(mut self, hashes: ArtifactHashes) -> Self {
        self.expected_hashes = Some(hashes);
        self
    }

    /// Loads the model and label artifacts from the given paths.
    ///
    /// Both files are checked before either is read, so a missing label file
    /// is reported even when the model file is also missing.
    ///
    /// # Returns
    /// * `Result<Self, PredictorError>` - The builder instance if successful, or:
    ///   - `ArtifactsMissing` listing every absent file
    ///   - `ModelUnavailable` if a file fails verification or deserialization
    ///   - `BuildError` if a model or label table was already set
    pub fn with_artifacts(
        mut self,
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, PredictorError> {
        if self.model.is_some() || self.labels.is_some() {
            return Err(PredictorError::BuildError(
                "Model and labels already set".to_string(),
            ));
        }

        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();

        let missing = missing_paths([model_path, labels_path]);
        if !missing.is_empty() {
            warn!("Refusing to start, artifacts missing: {:?}", missing);
            return Err(PredictorError::ArtifactsMissing { missing });
        }

        if let Some(hashes) = &self.expected_hashes {
            hashes.verify(model_path, labels_path)?;
            info!("Artifact digests verified");
        }

        let model = load_model(model_path, &self.runtime_config)?;
        let labels = LabelTable::from_file(labels_path)?;

        self.model_path = Some(model_path.to_path_buf());
        self.labels_path = Some(labels_path.to_path_buf());
        self.model = Some(model);
        self.labels = Some(labels);
        Ok(self)
    }

    /// Loads the artifacts located by `manager`.
    ///
    /// # Returns
    /// * `ArtifactsMissing` listing every artifact absent from the directory,
    ///   otherwise whatever [`with_artifacts`](Self::with_artifacts) returns
    pub fn with_artifact_manager(self, manager: &ArtifactManager) -> Result<Self, PredictorError> {
        let (model_path, labels_path) = manager.ensure_artifacts()?;
        self.with_artifacts(model_path, labels_path)
    }

    /// Loads the artifacts from the default artifact directory.
    ///
    /// See [`ArtifactManager::get_default_artifacts_dir`] for how the
    /// directory is resolved.
    pub fn with_default_artifacts(self) -> Result<Self, PredictorError> {
        self.with_artifact_manager(&ArtifactManager::new_default())
    }

    /// Uses an already loaded model.
    pub fn with_model(mut self, model: impl ClassModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Uses an already loaded label table.
    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Builds and returns the final Predictor instance
    ///
    /// # Returns
    /// * `Result<Predictor, PredictorError>` - The constructed Predictor, or a
    ///   `BuildError` if no model or no label table has been provided
    pub fn build(self) -> Result<Predictor, PredictorError> {
        let model = self
            .model
            .ok_or_else(|| PredictorError::BuildError("No model loaded".to_string()))?;
        let labels = self
            .labels
            .ok_or_else(|| PredictorError::BuildError("No label table loaded".to_string()))?;

        if let Some(num_classes) = model.num_classes() {
            if num_classes > labels.len() {
                warn!(
                    "Model declares {} classes but the label table has {} entries",
                    num_classes,
                    labels.len()
                );
            }
        }

        info!(
            "Predictor ready ({} backend, {} labels)",
            model.backend(),
            labels.len()
        );

        Ok(Predictor {
            model_path: self.model_path,
            labels_path: self.labels_path,
            model,
            labels: Arc::new(labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::error::BoxError;
    use crate::predictor::features::FeatureVector;

    #[derive(Debug)]
    struct Fixed(i64);

    impl ClassModel for Fixed {
        fn predict_class(&self, _features: &FeatureVector) -> Result<i64, BoxError> {
            Ok(self.0)
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_build_requires_model_and_labels() {
        let err = PredictorBuilder::new().build().unwrap_err();
        assert!(matches!(err, PredictorError::BuildError(_)));

        let err = PredictorBuilder::new().with_model(Fixed(0)).build().unwrap_err();
        assert!(matches!(err, PredictorError::BuildError(_)));
    }

    #[test]
    fn test_missing_artifacts_listed_together() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("disease_prediction_model.json");
        let labels = dir.path().join("disease_labels.json");

        match PredictorBuilder::new().with_artifacts(&model, &labels) {
            Err(PredictorError::ArtifactsMissing { missing }) => {
                assert_eq!(missing, vec![model, labels]);
            }
            other => panic!("expected ArtifactsMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_artifacts_after_injection_rejected() {
        let labels = LabelTable::new(vec!["Flu"]).unwrap();
        let err = PredictorBuilder::new()
            .with_labels(labels)
            .with_artifacts("m.json", "l.json")
            .unwrap_err();
        assert!(matches!(err, PredictorError::BuildError(_)));
    }

    #[test]
    fn test_artifact_manager_gates_on_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path());

        match PredictorBuilder::new().with_artifact_manager(&manager) {
            Err(PredictorError::ArtifactsMissing { missing }) => {
                assert_eq!(missing, vec![manager.get_model_path(), manager.get_labels_path()]);
            }
            other => panic!("expected ArtifactsMissing, got {:?}", other.map(|_| ())),
        }

        std::fs::write(
            dir.path().join(crate::artifacts::MODEL_JSON_FILE),
            r#"{"n_features": 6, "n_classes": 1, "trees": [{"children_left": [-1],
                "children_right": [-1], "feature": [-2], "threshold": [-2.0], "value": [[1]]}]}"#,
        )
        .unwrap();
        std::fs::write(manager.get_labels_path(), r#"["Flu"]"#).unwrap();

        let predictor = PredictorBuilder::new()
            .with_artifact_manager(&manager)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(predictor.info().backend, "tree-ensemble");
    }
}
