use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::error::PredictorError;
use super::features::{FeatureVector, SymptomForm, SymptomInput, FEATURE_COLUMNS};
use super::labels::LabelTable;
use super::model::ClassModel;

/// A thread-safe disease predictor over a loaded model and label table.
///
/// # Thread Safety
///
/// The model and label table are immutable after loading and held behind
/// `Arc`, so a `Predictor` can be shared across threads (or request handlers)
/// without locking.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use disease_predictor::{LabelTable, Predictor, TreeEnsembleModel, preprocess};
/// use std::sync::Arc;
/// use std::thread;
///
/// // One stump: fever <= 0.5 goes to "Cold", otherwise "Flu".
/// let model = TreeEnsembleModel::from_json_str(r#"{
///     "n_features": 6, "n_classes": 2,
///     "trees": [{
///         "children_left": [1, -1, -1], "children_right": [2, -1, -1],
///         "feature": [1, -2, -2], "threshold": [0.5, -2.0, -2.0],
///         "value": [[1, 1], [0, 3], [3, 0]]
///     }]
/// }"#)?;
///
/// let predictor = Arc::new(Predictor::builder()
///     .with_model(model)
///     .with_labels(LabelTable::new(vec!["Flu", "Cold"])?)
///     .build()?);
///
/// let shared = Arc::clone(&predictor);
/// let handle = thread::spawn(move || {
///     let features = preprocess(30, "Yes", "No", "No", "Male", "No").unwrap();
///     shared.predict(&features).unwrap()
/// });
/// assert_eq!(handle.join().unwrap(), "Flu");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Predictor {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub(crate) model: Arc<dyn ClassModel>,
    pub(crate) labels: Arc<LabelTable>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

/// Information about a loaded predictor
#[derive(Debug, Clone, Serialize)]
pub struct PredictorInfo {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub backend: &'static str,
    pub num_labels: usize,
    pub labels: Vec<String>,
    pub feature_columns: [&'static str; 6],
}

/// A successful prediction together with the encoding it was made from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub class_index: i64,
    pub features: FeatureVector,
}

impl Predictor {
    /// Creates a new PredictorBuilder for fluent construction
    pub fn builder() -> super::builder::PredictorBuilder {
        super::builder::PredictorBuilder::new()
    }

    /// Returns information about the predictor's loaded artifacts
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            backend: self.model.backend(),
            num_labels: self.labels.len(),
            labels: self.labels.labels().to_vec(),
            feature_columns: FEATURE_COLUMNS,
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Predicts the disease label for an encoded feature vector.
    ///
    /// # Errors
    /// - `PredictionFailure` if the model call fails, with the cause attached
    /// - `LabelIndexOutOfRange` if the model emits an index with no label
    pub fn predict(&self, features: &FeatureVector) -> Result<String, PredictorError> {
        self.classify(features).map(|(_, label)| label.to_string())
    }

    /// Validates, encodes and classifies a raw form submission.
    pub fn predict_form(&self, form: &SymptomForm) -> Result<Prediction, PredictorError> {
        let input = SymptomInput::try_from(form)?;
        self.predict_input(&input)
    }

    /// Encodes and classifies already validated answers.
    pub fn predict_input(&self, input: &SymptomInput) -> Result<Prediction, PredictorError> {
        let features = input.to_features();
        let (class_index, label) = self.classify(&features)?;
        Ok(Prediction {
            label: label.to_string(),
            class_index,
            features,
        })
    }

    fn classify(&self, features: &FeatureVector) -> Result<(i64, &str), PredictorError> {
        debug!("Classifying features {:?}", features.as_slice());
        let class_index = self
            .model
            .predict_class(features)
            .map_err(PredictorError::prediction)?;
        let label = self.labels.label_for(class_index)?;
        debug!("Class index {} -> {}", class_index, label);
        Ok((class_index, label))
    }
}
