//! A thread-safe disease predictor that turns six symptom/demographic answers
//! into a disease label using a pre-trained classifier.
//!
//! The pipeline is fixed: the answers are encoded into a six-column feature
//! vector `[Age, Fever, Cough, Fatigue, Gender, Smoker]`, the loaded model
//! returns a class index, and the label table maps that index to a name.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use disease_predictor::{Predictor, preprocess};
//!
//! let predictor = Predictor::builder()
//!     .with_artifacts("disease_prediction_model.onnx", "disease_labels.json")?
//!     .build()?;
//!
//! let features = preprocess(30, "Yes", "No", "Yes", "Female", "No")?;
//! let label = predictor.predict(&features)?;
//! println!("Predicted disease: {}", label);
//! # Ok(())
//! # }
//! ```
//!
//! # Startup Gating
//!
//! A [`Predictor`] only exists once both artifacts have been found and
//! deserialized. If either file is absent, [`PredictorBuilder::with_artifacts`]
//! fails with [`PredictorError::ArtifactsMissing`] and no request can be served.
//!
//! ```rust
//! use disease_predictor::{Predictor, PredictorError};
//!
//! let result = Predictor::builder()
//!     .with_artifacts("/nonexistent/model.json", "/nonexistent/labels.json");
//! assert!(matches!(result, Err(PredictorError::ArtifactsMissing { .. })));
//! ```

pub mod artifacts;
pub mod predictor;
mod runtime;

pub use artifacts::{ArtifactError, ArtifactHashes, ArtifactManager};
pub use predictor::{
    preprocess, serve_lines, BoxError, ClassModel, ErrorKind, FeatureVector, Gender, LabelTable, OnnxModel, Prediction,
    PredictionResponse, Predictor, PredictorBuilder, PredictorError, PredictorInfo, SymptomForm,
    SymptomInput, TreeEnsembleModel, YesNo, FEATURE_COLUMNS,
};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
