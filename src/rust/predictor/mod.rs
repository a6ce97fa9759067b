pub mod builder;
pub mod error;
pub mod features;
pub mod labels;
pub mod model;
pub mod onnx;
#[allow(clippy::module_inception)]
pub mod predictor;
pub mod response;
pub mod tree;

pub use builder::PredictorBuilder;
pub use error::{BoxError, ErrorKind, PredictorError};
pub use features::{
    preprocess, FeatureVector, Gender, SymptomForm, SymptomInput, YesNo, FEATURE_COLUMNS,
    NUM_FEATURES, SUMMARY_CAPTIONS,
};
pub use labels::LabelTable;
pub use model::{ClassModel, ModelFormat};
pub use onnx::OnnxModel;
pub use predictor::{Prediction, Predictor, PredictorInfo};
pub use response::{serve_lines, PredictionResponse};
pub use tree::{DecisionTree, TreeEnsembleModel, TreeError};
