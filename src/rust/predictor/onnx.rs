use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use ndarray::{ArrayViewD, Axis};
use ort::session::Session;
use ort::value::Tensor;

use super::error::{BoxError, PredictorError};
use super::features::FeatureVector;
use super::model::ClassModel;
use crate::runtime::{create_session_builder, RuntimeConfig};

#[derive(Debug, thiserror::Error)]
enum OutputError {
    #[error("model output '{0}' is empty")]
    Empty(String),
}

/// A classifier exported to ONNX, run through ONNX Runtime.
///
/// The model is expected to:
/// - Accept one float input of shape [batch_size, 6]
/// - Emit the class index either as an int64 label output (the layout of
///   converted scikit-learn classifiers, where the output name contains
///   "label") or as a float score tensor of shape [batch_size, num_classes]
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_index: usize,
    output_name: String,
}

impl OnnxModel {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                PredictorError::ModelUnavailable(format!(
                    "Failed to load ONNX model from {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Self::from_session(session)
    }

    pub fn from_session(session: Session) -> Result<Self, PredictorError> {
        Self::validate_model(&session)?;

        let input_name = session.inputs[0].name.clone();
        let output_index = class_output_index(session.outputs.iter().map(|o| o.name.as_str()));
        let output_name = session.outputs[output_index].name.clone();

        info!(
            "ONNX model ready (input: {}, class output: {})",
            input_name, output_name
        );

        Ok(Self {
            session,
            input_name,
            output_index,
            output_name,
        })
    }

    /// Validates that the model has at least one input and one output
    fn validate_model(session: &Session) -> Result<(), PredictorError> {
        if session.inputs.is_empty() {
            return Err(PredictorError::ModelUnavailable(
                "Model must have an input for the feature row".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(PredictorError::ModelUnavailable(
                "Model must have at least 1 output".to_string(),
            ));
        }
        Ok(())
    }
}

impl ClassModel for OnnxModel {
    fn predict_class(&self, features: &FeatureVector) -> Result<i64, BoxError> {
        let input = Tensor::from_array(features.to_array())?;
        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), input);

        let outputs = self.session.run(input_tensors)?;
        let output = &outputs[self.output_index];

        let class = match output.try_extract_tensor::<i64>() {
            Ok(labels) => {
                let class = first_label(labels);
                debug!("ONNX label output: {:?}", class);
                class
            }
            Err(_) => {
                let scores = output.try_extract_tensor::<f32>()?;
                let class = argmax_first(scores).map(|i| i as i64);
                debug!("ONNX score output argmax: {:?}", class);
                class
            }
        };
        class.ok_or_else(|| OutputError::Empty(self.output_name.clone()).into())
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}

/// Index of the output carrying the class: the first whose name contains
/// "label", else the first output.
fn class_output_index<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names
        .into_iter()
        .position(|name| name.contains("label"))
        .unwrap_or(0)
}

/// Class of the first row of an int64 label output.
fn first_label(labels: ArrayViewD<'_, i64>) -> Option<i64> {
    labels.iter().next().copied()
}

/// Argmax over the first row of a score output; the first maximum wins.
fn argmax_first(scores: ArrayViewD<'_, f32>) -> Option<usize> {
    let row = match scores.ndim() {
        0 => return None,
        1 => scores,
        _ if scores.len_of(Axis(0)) == 0 => return None,
        _ => scores.index_axis_move(Axis(0), 0),
    };
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in row.iter().enumerate() {
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, ArrayD, IxDyn};
    use std::io::Write;

    #[test]
    fn test_garbage_file_is_unavailable() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();

        let err = OnnxModel::from_file(file.path(), &RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, PredictorError::ModelUnavailable(_)));
    }

    #[test]
    fn test_class_output_selection() {
        // skl2onnx classifiers: output_label, output_probability
        assert_eq!(class_output_index(["output_label", "output_probability"]), 0);
        assert_eq!(class_output_index(["probabilities", "label"]), 1);
        assert_eq!(class_output_index(["scores"]), 0);
    }

    #[test]
    fn test_label_output() {
        let labels = arr1(&[2i64]).into_dyn();
        assert_eq!(first_label(labels.view()), Some(2));

        let empty = ArrayD::<i64>::zeros(IxDyn(&[0]));
        assert_eq!(first_label(empty.view()), None);
    }

    #[test]
    fn test_score_output_argmax() {
        let scores = arr2(&[[0.1f32, 0.7, 0.2]]).into_dyn();
        assert_eq!(argmax_first(scores.view()), Some(1));

        let flat = arr1(&[0.3f32, 0.1, 0.6]).into_dyn();
        assert_eq!(argmax_first(flat.view()), Some(2));
    }

    #[test]
    fn test_score_ties_pick_first_class() {
        let scores = arr2(&[[0.2f32, 0.4, 0.4], [0.9, 0.0, 0.0]]).into_dyn();
        assert_eq!(argmax_first(scores.view()), Some(1));
    }

    #[test]
    fn test_empty_score_output() {
        let empty = ArrayD::<f32>::zeros(IxDyn(&[1, 0]));
        assert_eq!(argmax_first(empty.view()), None);

        let no_rows = ArrayD::<f32>::zeros(IxDyn(&[0, 3]));
        assert_eq!(argmax_first(no_rows.view()), None);
    }
}
