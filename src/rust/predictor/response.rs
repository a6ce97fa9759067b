use std::io::{self, BufRead, Write};

use log::info;
use serde::Serialize;

use super::error::PredictorError;
use super::features::SymptomForm;
use super::predictor::{Prediction, Predictor};

/// Wire shape of one answered request: a label, or the kind of failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResponse {
    Ok {
        label: String,
        class_index: i64,
        features: [f32; 6],
    },
    Error {
        kind: String,
        message: String,
    },
}

impl PredictionResponse {
    /// The request could not be decoded into a form at all.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Error {
            kind: "malformed_request".to_string(),
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self::Ok {
            label: prediction.label,
            class_index: prediction.class_index,
            features: prediction.features.values(),
        }
    }
}

impl From<&PredictorError> for PredictionResponse {
    fn from(err: &PredictorError) -> Self {
        Self::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<Result<Prediction, PredictorError>> for PredictionResponse {
    fn from(result: Result<Prediction, PredictorError>) -> Self {
        match result {
            Ok(prediction) => prediction.into(),
            Err(err) => (&err).into(),
        }
    }
}

/// Answers one [`SymptomForm`] JSON object per input line with one response
/// line, returning the number of responses written.
///
/// A line that is not UTF-8 or not a form gets a `malformed_request`
/// response; blank lines are skipped. Only I/O errors end the loop early.
pub fn serve_lines<R: BufRead, W: Write>(
    predictor: &Predictor,
    mut reader: R,
    mut writer: W,
) -> io::Result<usize> {
    let mut buf = Vec::new();
    let mut answered = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<SymptomForm>(line) {
                Ok(form) => PredictionResponse::from(predictor.predict_form(&form)),
                Err(e) => PredictionResponse::malformed(e.to_string()),
            },
            Err(e) => PredictionResponse::malformed(format!("request is not valid UTF-8: {}", e)),
        };
        answered += 1;
        if !response.is_ok() {
            info!("Request {} rejected: {:?}", answered, response);
        }

        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::error::BoxError;
    use crate::predictor::features::FeatureVector;
    use crate::predictor::labels::LabelTable;
    use crate::predictor::model::ClassModel;
    use serde_json::{json, Value};

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

    fn serve(input: &[u8]) -> (usize, Vec<Value>) {
        let predictor = Predictor::builder()
            .with_model(Fixed(1))
            .with_labels(LabelTable::new(vec!["Flu", "Cold"]).unwrap())
            .build()
            .unwrap();
        let mut out = Vec::new();
        let answered = serve_lines(&predictor, input, &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (answered, lines)
    }

    const FORM: &str =
        r#"{"age": 30, "fever": "Yes", "cough": "No", "fatigue": "No", "gender": "Male", "smoker": "No"}"#;

    #[test]
    fn test_ok_shape() {
        let response: PredictionResponse = Prediction {
            label: "Cold".into(),
            class_index: 1,
            features: FeatureVector::from([30.0, 1.0, 0.0, 1.0, 1.0, 0.0]),
        }
        .into();
        assert!(response.is_ok());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "ok",
                "label": "Cold",
                "class_index": 1,
                "features": [30.0, 1.0, 0.0, 1.0, 1.0, 0.0]
            })
        );
    }

    #[test]
    fn test_error_shape() {
        let err = PredictorError::LabelIndexOutOfRange { index: 5, len: 3 };
        let response = PredictionResponse::from(Err::<Prediction, _>(err));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "label_index_out_of_range");
        assert!(value["message"].as_str().unwrap().contains("index 5"));
    }

    #[test]
    fn test_malformed() {
        let value = serde_json::to_value(PredictionResponse::malformed("bad json")).unwrap();
        assert_eq!(value["kind"], "malformed_request");
        assert_eq!(value["message"], "bad json");
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_loop() {
        let mut input = Vec::new();
        input.extend_from_slice(FORM.as_bytes());
        input.extend_from_slice(b"\n\xff\xfe\n");
        input.extend_from_slice(FORM.as_bytes());
        input.push(b'\n');

        let (answered, lines) = serve(&input);
        assert_eq!(answered, 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["label"], "Cold");
        assert_eq!(lines[1]["kind"], "malformed_request");
        assert_eq!(lines[2]["status"], "ok");
    }

    #[test]
    fn test_bad_requests_answered_in_order() {
        let bad_gender = FORM.replace("Male", "M");
        let input = format!("{{ not json\n\n{}\n{}", bad_gender, FORM);

        let (answered, lines) = serve(input.as_bytes());
        assert_eq!(answered, 3);
        assert_eq!(lines[0]["kind"], "malformed_request");
        assert_eq!(lines[1]["kind"], "invalid_category");
        // The last request has no trailing newline.
        assert_eq!(lines[2]["label"], "Cold");
    }
}
