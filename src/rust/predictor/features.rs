use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::PredictorError;

/// Number of columns the model was trained with.
pub const NUM_FEATURES: usize = 6;

/// Column order of the feature vector. Must match the training order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] =
    ["Age", "Fever", "Cough", "Fatigue", "Gender", "Smoker"];

/// Captions used when the encoded answers are shown back to the user.
pub const SUMMARY_CAPTIONS: [&str; NUM_FEATURES] = [
    "Age",
    "Fever (1=Yes)",
    "Cough (1=Yes)",
    "Fatigue (1=Yes)",
    "Gender (0=Male, 1=Female)",
    "Smoker (1=Yes)",
];

const YES_NO: &[&str] = &["Yes", "No"];
const GENDERS: &[&str] = &["Male", "Female"];

/// Answer to a yes/no question on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    /// Parses a form answer, naming `field` in the error.
    pub fn parse_field(field: &'static str, value: &str) -> Result<Self, PredictorError> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("yes") => Ok(Self::Yes),
            v if v.eq_ignore_ascii_case("no") => Ok(Self::No),
            _ => Err(PredictorError::InvalidCategory {
                field,
                value: value.to_string(),
                expected: YES_NO,
            }),
        }
    }

    pub fn encode(self) -> f32 {
        match self {
            Self::Yes => 1.0,
            Self::No => 0.0,
        }
    }
}

impl FromStr for YesNo {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_field("answer", s)
    }
}

impl TryFrom<String> for YesNo {
    type Error = PredictorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "Yes",
            Self::No => "No",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn parse_field(field: &'static str, value: &str) -> Result<Self, PredictorError> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("male") => Ok(Self::Male),
            v if v.eq_ignore_ascii_case("female") => Ok(Self::Female),
            _ => Err(PredictorError::InvalidCategory {
                field,
                value: value.to_string(),
                expected: GENDERS,
            }),
        }
    }

    /// Male encodes to 0, Female to 1.
    pub fn encode(self) -> f32 {
        match self {
            Self::Male => 0.0,
            Self::Female => 1.0,
        }
    }
}

impl FromStr for Gender {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_field("gender", s)
    }
}

impl TryFrom<String> for Gender {
    type Error = PredictorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "Male",
            Self::Female => "Female",
        })
    }
}

/// A prediction request exactly as a form or API client submits it.
///
/// Categorical answers are still raw strings here; converting into a
/// [`SymptomInput`] is where out-of-domain values are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomForm {
    pub age: u32,
    pub fever: String,
    pub cough: String,
    pub fatigue: String,
    pub gender: String,
    pub smoker: String,
}

/// Validated answers with every categorical field closed over its domain.
///
/// Deserializing goes through [`SymptomForm`], so JSON input is held to the
/// same rules as [`preprocess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "SymptomForm")]
pub struct SymptomInput {
    pub age: u32,
    pub fever: YesNo,
    pub cough: YesNo,
    pub fatigue: YesNo,
    pub gender: Gender,
    pub smoker: YesNo,
}

impl SymptomInput {
    /// Encodes the answers into the model's fixed column order.
    pub fn to_features(&self) -> FeatureVector {
        FeatureVector([
            self.age as f32,
            self.fever.encode(),
            self.cough.encode(),
            self.fatigue.encode(),
            self.gender.encode(),
            self.smoker.encode(),
        ])
    }
}

impl TryFrom<&SymptomForm> for SymptomInput {
    type Error = PredictorError;

    fn try_from(form: &SymptomForm) -> Result<Self, Self::Error> {
        Ok(Self {
            age: form.age,
            fever: YesNo::parse_field("fever", &form.fever)?,
            cough: YesNo::parse_field("cough", &form.cough)?,
            fatigue: YesNo::parse_field("fatigue", &form.fatigue)?,
            gender: Gender::parse_field("gender", &form.gender)?,
            smoker: YesNo::parse_field("smoker", &form.smoker)?,
        })
    }
}

impl TryFrom<SymptomForm> for SymptomInput {
    type Error = PredictorError;

    fn try_from(form: SymptomForm) -> Result<Self, Self::Error> {
        Self::try_from(&form)
    }
}

/// The fixed-order numeric encoding of one set of answers:
/// `[Age, Fever, Cough, Fatigue, Gender, Smoker]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f32; NUM_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn values(&self) -> [f32; NUM_FEATURES] {
        self.0
    }

    /// Single-row `[1, 6]` matrix, the batch shape models are called with.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((1, NUM_FEATURES), |(_, col)| self.0[col])
    }

    /// Rows of (caption, value) for displaying the encoded answers.
    pub fn summary(&self) -> Vec<(&'static str, f32)> {
        SUMMARY_CAPTIONS.iter().copied().zip(self.0).collect()
    }
}

impl From<[f32; NUM_FEATURES]> for FeatureVector {
    fn from(values: [f32; NUM_FEATURES]) -> Self {
        Self(values)
    }
}

/// Maps raw form answers to the model's numeric encoding.
///
/// "Yes" maps to 1 and "No" to 0 for the symptom flags and smoker; "Male"
/// maps to 0 and "Female" to 1. `age` is passed through unvalidated.
///
/// # Errors
/// - `InvalidCategory` if any categorical answer is outside its domain
///
/// # Example
/// ```
/// use disease_predictor::preprocess;
///
/// let features = preprocess(30, "Yes", "No", "Yes", "Female", "No").unwrap();
/// assert_eq!(features.values(), [30.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
/// ```
pub fn preprocess(
    age: u32,
    fever: &str,
    cough: &str,
    fatigue: &str,
    gender: &str,
    smoker: &str,
) -> Result<FeatureVector, PredictorError> {
    let input = SymptomInput {
        age,
        fever: YesNo::parse_field("fever", fever)?,
        cough: YesNo::parse_field("cough", cough)?,
        fatigue: YesNo::parse_field("fatigue", fatigue)?,
        gender: Gender::parse_field("gender", gender)?,
        smoker: YesNo::parse_field("smoker", smoker)?,
    };
    Ok(input.to_features())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::error::ErrorKind;

    #[test]
    fn test_encoding() {
        let features = preprocess(30, "Yes", "No", "Yes", "Female", "No").unwrap();
        assert_eq!(features.values(), [30.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_every_combination_has_six_columns() {
        let answers = ["Yes", "No"];
        for fever in answers {
            for cough in answers {
                for gender in ["Male", "Female"] {
                    let f = preprocess(45, fever, cough, "No", gender, "Yes").unwrap();
                    assert_eq!(f.as_slice().len(), FEATURE_COLUMNS.len());
                    assert_eq!(f.as_slice()[0], 45.0);
                    assert_eq!(f.as_slice()[1], if fever == "Yes" { 1.0 } else { 0.0 });
                    assert_eq!(f.as_slice()[2], if cough == "Yes" { 1.0 } else { 0.0 });
                    assert_eq!(f.as_slice()[3], 0.0);
                    assert_eq!(f.as_slice()[4], if gender == "Female" { 1.0 } else { 0.0 });
                    assert_eq!(f.as_slice()[5], 1.0);
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = preprocess(62, "No", "Yes", "Yes", "Male", "Yes").unwrap();
        let b = preprocess(62, "No", "Yes", "Yes", "Male", "Yes").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_age_is_not_range_checked() {
        let f = preprocess(5, "No", "No", "No", "Male", "No").unwrap();
        assert_eq!(f.values()[0], 5.0);
    }

    #[test]
    fn test_invalid_category_names_field() {
        let err = preprocess(30, "Yes", "No", "Yes", "Other", "No").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCategory);
        match err {
            PredictorError::InvalidCategory { field, value, expected } => {
                assert_eq!(field, "gender");
                assert_eq!(value, "Other");
                assert_eq!(expected, &["Male", "Female"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gender_words_are_not_yes_no() {
        assert!(preprocess(30, "Male", "No", "No", "Male", "No").is_err());
        assert!(preprocess(30, "No", "No", "No", "Yes", "No").is_err());
    }

    #[test]
    fn test_case_and_whitespace_tolerated() {
        let f = preprocess(30, " yes", "NO", "Yes ", "female", "no").unwrap();
        assert_eq!(f.values(), [30.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_form_conversion() {
        let form = SymptomForm {
            age: 40,
            fever: "No".into(),
            cough: "Yes".into(),
            fatigue: "No".into(),
            gender: "Male".into(),
            smoker: "Maybe".into(),
        };
        let err = SymptomInput::try_from(&form).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidCategory { field: "smoker", .. }));
    }

    #[test]
    fn test_input_json_uses_form_rules() {
        let input: SymptomInput = serde_json::from_str(
            r#"{"age": 41, "fever": " yes", "cough": "NO", "fatigue": "No", "gender": "female", "smoker": "Yes"}"#,
        )
        .unwrap();
        assert_eq!(input.fever, YesNo::Yes);
        assert_eq!(input.gender, Gender::Female);
        assert_eq!(
            input.to_features(),
            preprocess(41, " yes", "NO", "No", "female", "Yes").unwrap()
        );

        let err = serde_json::from_str::<SymptomInput>(
            r#"{"age": 41, "fever": "Yes", "cough": "No", "fatigue": "No", "gender": "M", "smoker": "No"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("gender"));

        assert_eq!(serde_json::from_str::<YesNo>(r#""YES""#).unwrap(), YesNo::Yes);
        assert!(serde_json::from_str::<Gender>(r#""Other""#).is_err());
    }

    #[test]
    fn test_summary_and_array_follow_column_order() {
        let f = preprocess(33, "No", "Yes", "No", "Female", "Yes").unwrap();
        let summary = f.summary();
        assert_eq!(summary[0], ("Age", 33.0));
        assert_eq!(summary[4], ("Gender (0=Male, 1=Female)", 1.0));
        let row = f.to_array();
        assert_eq!(row.shape(), &[1, NUM_FEATURES]);
        assert_eq!(row[[0, 2]], 1.0);
        assert_eq!(row[[0, 5]], 1.0);
    }

    #[test]
    fn test_defaults_match_form_defaults() {
        let input = SymptomInput {
            age: 30,
            ..Default::default()
        };
        assert_eq!(input.to_features().values(), [30.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }
}
