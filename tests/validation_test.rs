use disease_predictor::{preprocess, ErrorKind, Gender, PredictorError, SymptomForm, SymptomInput, YesNo};

#[test]
fn test_each_field_rejects_out_of_domain_values() {
    let cases = [
        ("fever", preprocess(30, "Y", "No", "No", "Male", "No")),
        ("cough", preprocess(30, "No", "", "No", "Male", "No")),
        ("fatigue", preprocess(30, "No", "No", "1", "Male", "No")),
        ("gender", preprocess(30, "No", "No", "No", "M", "No")),
        ("smoker", preprocess(30, "No", "No", "No", "Male", "true")),
    ];

    for (expected_field, result) in cases {
        match result {
            Err(PredictorError::InvalidCategory { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("{}: expected InvalidCategory, got {:?}", expected_field, other),
        }
    }
}

#[test]
fn test_first_invalid_field_is_reported() {
    let err = preprocess(30, "No", "No", "No", "Unknown", "Never").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCategory);
    assert!(err.to_string().contains("gender"));
}

#[test]
fn test_from_str() {
    assert_eq!("Yes".parse::<YesNo>().unwrap(), YesNo::Yes);
    assert_eq!("no".parse::<YesNo>().unwrap(), YesNo::No);
    assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
    assert!("Nonbinary".parse::<Gender>().is_err());
    assert!("Maybe".parse::<YesNo>().is_err());
}

#[test]
fn test_form_json_round_trip_into_input() {
    let form: SymptomForm = serde_json::from_str(
        r#"{"age": 30, "fever": "Yes", "cough": "No", "fatigue": "Yes", "gender": "Female", "smoker": "No"}"#,
    )
    .unwrap();
    let input = SymptomInput::try_from(&form).unwrap();
    assert_eq!(input.gender, Gender::Female);
    assert_eq!(input.to_features().values(), [30.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_form_json_requires_every_field() {
    let missing_smoker = r#"{"age": 30, "fever": "Yes", "cough": "No", "fatigue": "Yes", "gender": "Female"}"#;
    assert!(serde_json::from_str::<SymptomForm>(missing_smoker).is_err());

    let negative_age = r#"{"age": -3, "fever": "Yes", "cough": "No", "fatigue": "Yes", "gender": "Female", "smoker": "No"}"#;
    assert!(serde_json::from_str::<SymptomForm>(negative_age).is_err());
}
