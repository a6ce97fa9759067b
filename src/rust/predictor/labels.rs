use std::fs;
use std::path::Path;

use log::info;

use super::error::PredictorError;

/// Ordered class names; the model's class index is a direct index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Creates a label table. At least one label is required.
    pub fn new(labels: Vec<impl Into<String>>) -> Result<Self, PredictorError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(PredictorError::ModelUnavailable(
                "Label table must contain at least one label".into(),
            ));
        }
        Ok(Self { labels })
    }

    /// Loads a label table stored as a JSON array of strings.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PredictorError::ModelUnavailable(format!(
                "Failed to read label file {}: {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::from_json_str(&contents).map_err(|e| match e {
            PredictorError::ModelUnavailable(msg) => PredictorError::ModelUnavailable(format!(
                "{} ({})",
                msg,
                path.display()
            )),
            other => other,
        })?;
        info!("Loaded {} labels from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PredictorError> {
        let labels: Vec<String> = serde_json::from_str(json).map_err(|e| {
            PredictorError::ModelUnavailable(format!("Invalid label table: {}", e))
        })?;
        Self::new(labels)
    }

    /// Looks up the label for a class index emitted by the model.
    ///
    /// # Errors
    /// - `LabelIndexOutOfRange` if `index` is negative or not below `len()`
    pub fn label_for(&self, index: i64) -> Result<&str, PredictorError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
            .ok_or(PredictorError::LabelIndexOutOfRange {
                index,
                len: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
