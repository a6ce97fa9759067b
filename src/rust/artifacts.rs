use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::predictor::PredictorError;

/// File name of the ONNX model artifact.
pub const MODEL_ONNX_FILE: &str = "disease_prediction_model.onnx";
/// File name of the JSON tree-dump model artifact.
pub const MODEL_JSON_FILE: &str = "disease_prediction_model.json";
/// File name of the label table artifact.
pub const LABELS_FILE: &str = "disease_labels.json";

/// Environment variable overriding the artifact directory.
pub const HOME_ENV: &str = "DISEASE_PREDICTOR_HOME";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifacts missing: {0:?}")]
    Missing(Vec<PathBuf>),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

impl From<ArtifactError> for PredictorError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::Missing(missing) => PredictorError::ArtifactsMissing { missing },
            other => PredictorError::ModelUnavailable(other.to_string()),
        }
    }
}

/// Expected SHA-256 digests (lowercase hex) of the artifact files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactHashes {
    pub model: Option<String>,
    pub labels: Option<String>,
}

impl ArtifactHashes {
    /// Checks each file that has an expected digest.
    pub fn verify(&self, model_path: &Path, labels_path: &Path) -> Result<(), ArtifactError> {
        if let Some(expected) = &self.model {
            check_digest(model_path, expected, "model")?;
        }
        if let Some(expected) = &self.labels {
            check_digest(labels_path, expected, "labels")?;
        }
        Ok(())
    }
}

/// Locates the model and label artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
}

impl ArtifactManager {
    /// Creates a new ArtifactManager with the default artifacts directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        resolve_artifacts_dir(
            env::var(HOME_ENV).ok(),
            env::current_dir().ok(),
            dirs::data_dir(),
        )
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> Self {
        Self {
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// The ONNX model if present, else the JSON tree dump if present,
    /// else the ONNX path as the expected location.
    pub fn get_model_path(&self) -> PathBuf {
        let onnx = self.artifacts_dir.join(MODEL_ONNX_FILE);
        if onnx.exists() {
            return onnx;
        }
        let json = self.artifacts_dir.join(MODEL_JSON_FILE);
        if json.exists() {
            return json;
        }
        onnx
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.artifacts_dir.join(LABELS_FILE)
    }

    /// Lists the artifact paths that do not exist.
    pub fn missing_artifacts(&self) -> Vec<PathBuf> {
        let model_path = self.get_model_path();
        let labels_path = self.get_labels_path();
        log::info!("Checking artifacts in {:?}", self.artifacts_dir);
        missing_paths([model_path.as_path(), labels_path.as_path()])
    }

    /// Returns the (model, labels) paths, or every missing path.
    pub fn ensure_artifacts(&self) -> Result<(PathBuf, PathBuf), ArtifactError> {
        let missing = self.missing_artifacts();
        if !missing.is_empty() {
            log::error!("Artifacts missing: {:?}", missing);
            return Err(ArtifactError::Missing(missing));
        }
        Ok((self.get_model_path(), self.get_labels_path()))
    }

    pub fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        Ok(file_digest(path)? == expected_hash.to_ascii_lowercase())
    }
}

/// Resolution order: the explicit override, the working directory if any
/// artifact is already there, the platform data directory, the temp dir.
fn resolve_artifacts_dir(
    home: Option<String>,
    cwd: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = home {
        return PathBuf::from(path);
    }

    if let Some(cwd) = cwd.filter(|dir| has_any_artifact(dir)) {
        return cwd;
    }

    if let Some(data_dir) = data_dir {
        return data_dir.join("disease-predictor");
    }

    env::temp_dir().join("disease-predictor")
}

fn has_any_artifact(dir: &Path) -> bool {
    [MODEL_ONNX_FILE, MODEL_JSON_FILE, LABELS_FILE]
        .iter()
        .any(|name| dir.join(name).exists())
}

/// Returns the paths that do not exist, in the order given.
pub fn missing_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| {
            let exists = p.exists();
            log::debug!("  {:?} (exists: {})", p, exists);
            !exists
        })
        .map(Path::to_path_buf)
        .collect()
}

/// Lowercase hex SHA-256 of a file.
pub fn file_digest(path: &Path) -> Result<String, ArtifactError> {
    log::debug!("Hashing file: {:?}", path);
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn check_digest(path: &Path, expected: &str, file_type: &str) -> Result<(), ArtifactError> {
    let actual = file_digest(path)?;
    if actual != expected.to_ascii_lowercase() {
        log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
        return Err(ArtifactError::HashMismatch {
            file_type: file_type.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
