use thiserror::Error;

/// Per-request failures of the classification pipeline.
///
/// Each variant maps onto one HTTP status via `status_code`, so handlers can
/// turn any pipeline failure into a client-facing response.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Missing or malformed request input. Raised before any fetch or decode.
    #[error("Invalid input: {0}")]
    Input(String),
    /// The image URL could not be fetched.
    #[error("Could not fetch image: {0}")]
    Fetch(String),
    /// The supplied bytes are not a usable image.
    #[error("Could not decode image: {0}")]
    Decode(String),
    /// The feature vector does not fit the loaded model.
    #[error("Model error: {0}")]
    Model(String),
}

impl ClassifyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ClassifyError::Input(_)  => 400,
            ClassifyError::Decode(_) => 422,
            ClassifyError::Fetch(_)  => 502,
            ClassifyError::Model(_)  => 500,
        }
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        ClassifyError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ClassifyError {
    fn from(err: base64::DecodeError) -> Self {
        ClassifyError::Decode(format!("invalid base64: {}", err))
    }
}

/// Failures while loading or verifying a model file at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Model file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Model shape is invalid: {0}")]
    Shape(String),
}

/// Failures while loading the explorer's CSV datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
