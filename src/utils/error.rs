use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("OCR error: {0}")]
    OcrError(String),
    #[error("No MRZ detected in the provided file")]
    NoMrzDetected,
    #[error("The MRZ does not correspond to a {required} document (country={country}, nationality={nationality})")]
    CountryMismatch {
        required: String,
        country: String,
        nationality: String,
    },
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("PDF rendering error: {0}")]
    RenderError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DocumentError {
    /// True for rejections the caller can answer with another strategy
    /// (front-side extraction, or retrying without a country requirement).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DocumentError::NoMrzDetected | DocumentError::CountryMismatch { .. }
        )
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::SerializationError(e.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(e: lopdf::Error) -> Self {
        DocumentError::RenderError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
