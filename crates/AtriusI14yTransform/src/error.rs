use atrius_i14y_client::I14yError;
use std::path::PathBuf;
use thiserror::Error;

pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while reading value set exports and writing registry documents.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required element or attribute is absent from the XML export.
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// A CSV row is shorter than the fixed column layout requires.
    #[error("Missing column {column} on line {line}")]
    MissingColumn { line: u64, column: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No e-mail address is configured for a publisher person key.
    #[error("Unknown person '{0}': configure it with --person {0}=<email>")]
    UnknownPerson(String),

    #[error("Invalid version '{0}': expected a semantic version such as 2.0.0")]
    InvalidVersion(String),

    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Registry error: {0}")]
    Api(#[from] I14yError),
}
