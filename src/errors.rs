//! Error types for package generation

use thiserror::Error;

use crate::package::MediaError;
use crate::template::TemplateError;

/// Errors that can occur while building notes or writing a package
#[derive(Debug, Error)]
pub enum ApkgError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Could not compute required fields for this template, please check the formatting of \"qfmt\": {qfmt}")]
    RequiredFields { qfmt: String },

    #[error("Note has {actual} field values but model {model_id} defines {expected} fields")]
    FieldCount {
        model_id: i64,
        expected: usize,
        actual: usize,
    },

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Temporary collection file error: {0}")]
    TempFile(std::io::Error),

    #[error("ZIP error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive IO error: {0}")]
    ArchiveIo(std::io::Error),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ApkgError> for String {
    fn from(err: ApkgError) -> Self {
        err.to_string()
    }
}

/// Result type alias for package generation
pub type Result<T> = std::result::Result<T, ApkgError>;
