//! Ingestion error types

use docqa_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error: {message}")]
    PdfParse { message: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("No text content extracted from {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::UnsupportedFormat(media_type) => {
                AppError::UnsupportedMediaType { media_type }
            }
            IngestionError::Io(err) => AppError::Internal {
                message: err.to_string(),
            },
            other => AppError::Extraction {
                message: other.to_string(),
            },
        }
    }
}
