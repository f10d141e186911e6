//! API handlers module

pub mod ask;
pub mod health;
pub mod language;
pub mod summarize;

use docqa_common::errors::AppError;
use validator::ValidationErrors;

/// Map validator failures onto a 400 naming the first offending field
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let field = errors.field_errors().keys().next().map(|f| f.to_string());
    AppError::Validation {
        message: errors.to_string(),
        field,
    }
}
