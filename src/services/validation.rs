//! Validator pipeline run over an uploaded file before a handler sees it.
//!
//! A `FilePipeline` holds an ordered list of validators, a flag saying whether
//! the file may be absent, and the status code used for rejections. The first
//! failing validator decides the outcome.

use crate::{errors::UploadError, models::upload::UploadedFile};
use axum::http::StatusCode;
use regex::Regex;

/// A single check over an uploaded file.
pub trait FileValidator: Send + Sync {
    fn is_valid(&self, file: &UploadedFile) -> bool;

    fn error_message(&self, file: &UploadedFile) -> String;

    /// Rejections carry 400; a pipeline may replace the status.
    fn validate(&self, file: &UploadedFile) -> ValidationOutcome {
        if self.is_valid(file) {
            ValidationOutcome::Accepted
        } else {
            ValidationOutcome::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: self.error_message(file),
            }
        }
    }
}

/// Accepts files whose mime type contains a match for `file_type`.
#[derive(Debug, Clone)]
pub struct FileTypeValidator {
    file_type: String,
    pattern: Regex,
}

impl FileTypeValidator {
    /// `file_type` is a regular expression; a plain word such as `json`
    /// matches any mime type containing it.
    pub fn new(file_type: impl Into<String>) -> Result<Self, regex::Error> {
        let file_type = file_type.into();
        let pattern = Regex::new(&file_type)?;
        Ok(Self { file_type, pattern })
    }
}

impl FileValidator for FileTypeValidator {
    fn is_valid(&self, file: &UploadedFile) -> bool {
        self.pattern.is_match(&file.mime_type)
    }

    fn error_message(&self, _file: &UploadedFile) -> String {
        format!("Validation failed (expected type is {})", self.file_type)
    }
}

/// Accepts files no larger than `max_size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct MaxFileSizeValidator {
    max_size: u64,
}

impl MaxFileSizeValidator {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }
}

impl FileValidator for MaxFileSizeValidator {
    fn is_valid(&self, file: &UploadedFile) -> bool {
        file.size() <= self.max_size
    }

    fn error_message(&self, _file: &UploadedFile) -> String {
        format!(
            "Validation failed (expected size is less than or equal to {})",
            self.max_size
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected { status: StatusCode, message: String },
}

pub struct FilePipeline {
    validators: Vec<Box<dyn FileValidator>>,
    file_is_required: bool,
    error_status: StatusCode,
}

impl Default for FilePipeline {
    fn default() -> Self {
        Self {
            validators: Vec::new(),
            file_is_required: true,
            error_status: StatusCode::BAD_REQUEST,
        }
    }
}

impl FilePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(mut self, validator: impl FileValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn file_is_required(mut self, required: bool) -> Self {
        self.file_is_required = required;
        self
    }

    /// Status used when a validator rejects a present file.
    pub fn error_status(mut self, status: StatusCode) -> Self {
        self.error_status = status;
        self
    }

    pub fn validate(&self, file: Option<&UploadedFile>) -> ValidationOutcome {
        let Some(file) = file else {
            if self.file_is_required {
                return ValidationOutcome::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    message: UploadError::MissingFile.to_string(),
                };
            }
            return ValidationOutcome::Accepted;
        };

        for validator in &self.validators {
            if let ValidationOutcome::Rejected { message, .. } = validator.validate(file) {
                return ValidationOutcome::Rejected {
                    status: self.error_status,
                    message,
                };
            }
        }

        ValidationOutcome::Accepted
    }

    /// Same as [`validate`](Self::validate), as a `Result`.
    pub fn check(&self, file: Option<&UploadedFile>) -> Result<(), UploadError> {
        match self.validate(file) {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected { .. } if file.is_none() => Err(UploadError::MissingFile),
            ValidationOutcome::Rejected { status, message } => {
                Err(UploadError::Validation { status, message })
            }
        }
    }
}
