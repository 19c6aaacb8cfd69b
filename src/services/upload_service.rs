//! UploadService — router state holding the per-route upload policies.
//!
//! Each route gets a [`FileField`] (what the multipart layer admits) and, for
//! single-file routes, a [`FilePipeline`] (what the handler is allowed to see).
//! Policies are built once at startup and shared behind an `Arc`.

use crate::{
    config::AppConfig,
    services::{
        multipart::{FileField, image_file_filter},
        validation::{FilePipeline, FileTypeValidator, MaxFileSizeValidator},
    },
};
use anyhow::{Context, Result};
use axum::http::StatusCode;
use std::sync::Arc;

const GREETING: &str = "Hello World!";

/// Field and pipeline for a route taking at most one file.
pub struct SingleFilePolicy {
    pub field: FileField,
    pub pipeline: FilePipeline,
}

struct Policies {
    text_file: SingleFilePolicy,
    json_file: SingleFilePolicy,
    image: SingleFilePolicy,
    images: FileField,
}

#[derive(Clone)]
pub struct UploadService {
    policies: Arc<Policies>,
}

impl UploadService {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let text_file = SingleFilePolicy {
            field: FileField::single("file"),
            pipeline: FilePipeline::new(),
        };

        let json_file = SingleFilePolicy {
            field: FileField::single("file"),
            pipeline: FilePipeline::new()
                .add_validator(FileTypeValidator::new("json").context("building json type check")?)
                .file_is_required(false),
        };

        let image = SingleFilePolicy {
            field: FileField::single("image").with_filter(image_file_filter),
            pipeline: FilePipeline::new()
                .add_validator(MaxFileSizeValidator::new(cfg.image_max_size))
                .error_status(StatusCode::UNPROCESSABLE_ENTITY)
                .file_is_required(false),
        };

        let images = FileField::many("images", cfg.max_images).with_filter(image_file_filter);

        Ok(Self {
            policies: Arc::new(Policies {
                text_file,
                json_file,
                image,
                images,
            }),
        })
    }

    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    /// `POST /file`
    pub fn text_file(&self) -> &SingleFilePolicy {
        &self.policies.text_file
    }

    /// `POST /file/json-file`
    pub fn json_file(&self) -> &SingleFilePolicy {
        &self.policies.json_file
    }

    /// `POST /file/image`
    pub fn image(&self) -> &SingleFilePolicy {
        &self.policies.image
    }

    /// `POST /file/images`
    pub fn images(&self) -> &FileField {
        &self.policies.images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::upload::UploadedFile, services::validation::ValidationOutcome};
    use bytes::Bytes;

    fn png(len: usize) -> UploadedFile {
        UploadedFile::new("image", "a.png", Some("image/png"), Bytes::from(vec![0; len]))
    }

    #[test]
    fn image_policy_follows_configured_limit() {
        let cfg = AppConfig {
            image_max_size: 10,
            ..AppConfig::default()
        };
        let service = UploadService::new(&cfg).unwrap();
        let pipeline = &service.image().pipeline;

        assert_eq!(pipeline.validate(Some(&png(10))), ValidationOutcome::Accepted);
        assert!(matches!(
            pipeline.validate(Some(&png(11))),
            ValidationOutcome::Rejected { status, .. } if status == StatusCode::UNPROCESSABLE_ENTITY
        ));
        assert_eq!(pipeline.validate(None), ValidationOutcome::Accepted);
    }

    #[test]
    fn text_file_is_required_and_images_capped() {
        let service = UploadService::new(&AppConfig::default()).unwrap();
        assert!(service.text_file().pipeline.check(None).is_err());
        assert_eq!(service.images().name, "images");
        assert_eq!(service.images().max_count, 4);
        assert_eq!(service.greeting(), "Hello World!");
    }
}
