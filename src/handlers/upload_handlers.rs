//! HTTP handlers for the upload routes.
//!
//! Every handler parses the request body against its route's file field,
//! runs the route pipeline, and only then builds the echo response.

use crate::{
    errors::AppError,
    models::upload::{FileEcho, ImageSummary, ImagesEcho},
    services::{
        multipart::{UploadBody, parse_upload},
        upload_service::{SingleFilePolicy, UploadService},
    },
};
use axum::{Json, extract::State};
use tracing::debug;

/// `GET /`
pub async fn say_hello(State(service): State<UploadService>) -> &'static str {
    service.greeting()
}

/// `POST /file` — a text file is required and echoed back.
pub async fn upload_file(
    State(service): State<UploadService>,
    upload: UploadBody,
) -> Result<Json<FileEcho>, AppError> {
    echo_single(service.text_file(), upload).await.map(Json)
}

/// `POST /file/json-file` — an optional file that must be JSON when present.
pub async fn upload_json_file(
    State(service): State<UploadService>,
    upload: UploadBody,
) -> Result<Json<FileEcho>, AppError> {
    echo_single(service.json_file(), upload).await.map(Json)
}

/// `POST /file/image` — an optional, size-limited static image.
pub async fn upload_image(
    State(service): State<UploadService>,
    upload: UploadBody,
) -> Result<Json<FileEcho>, AppError> {
    echo_single(service.image(), upload).await.map(Json)
}

/// `POST /file/images` — several static images, summarised.
pub async fn upload_images(
    State(service): State<UploadService>,
    upload: UploadBody,
) -> Result<Json<ImagesEcho>, AppError> {
    let upload = parse_upload(upload, service.images()).await?;

    let images: Vec<ImageSummary> = upload.files.iter().map(ImageSummary::from).collect();
    debug!(count = images.len(), "accepted images");

    Ok(Json(ImagesEcho {
        body: upload.body,
        images,
    }))
}

async fn echo_single(policy: &SingleFilePolicy, upload: UploadBody) -> Result<FileEcho, AppError> {
    let upload = parse_upload(upload, &policy.field).await?;
    let file = upload.single();

    policy.pipeline.check(file)?;

    if let Some(file) = file {
        debug!(
            field = %file.field_name,
            filename = %file.original_name,
            mime_type = %file.mime_type,
            size = file.size(),
            "accepted file"
        );
    }

    Ok(FileEcho {
        file: file.map(|f| f.text()),
        body: upload.body,
    })
}
