//! Multipart parsing with per-route file limits and pre-parse filters.
//!
//! Text parts are collected into a [`FormBody`]; file parts are checked
//! against the route's [`FileField`] before their bytes are buffered.
//! Requests that are not multipart carry no files and their JSON or
//! urlencoded payload becomes the body.

use crate::{
    errors::{AppError, UploadError},
    models::upload::{FormBody, UploadedFile},
};
use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header},
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static STATIC_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(jpg|jpeg|png)$").expect("valid image pattern"));

/// Decides from the filename alone whether a part is admitted.
pub type FileFilter = fn(&str) -> Result<(), UploadError>;

/// Case-sensitive check for `.jpg`, `.jpeg` or `.png` at the end of the name.
pub fn is_static_image(filename: &str) -> bool {
    STATIC_IMAGE.is_match(filename)
}

pub fn image_file_filter(filename: &str) -> Result<(), UploadError> {
    if is_static_image(filename) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedMediaType)
    }
}

/// The file field a route accepts.
#[derive(Clone, Debug)]
pub struct FileField {
    pub name: &'static str,
    pub max_count: usize,
    pub filters: Vec<FileFilter>,
}

impl FileField {
    pub fn single(name: &'static str) -> Self {
        Self::many(name, 1)
    }

    pub fn many(name: &'static str, max_count: usize) -> Self {
        Self {
            name,
            max_count,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filters.push(filter);
        self
    }

    fn admit(&self, field_name: &str, filename: &str, accepted: usize) -> Result<(), UploadError> {
        if field_name != self.name || accepted >= self.max_count {
            debug!(
                field = %field_name,
                expected = self.name,
                accepted,
                "rejected unexpected file field"
            );
            return Err(UploadError::UnexpectedField);
        }
        self.filters.iter().try_for_each(|filter| filter(filename))
    }
}

#[derive(Debug, Default)]
pub struct ParsedUpload {
    pub body: FormBody,
    pub files: Vec<UploadedFile>,
}

impl ParsedUpload {
    pub fn single(&self) -> Option<&UploadedFile> {
        self.files.first()
    }
}

/// Request payload of an upload route, whatever its content type.
pub enum UploadBody {
    Multipart(Multipart),
    /// JSON, urlencoded or empty payload; never carries files.
    Fields(FormBody),
}

impl<S> FromRequest<S> for UploadBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|r| AppError::new(r.status(), r.body_text()))?;
            return Ok(Self::Multipart(multipart));
        }

        let mut body = FormBody::default();
        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|r| AppError::new(r.status(), r.body_text()))?;
            match value {
                Value::Object(entries) => body.0 = entries,
                _ => {
                    return Err(AppError::new(
                        StatusCode::BAD_REQUEST,
                        "Request body must be a JSON object",
                    ));
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|r| AppError::new(r.status(), r.body_text()))?;
            for (name, value) in pairs {
                body.insert_field(&name, value);
            }
        }

        Ok(Self::Fields(body))
    }
}

/// Collect the request payload, buffering every admitted file part.
///
/// The first rejected part aborts parsing.
pub async fn parse_upload(
    upload: UploadBody,
    field: &FileField,
) -> Result<ParsedUpload, UploadError> {
    let mut multipart = match upload {
        UploadBody::Multipart(multipart) => multipart,
        UploadBody::Fields(body) => {
            return Ok(ParsedUpload {
                body,
                files: Vec::new(),
            });
        }
    };
    let mut parsed = ParsedUpload::default();

    while let Some(part) = multipart.next_field().await? {
        let name = part.name().unwrap_or_default().to_owned();

        let Some(filename) = part.file_name().map(str::to_owned) else {
            let value = part.text().await?;
            parsed.body.insert_field(&name, value);
            continue;
        };

        field.admit(&name, &filename, parsed.files.len())?;

        let content_type = part.content_type().map(str::to_owned);
        let data = part.bytes().await?;
        debug!(
            field = %name,
            filename = %filename,
            size = data.len(),
            "buffered file part"
        );

        parsed.files.push(UploadedFile::new(
            name,
            filename,
            content_type.as_deref(),
            data,
        ));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_pattern_is_case_sensitive_and_anchored() {
        for ok in ["a.jpg", "a.jpeg", "a.png", "dir.v2.png", ".png"] {
            assert!(is_static_image(ok), "{ok}");
        }
        for bad in ["a.JPG", "a.png.txt", "a.gif", "png", "a.pngx", "a_png"] {
            assert!(!is_static_image(bad), "{bad}");
        }
    }

    #[test]
    fn image_filter_rejects_with_unsupported_media_type() {
        assert!(image_file_filter("cat.png").is_ok());
        assert!(matches!(
            image_file_filter("cat.gif"),
            Err(UploadError::UnsupportedMediaType)
        ));
    }

    #[test]
    fn admit_enforces_name_count_and_filters() {
        let field = FileField::many("images", 2).with_filter(image_file_filter);

        assert!(field.admit("images", "a.png", 0).is_ok());
        assert!(matches!(
            field.admit("other", "a.png", 0),
            Err(UploadError::UnexpectedField)
        ));
        assert!(matches!(
            field.admit("images", "a.png", 2),
            Err(UploadError::UnexpectedField)
        ));
        assert!(matches!(
            field.admit("images", "a.txt", 1),
            Err(UploadError::UnsupportedMediaType)
        ));
    }
}
