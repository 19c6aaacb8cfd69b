//! Per-request upload data: the buffered file parts, the form payload that
//! travels alongside them, and the JSON shapes echoed back to the client.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single file part, fully buffered.
///
/// Lives only for the duration of one request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Name of the multipart field the file arrived under.
    pub field_name: String,

    /// Filename as declared by the client.
    pub original_name: String,

    /// Declared `Content-Type` of the part, or a guess based on the filename.
    pub mime_type: String,

    /// Raw payload.
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(
        field_name: impl Into<String>,
        original_name: impl Into<String>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Self {
        let original_name = original_name.into();
        let mime_type = content_type
            .map(str::to_owned)
            .unwrap_or_else(|| mime_from_filename(&original_name).to_owned());

        Self {
            field_name: field_name.into(),
            original_name,
            mime_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Payload decoded as UTF-8; invalid sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

fn mime_from_filename(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Free-form form payload sent next to the file parts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormBody(pub Map<String, Value>);

impl FormBody {
    /// Record a text part. A part named `body` holding a JSON object is
    /// spread into the payload; anything else is kept as a string.
    pub fn insert_field(&mut self, name: &str, value: String) {
        if name == "body" {
            if let Ok(Value::Object(entries)) = serde_json::from_str::<Value>(&value) {
                self.0.extend(entries);
                return;
            }
        }
        self.0.insert(name.to_owned(), Value::String(value));
    }
}

/// Response for the single-file routes.
#[derive(Debug, Serialize)]
pub struct FileEcho {
    pub body: FormBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImageSummary {
    pub originalname: String,
    pub size: u64,
}

impl From<&UploadedFile> for ImageSummary {
    fn from(file: &UploadedFile) -> Self {
        Self {
            originalname: file.original_name.clone(),
            size: file.size(),
        }
    }
}

/// Response for `/file/images`; `images` is always present.
#[derive(Debug, Serialize)]
pub struct ImagesEcho {
    pub body: FormBody,
    pub images: Vec<ImageSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declared_content_type_wins_over_extension() {
        let file = UploadedFile::new("file", "data.json", Some("text/plain"), Bytes::new());
        assert_eq!(file.mime_type, "text/plain");
    }

    #[test]
    fn mime_type_is_guessed_when_undeclared() {
        let guess = |name: &str| UploadedFile::new("f", name, None, Bytes::new()).mime_type;
        assert_eq!(guess("a.json"), "application/json");
        assert_eq!(guess("a.PNG"), "image/png");
        assert_eq!(guess("photo.jpeg"), "image/jpeg");
        assert_eq!(guess("noext"), "application/octet-stream");
    }

    #[test]
    fn text_decodes_lossily() {
        let file = UploadedFile::new("f", "a.txt", None, Bytes::from_static(b"hi\xff"));
        assert_eq!(file.text(), "hi\u{fffd}");
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn body_part_with_object_is_spread() {
        let mut body = FormBody::default();
        body.insert_field("body", r#"{"name":"x"}"#.into());
        body.insert_field("note", "plain".into());
        body.insert_field("body", "not json".into());

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "name": "x", "note": "plain", "body": "not json" })
        );
    }

    #[test]
    fn absent_file_is_omitted_from_echo() {
        let echo = FileEcho {
            body: FormBody::default(),
            file: None,
        };
        assert_eq!(serde_json::to_value(&echo).unwrap(), json!({ "body": {} }));
    }
}
