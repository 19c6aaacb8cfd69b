pub mod multipart;
pub mod upload_service;
pub mod validation;
