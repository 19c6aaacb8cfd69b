//! Data models for the upload routes.
//!
//! Nothing here outlives a request; the types only carry what was received
//! and serialize what is echoed back as JSON via `serde`.

pub mod upload;
