//! Error taxonomy for a digest run.
//!
//! Not every variant is fatal. The pipeline turns fetch failures into a quiet
//! early exit and generation failures into per-article error markers; the rest
//! abort the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("invalid value for {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NewsAPI returned status {status:?}: {message}")]
    NewsApiStatus { status: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Gemini API error: {0}")]
    Generation(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("failed to build mail message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
