use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("Method {method} does not exist on the area selector")]
    UnknownMethod { method: String },

    #[error("invalid arguments for {method}: {message}")]
    InvalidArguments { method: String, message: String },

    #[error("area selector has been destroyed")]
    Destroyed,

    #[error("submission needs at least one box or the entire-image flag")]
    EmptySubmission,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AnnotateError {
    pub fn invalid_arguments(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.to_owned(),
            message: message.into(),
        }
    }
}
