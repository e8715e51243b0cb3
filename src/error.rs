use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by post writes and dashboard actions.
///
/// Read paths of the post repository never return this type: they log and
/// degrade to an empty result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// A slug that cannot be used as a file name in the posts directory.
    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    /// A submitted form field was rejected.
    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// The requested post or page does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status used when the error reaches a dashboard response
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidSlug(_) | Error::InvalidField { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Io(_) | Error::Yaml(_) | Error::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
