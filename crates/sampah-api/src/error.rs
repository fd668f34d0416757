use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use validator::ValidationErrors;

use sampah_types::api::ErrorBody;

use crate::lifecycle::TransitionError;

/// Every handler error, rendered as `{"error": "..."}`.
///
/// Resources owned by another user surface as `NotFound`, never as
/// `Forbidden`, so callers cannot discover other users' ids.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", field_messages(.0))]
    Invalid(#[from] ValidationErrors),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Admin access required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("{}", .0.body_text())]
    MultipartForm(#[from] MultipartRejection),

    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Invalid(_)
            | Self::DuplicateEmail
            | Self::Transition(_)
            | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Multipart(e) => e.status(),
            Self::MultipartForm(rejection) => rejection.status(),
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(source: anyhow::Error) -> Self {
        Self::Internal {
            message: "Internal server error",
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { message, source } = &self {
            error!("{}: {:#}", message, source);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Every failed rule's message, sorted so the output is stable.
fn field_messages(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Attach a client-facing message to an infrastructure failure.
pub trait InternalExt<T> {
    fn internal(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E> InternalExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn internal(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Internal {
            message,
            source: e.into(),
        })
    }
}
