use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Post not found")]
    PostNotFound,

    #[error("{0}")]
    UpdateRejected(String),

    #[error("store error: {0}")]
    Store(#[from] cork_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::UpdateRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::PostNotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Map a body extraction failure. Oversized bodies keep their 413; every
/// other rejection goes through `otherwise`.
pub(crate) fn body_rejection(
    status: StatusCode,
    message: String,
    otherwise: fn(String) -> ServerError,
) -> ServerError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(message)
    } else {
        otherwise(message)
    }
}

impl From<cork_types::TypeError> for ServerError {
    fn from(e: cork_types::TypeError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cork_types::TypeError;

    #[test]
    fn status_mapping() {
        assert_eq!(ServerError::PostNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::UpdateRejected("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let store = cork_store::StoreError::Unavailable("down".into());
        assert_eq!(
            ServerError::from(store).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn oversized_body_keeps_413() {
        let e = body_rejection(
            StatusCode::PAYLOAD_TOO_LARGE,
            "too big".into(),
            ServerError::BadRequest,
        );
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let e = body_rejection(
            StatusCode::UNPROCESSABLE_ENTITY,
            "bad".into(),
            ServerError::UpdateRejected,
        );
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_message_passes_through() {
        let e = ServerError::from(TypeError::MissingRequiredFields);
        assert_eq!(e.to_string(), "Title and content are required fields");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }
}
