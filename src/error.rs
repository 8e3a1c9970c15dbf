//! Errors raised by route handlers and how they surface on the wire.

use crate::files::PathError;
use crate::http::response::{Response, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing route parameter {0:?}")]
    MissingParam(&'static str),
    #[error("{0}")]
    Fault(String),
}

impl HandlerError {
    /// Status the connection answers with when a handler fails this way.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Path(PathError::Traversal { .. }) => StatusCode::Forbidden,
            HandlerError::Path(PathError::ParentMissing { .. }) => StatusCode::NotFound,
            _ => StatusCode::InternalServerError,
        }
    }

    pub fn into_response(self) -> Response {
        match self.status() {
            StatusCode::Forbidden => Response::forbidden(),
            StatusCode::NotFound => Response::not_found(),
            _ => Response::internal_error(),
        }
    }
}
