use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{catch, Request};
use serde::Serialize;
use thiserror::Error;

use std::sync::PoisonError;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Locked(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("poisoned lock: {0}")]
    Poisoned(String),
}

impl<T> From<PoisonError<T>> for InternalError {
    fn from(e: PoisonError<T>) -> InternalError {
        InternalError::Poisoned(e.to_string())
    }
}

impl InternalError {
    pub fn validation(what: impl Into<String>) -> InternalError {
        InternalError::Validation(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> InternalError {
        InternalError::Conflict(what.into())
    }

    pub fn not_found(entity: &str, id: i64) -> InternalError {
        InternalError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn status(&self) -> Status {
        match self {
            InternalError::Validation(_) => Status::BadRequest,
            InternalError::NotFound(_) => Status::NotFound,
            InternalError::Conflict(_) | InternalError::Locked(_) => Status::Conflict,
            InternalError::Database(_)
            | InternalError::Serialization(_)
            | InternalError::Poisoned(_) => Status::InternalServerError,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InternalError::Validation(_) => "validation",
            InternalError::NotFound(_) => "not_found",
            InternalError::Conflict(_) => "conflict",
            InternalError::Locked(_) => "locked",
            InternalError::Database(_)
            | InternalError::Serialization(_)
            | InternalError::Poisoned(_) => "internal",
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
}

impl<'r> Responder<'r, 'static> for InternalError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        // Storage failures are logged in full but never echoed to the client.
        let detail = if status == Status::InternalServerError {
            tracing::error!(error = %self, uri = %request.uri(), "request failed");
            String::from("internal server error")
        } else {
            tracing::debug!(error = %self, uri = %request.uri(), "request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            error: self.kind(),
            detail,
        };

        (status, Json(body)).respond_to(request)
    }
}

pub type InternalResult<T> = Result<T, InternalError>;

/// Errors raised by Rocket itself, such as an unknown route or a body that
/// does not deserialize, answered in the same shape as `InternalError`.
#[catch(404)]
pub fn not_found(request: &Request) -> (Status, Json<ErrorBody>) {
    (
        Status::NotFound,
        Json(ErrorBody {
            error: "not_found",
            detail: format!("No route for {} {}", request.method(), request.uri()),
        }),
    )
}

#[catch(422)]
pub fn unprocessable(_request: &Request) -> (Status, Json<ErrorBody>) {
    (
        Status::UnprocessableEntity,
        Json(ErrorBody {
            error: "validation",
            detail: String::from("Request body is missing fields or has the wrong types"),
        }),
    )
}

#[catch(default)]
pub fn fallback(status: Status, _request: &Request) -> (Status, Json<ErrorBody>) {
    let error = match status.code {
        400..=499 => "validation",
        _ => "internal",
    };

    (
        status,
        Json(ErrorBody {
            error,
            detail: status.reason_lossy().to_string(),
        }),
    )
}
