use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::repo::RepoError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the service reports to a caller
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// The subscription is already active
    #[error("{0}")]
    Conflict(String),

    /// Unknown or inactive token, or an unknown city
    #[error("{0}")]
    NotFound(String),

    /// Third-party weather provider failure
    #[error("{0}")]
    Upstream(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error.cause_chain = ?e, "Database error");
        Self::Internal("Database error".into())
    }
}

impl From<RepoError> for Error {
    fn from(e: RepoError) -> Self {
        match e {
            // A concurrent subscribe won the race for the same (email, city)
            RepoError::UniqueViolation => Self::Conflict("Already subscribed".into()),
            RepoError::Database(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error.cause_chain = ?e, "Unexpected error");
        Self::Internal("Unexpected error".into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(ErrorBody { error: &message })
    }
}
