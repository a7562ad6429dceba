use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::data::DataError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: DataError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    // Not-found and review conflicts keep their own status codes.
    pub fn from_data(message: &'static str) -> impl FnOnce(DataError) -> ApiError {
        move |err| match err {
            DataError::NotFound(what) => ApiError::NotFound(what),
            DataError::AlreadyReviewed { current } => ApiError::Conflict(format!(
                "Verification has already been {}",
                current.as_str()
            )),
            source => ApiError::Upstream { message, source },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Upstream { message, source } = self {
            log::error!("{message}: {source}");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;

    #[test]
    fn upstream_errors_hide_the_source() {
        let err = ApiError::from_data("Failed to fetch users")(DataError::Database(
            sqlx::Error::PoolTimedOut,
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch users");
    }

    #[test]
    fn not_found_and_conflict_keep_their_status() {
        let missing = ApiError::from_data("Failed to fetch verification")(DataError::NotFound(
            "Verification not found",
        ));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let conflict = ApiError::from_data("Failed to update verification")(
            DataError::AlreadyReviewed {
                current: VerificationStatus::Rejected,
            },
        );
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.to_string(), "Verification has already been rejected");
    }
}
