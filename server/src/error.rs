use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use depot::DepotError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid status value")]
    InvalidStatus,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("complaint is already resolved")]
    AllocationInvalid,

    #[error("store error: {0}")]
    Persistence(#[from] DepotError),

    #[error("session store error: {0}")]
    Session(#[from] redis::RedisError),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("password hashing failed")]
    Hashing,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation { .. } | AppError::InvalidStatus => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AllocationInvalid => StatusCode::CONFLICT,
            AppError::Persistence { .. }
            | AppError::Session { .. }
            | AppError::Encoding { .. }
            | AppError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Collaborator failures keep their detail in the logs only.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (AppError::Validation("missing field".into()), 400),
            (AppError::InvalidStatus, 400),
            (AppError::Unauthenticated("not authenticated"), 401),
            (AppError::Forbidden("wrong department"), 403),
            (AppError::NotFound("complaint"), 404),
            (AppError::AllocationInvalid, 409),
        ];

        for (err, code) in cases {
            assert_eq!(err.into_response().status().as_u16(), code);
        }
    }
}
