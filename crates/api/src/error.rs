//! Maps every error this crate can produce onto an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("workflow validation failed: {0}")]
    Validation(#[from] engine::ValidationError),

    #[error(transparent)]
    Trigger(#[from] engine::TriggerError),

    #[error("database error: {0}")]
    Db(#[from] db::DbError),

    #[error("scheduler error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("execution store error: {0}")]
    Store(#[from] engine::StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Trigger(_) => StatusCode::BAD_REQUEST,
            ApiError::Queue(_) => StatusCode::BAD_REQUEST,
            ApiError::Db(db::DbError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(status_of(ApiError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_maps_to_400() {
        assert_eq!(status_of(ApiError::BadRequest("bad".into())), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn db_not_found_maps_to_404_not_500() {
        assert_eq!(status_of(ApiError::Db(db::DbError::NotFound)), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_db_errors_map_to_500() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{bad json").unwrap_err();
        assert_eq!(status_of(ApiError::Db(db::DbError::Serde(serde_err))), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
