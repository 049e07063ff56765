//! JSON error bodies shared by all handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use epg_cache_core::QueryError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a query error to its status code and `{ "error": ... }` body.
pub fn api_error(err: QueryError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
        error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use epg_cache_core::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (QueryError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (QueryError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (QueryError::Conflict("busy".into()), StatusCode::CONFLICT),
            (
                QueryError::ServiceUnavailable("off".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                QueryError::Store(StoreError::Database("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, Json(body)) = api_error(err);
            assert_eq!(status, expected);
            assert!(!body.error.is_empty());
        }
    }
}
