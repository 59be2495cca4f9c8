use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::orchestration::{SelectionError, SettlementError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Well-formed request rejected by the competition rules.
    #[error("Unprocessable: {0}")]
    Unprocessable(String, serde_json::Value),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<SelectionError> for AppError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::InvalidRoster(check) => AppError::Unprocessable(
                "invalid roster".to_string(),
                serde_json::to_value(&check).unwrap_or(serde_json::Value::Null),
            ),
            SelectionError::ChipUnavailable(reason) => {
                AppError::Unprocessable(reason, serde_json::Value::Null)
            }
            SelectionError::Store(err) => AppError::from(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unprocessable(msg, details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg,
                Some(details).filter(|d| !d.is_null()),
            ),
        };

        let body = match details {
            Some(details) => json!({ "error": error_message, "details": details }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::RosterCheck;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Unprocessable("x".into(), serde_json::Value::Null),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_selection_errors_map_to_unprocessable() {
        let err: AppError = SelectionError::InvalidRoster(RosterCheck::default()).into();
        assert!(matches!(err, AppError::Unprocessable(_, serde_json::Value::Object(_))));

        let err: AppError = SelectionError::ChipUnavailable("used".into()).into();
        assert!(matches!(err, AppError::Unprocessable(ref m, serde_json::Value::Null) if m == "used"));

        let err: AppError = SelectionError::Store(StoreError::Corrupt("bad".into())).into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
