//! Error types for the Billing API.
//!
//! Every failure leaves the server as a JSON body `{ "code", "message" }`
//! with the status code owned by its [`ErrorCode`].

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dine_core::{CoreError, ValidationError};
use dine_db::DbError;

/// Machine-readable error category sent to the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Conflict,
    NotFound,
    Unauthorized,
    Forbidden,
    AllocationExhausted,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    /// HTTP status for this category.
    ///
    /// Conflicts are 400s: the web client re-reads the order and resumes at
    /// the right step instead of treating them as fatal.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::Conflict => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::AllocationExhausted
            | ErrorCode::DatabaseError
            | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Billing API error.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::new(ErrorCode::ValidationError, error.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        let code = match &error {
            CoreError::OrderNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidOrderStatus { .. }
            | CoreError::OrderChanged { .. }
            | CoreError::TableHasBilledOrder { .. } => ErrorCode::Conflict,
            CoreError::BillNumberExhausted { .. } => ErrorCode::AllocationExhausted,
            CoreError::Validation(inner) => {
                return ApiError::new(ErrorCode::ValidationError, inner.to_string())
            }
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { .. } => ApiError::not_found(error.to_string()),
            other => {
                tracing::error!(error = %other, "Storage error");
                ApiError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::ValidationError, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(ErrorCode::ValidationError, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(ErrorCode::ValidationError, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dine_core::OrderStatus;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::OrderNotFound("abc".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::InvalidOrderStatus {
            order_id: "abc".into(),
            current_status: OrderStatus::Billed,
            operation: "generate bill",
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.http_status(), StatusCode::BAD_REQUEST);

        let err: ApiError = CoreError::OrderChanged {
            order_id: "abc".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = CoreError::BillNumberExhausted { attempts: 5 }.into();
        assert_eq!(err.code, ErrorCode::AllocationExhausted);
        assert_eq!(err.code.http_status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "items".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "items is required");
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_error_code_serializes_screaming() {
        let json = serde_json::to_value(ApiError::not_found("gone")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "gone");
    }
}
