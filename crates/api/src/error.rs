//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or unusable caller identity.
    Unauthorized(String),
    /// The caller's role does not permit the operation.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Transaction core error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong, please try again".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::EmptyCart
        | CheckoutError::MissingField(_)
        | CheckoutError::InvalidPaymentMethod(_)
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::NotCancellable { .. }
        | CheckoutError::Cart(_)
        | CheckoutError::Stock(_) => (StatusCode::BAD_REQUEST, err.to_string()),

        CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }

        CheckoutError::NotOrderOwner(_) => (StatusCode::UNAUTHORIZED, err.to_string()),

        CheckoutError::Status(_) => (StatusCode::CONFLICT, err.to_string()),

        // Infrastructure failures are not leaked to clients.
        CheckoutError::Timeout | CheckoutError::Store(_) => {
            tracing::error!(error = %err, "transaction infrastructure failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, please try again".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
