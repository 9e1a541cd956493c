//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; error bodies are JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pideai_core::GroupError;
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation was refused.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<GroupError>>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                CartError::SelectionRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::UnknownModifier(_) | CartError::UnknownGroup(_) => {
                    StatusCode::BAD_REQUEST
                }
                CartError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            _ if status.is_server_error() => ErrorBody {
                error: "Internal server error".to_string(),
                errors: None,
            },
            Self::Cart(CartError::SelectionRejected(errors)) => ErrorBody {
                error: "Selection does not satisfy the product's options".to_string(),
                errors: Some(errors),
            },
            other => ErrorBody {
                error: other.to_string(),
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Record a breadcrumb on the current Sentry scope.
///
/// Breadcrumbs ride along with the next captured event, so a failed cart
/// write shows the cart operations that led up to it.
pub fn add_breadcrumb(
    category: &str,
    message: &str,
    data: impl IntoIterator<Item = (String, serde_json::Value)>,
) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    breadcrumb.data.extend(data);

    sentry::add_breadcrumb(breadcrumb);
}
