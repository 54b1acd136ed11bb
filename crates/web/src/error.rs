use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Self::Storage(StorageError::ForbiddenTransition { .. }) => StatusCode::CONFLICT,
            Self::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            Self::Storage(StorageError::Configuration(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Storage failures outside the domain variants are
    /// logged here and reported opaquely.
    fn message(&self) -> String {
        match self {
            Self::Storage(StorageError::NotFound) => "Resource not found".to_string(),
            Self::Storage(
                e @ (StorageError::Validation(_)
                | StorageError::PermissionDenied(_)
                | StorageError::ForbiddenTransition { .. }
                | StorageError::ConstraintViolation(_)
                | StorageError::Configuration(_)),
            ) => e.to_string(),
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                "An internal error occurred".to_string()
            }
            Self::Validation(_) => "Validation failed".to_string(),
            Self::Unauthorized => "Missing or invalid credentials".to_string(),
        }
    }

    fn field_errors(errors: &ValidationErrors) -> Vec<String> {
        errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let reason = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, reason)
                })
            })
            .collect()
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message() });
        if let Self::Validation(errors) = &self {
            body["details"] = json!(Self::field_errors(errors));
        }

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::models::SessionStatus;

    #[test]
    fn test_storage_errors_map_to_http_statuses() {
        let cases = [
            (StorageError::NotFound, StatusCode::NOT_FOUND),
            (
                StorageError::Validation("bad arrow".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::PermissionDenied("locked".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                StorageError::ForbiddenTransition {
                    from: SessionStatus::Confirmed,
                    to: SessionStatus::Preliminary,
                },
                StatusCode::CONFLICT,
            ),
            (
                StorageError::Configuration("no ranges".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(WebError::from(error).into_response().status(), expected);
        }
    }

    #[test]
    fn test_unauthorized() {
        assert_eq!(
            WebError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
