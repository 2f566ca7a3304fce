// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod attendance;
pub mod auth;
pub mod cleaning;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leaves;
pub mod maintenance;
pub mod media;
pub mod reservations;
pub mod rollover;
pub mod rooms;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hotel_common::DomainError;
use serde_json::{json, Map, Value};
use validator::ValidationErrors;

// --- Custom Error Handling ---

/// Error returned by every handler, rendered as `{"error": ..., "fields": ...}`.
#[derive(Debug)]
pub struct AppError {
    pub(crate) code: StatusCode,
    pub(crate) message: String,
    pub(crate) fields: Option<Value>,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            fields: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let code = match err {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) | DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
        Self::new(code, &err.to_string())
    }
}

/// Allows converting an `anyhow::Error` (coming from the database layer)
/// into our `AppError`. Domain errors and constraint violations keep their
/// meaning, everything else becomes a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return Self::from(domain.clone());
        }
        if let Some(sqlx::Error::Database(db)) = err.downcast_ref::<sqlx::Error>() {
            if db.is_unique_violation() {
                return Self::conflict("A record with the same unique value already exists.");
            }
            if db.is_foreign_key_violation() {
                return Self::bad_request("A referenced record does not exist.");
            }
        }

        tracing::error!("Internal server error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred.",
        )
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields: Map<String, Value> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value ({}).", e.code),
                    })
                    .collect();
                (field.to_string(), json!(messages))
            })
            .collect();

        Self {
            code: StatusCode::BAD_REQUEST,
            message: "Validation failed.".to_string(),
            fields: Some(Value::Object(fields)),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.code.is_server_error() {
            tracing::error!(
                "Responding with error: status_code={}, message={}",
                self.code.as_u16(),
                self.message
            );
        } else {
            tracing::debug!(
                "Responding with error: status_code={}, message={}",
                self.code.as_u16(),
                self.message
            );
        }

        let body = match self.fields {
            Some(fields) => json!({ "error": self.message, "fields": fields }),
            None => json!({ "error": self.message }),
        };
        (self.code, Json(body)).into_response()
    }
}

/// `{"message": ...}` body for mutations without a natural payload.
pub(crate) fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}


#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Too short."))]
        name: String,
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("Room", 3), StatusCode::NOT_FOUND),
            (DomainError::conflict("taken"), StatusCode::CONFLICT),
            (DomainError::transition("reservation", "cancelled", "confirm"), StatusCode::CONFLICT),
            (DomainError::forbidden("no"), StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).code, expected);
        }
    }

    #[test]
    fn domain_error_survives_anyhow_context() {
        let err = anyhow::Error::new(DomainError::conflict("Room already booked."))
            .context("while creating a reservation");
        let app = AppError::from(err);
        assert_eq!(app.code, StatusCode::CONFLICT);
        assert_eq!(app.message, "Room already booked.");
    }

    #[test]
    fn unknown_errors_are_hidden() {
        let app = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(app.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.message, "An internal error occurred.");
    }

    #[test]
    fn validation_errors_list_fields() {
        let errors = Sample { name: "ab".to_string() }.validate().unwrap_err();
        let app = AppError::from(errors);
        assert_eq!(app.code, StatusCode::BAD_REQUEST);
        assert_eq!(app.fields.unwrap()["name"][0], "Too short.");
    }
}
