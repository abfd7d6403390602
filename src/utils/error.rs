use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};
use validator::ValidationErrors;

use super::response::ErrorResponse;
use crate::domain::thermometer::ThermometerError;

/// Application-wide HTTP error
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalError(String),
    ValidationError(String),
    JsonParseFailed(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::InternalError(msg) => msg.clone(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::JsonParseFailed(msg) => format!("Malformed request: {}", msg),
        }
    }

    pub fn error_code(&self) -> String {
        match self {
            AppError::BadRequest(_) => "COMMON400",
            AppError::NotFound(_) => "THERMO404",
            AppError::Conflict(_) => "THERMO409",
            AppError::InternalError(_) => "COMMON500",
            AppError::ValidationError(_) => "COMMON400",
            AppError::JsonParseFailed(_) => "COMMON400",
        }
        .to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::JsonParseFailed(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.message();

        match &self {
            AppError::InternalError(_) => {
                error!("Internal Server Error: {}", message);
            }
            _ => {
                warn!("Error [{}]: {}", error_code, message);
            }
        }

        let error_response = ErrorResponse::new(error_code, message);

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::JsonParseFailed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Joins every field message of a failed `validate()`
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationError(messages.join(", "))
    }
}

impl From<ThermometerError> for AppError {
    fn from(err: ThermometerError) -> Self {
        match err {
            ThermometerError::AlreadyActive { .. } | ThermometerError::AlreadyInactive { .. } => {
                AppError::Conflict(err.to_string())
            }
            ThermometerError::NotRegistered { .. } => AppError::NotFound(err.to_string()),
            ThermometerError::Configuration(e) => AppError::BadRequest(e.to_string()),
            ThermometerError::Registry(e) => AppError::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::thermometer::ConfigurationError;
    use crate::monitoring::RegistryError;

    #[test]
    fn should_map_thermometer_errors_to_http() {
        let cases = [
            (
                ThermometerError::AlreadyActive {
                    thermometer_id: "T1".into(),
                    channel_id: "C1".into(),
                },
                StatusCode::CONFLICT,
                "THERMO409",
            ),
            (
                ThermometerError::NotRegistered {
                    thermometer_id: "T1".into(),
                    channel_id: "C1".into(),
                },
                StatusCode::NOT_FOUND,
                "THERMO404",
            ),
            (
                ThermometerError::Configuration(ConfigurationError::InvertedRange {
                    min: 40.0,
                    max: 20.0,
                }),
                StatusCode::BAD_REQUEST,
                "COMMON400",
            ),
            (
                ThermometerError::Registry(RegistryError::Storage("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON500",
            ),
        ];

        for (err, status, code) in cases {
            let app_error = AppError::from(err);
            assert_eq!(app_error.status_code(), status);
            assert_eq!(app_error.error_code(), code);
        }
    }
}
