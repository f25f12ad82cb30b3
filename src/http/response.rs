//! JSON envelope shared by every endpoint
//!
//! ```json
//! { "codeSystem": "CVS", "code": "00", "message": "success", "result": { ... } }
//! { "codeSystem": "CVS", "code": "4001", "messageError": "quantity is required", "result": "" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::commands::{self, ErrorKind};

/// Identifies this service in every response
pub const CODE_SYSTEM: &str = "CVS";

const CODE_SUCCESS: &str = "00";
const CODE_VALIDATION_FAILED: &str = "4001";
const CODE_INTERNAL_SERVER: &str = "5001";
const CODE_DATABASE: &str = "5002";
const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    code_system: &'static str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_error: Option<String>,
    result: T,
}

/// Successful response carrying `T` as its result
#[derive(Debug)]
pub struct ApiSuccess<T>(pub T);

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            code_system: CODE_SYSTEM,
            code: CODE_SUCCESS,
            message: Some("success"),
            message_error: None,
            result: self.0,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// The request could not be decoded
    BadRequest(String),
    Command(commands::Error),
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        Self::Command(err)
    }
}

impl From<crate::domain::validation::ValidationError> for ApiError {
    fn from(err: crate::domain::validation::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        let err = match self {
            ApiError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, CODE_VALIDATION_FAILED, message)
            }
            ApiError::Command(err) => err,
        };

        match err.kind() {
            ErrorKind::Validation => (
                StatusCode::BAD_REQUEST,
                CODE_VALIDATION_FAILED,
                err.to_string(),
            ),
            // Domain failures keep their user-facing message
            ErrorKind::NotFound | ErrorKind::BusinessRule => (
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL_SERVER,
                err.to_string(),
            ),
            ErrorKind::System => {
                error!(error = ?err, "request failed");
                let code = match err {
                    commands::Error::Database(_) => CODE_DATABASE,
                    _ => CODE_INTERNAL_SERVER,
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    GENERIC_FAILURE.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = Envelope {
            code_system: CODE_SYSTEM,
            code,
            message: None,
            message_error: Some(message),
            result: "",
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::validation::ValidationError,
        ports::database::{self, Entity},
    };
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(
        ApiError::BadRequest("Invalid".to_string()),
        StatusCode::BAD_REQUEST,
        "4001",
        "Invalid"
    )]
    #[case(
        ApiError::Command(ValidationError::required("quantity").into()),
        StatusCode::BAD_REQUEST,
        "4001",
        "quantity is required"
    )]
    #[case(
        ApiError::Command(commands::Error::NotFound(Entity::Customer)),
        StatusCode::INTERNAL_SERVER_ERROR,
        "5001",
        "customer not found"
    )]
    #[case(
        ApiError::Command(commands::Error::InsufficientPoints),
        StatusCode::INTERNAL_SERVER_ERROR,
        "5001",
        "not enough points to redeem"
    )]
    #[case(
        ApiError::Command(commands::Error::Database(database::Error::Adapter("secret detail".into()))),
        StatusCode::INTERNAL_SERVER_ERROR,
        "5002",
        "Something went wrong"
    )]
    #[case(
        ApiError::Command(commands::Error::RedemptionConflict { customer_id: 1, attempts: 3 }),
        StatusCode::INTERNAL_SERVER_ERROR,
        "5001",
        "Something went wrong"
    )]
    fn test_error_parts(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] code: &'static str,
        #[case] message: &str,
    ) {
        let (actual_status, actual_code, actual_message) = err.parts();

        assert_that!(actual_status).is_equal_to(status);
        assert_that!(actual_code).is_equal_to(code);
        assert_that!(actual_message.as_str()).is_equal_to(message);
    }
}
