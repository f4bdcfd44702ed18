//! JSON error envelope: `{error, code, field?, currentStatus?}`
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vigil_core::VigilError;

#[derive(Debug)]
pub struct ApiError(pub VigilError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<VigilError> for ApiError {
    fn from(err: VigilError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(VigilError::invalid_field("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(VigilError::invalid_field("query", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(VigilError::invalid_field("id", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let mut body = json!({
            "error": err.to_string(),
            "code": err.code(),
        });
        if let Some(field) = err.field() {
            body["field"] = json!(field);
        }
        if let Some(current) = err.current_status() {
            body["currentStatus"] = json!(current);
        }
        (status, Json(body)).into_response()
    }
}
