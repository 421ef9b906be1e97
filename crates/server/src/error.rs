use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use classroom_api::{ApiError, ServiceError, service::MSG_UNEXPECTED};
use std::fmt;

/// Unified API error type.
///
/// Produces `{"error": "<message>"}` JSON responses. Unexpected failures are
/// logged and surface only as `Unexpected error occurred.`
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn gone(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::GONE, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Build a closure that logs a DB/IO error and returns `500 Internal Server Error`.
    pub fn from_db<E: fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| {
            tracing::error!("{context}: {e}");
            Self::internal(MSG_UNEXPECTED)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ServiceError> for ApiErr {
    fn from(e: ServiceError) -> Self {
        if let ServiceError::Internal(detail) = &e {
            tracing::error!("service error: {detail}");
            return Self::internal(MSG_UNEXPECTED);
        }
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.message())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiError {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_keep_status_and_message() {
        let err = ApiErr::from(ServiceError::Forbidden("nope".into()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "nope");

        let err = ApiErr::from(ServiceError::Gone("expired".into()));
        assert_eq!(err.status(), StatusCode::GONE);
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiErr::from(ServiceError::Internal("RNG failure: boom".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), MSG_UNEXPECTED);

        let err = ApiErr::from_db("lookup user")("no such table: users");
        assert_eq!(err.message(), MSG_UNEXPECTED);
    }
}
