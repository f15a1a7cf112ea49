//! Uniform JSON envelope for every API response

use catalog_core::Error;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use serde::Serialize;

const INTERNAL_ERROR_BODY: &[u8] =
    br#"{"success":false,"message":"Internal server error","data":null,"statusCode":500}"#;

/// `{ success, message, data, statusCode }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub status_code: u16,
}

impl<T> ServiceResponse<T> {
    /// Successful response; pass `200` unless the operation created something
    pub fn success(message: impl Into<String>, data: T, status_code: u16) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            status_code,
        }
    }

    /// Failed response; clients usually get `400`
    pub fn failure(message: impl Into<String>, data: T, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
            status_code,
        }
    }
}

impl<T> ServiceResponse<Option<T>> {
    /// Failure carrying the error's message and HTTP status
    pub fn from_error(err: &Error) -> Self {
        Self::failure(err.message.clone(), None, err.http_status())
    }
}

impl<T: Serialize> ServiceResponse<T> {
    /// Render as an HTTP response carrying `status_code`
    pub fn into_http(self) -> Response<Body> {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match serde_json::to_vec(&self) {
            Ok(bytes) => json_response(status, bytes),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                json_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.to_vec())
            }
        }
    }
}

/// Failure envelope for an error raised while serving `context`
///
/// The message reads `<context>: <error message>` and the status comes from
/// the error code.
pub fn exception_response<T>(err: &Error, context: &str) -> ServiceResponse<Option<T>> {
    let status = err.http_status();
    if status >= 500 {
        tracing::error!(code = %err.code, error = %err.message, "{}", context);
    }
    ServiceResponse::failure(format!("{}: {}", context, err.message), None, status)
}

/// Bare JSON response with the given status
pub(crate) fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
