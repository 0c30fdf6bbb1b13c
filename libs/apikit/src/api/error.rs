//! Centralized mapping of handler failures to wire responses.
//!
//! Handlers return [`ApiError`] (usually through `?`); every variant renders
//! as `{"error": ...}` through [`write_json`]. Server-side faults never show
//! their detail to the client: it travels in a [`ServerFault`] response
//! extension and is logged by [`report_server_faults`] together with the
//! request method and URI.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::request::BodyError;
use crate::api::response::{write_json, Envelope};
use crate::validator::Validator;

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
    #[error("the requested resource could not be found")]
    NotFound,
    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),
    #[error("{0}")]
    BadRequest(String),
    #[error("failed validation")]
    FailedValidation(BTreeMap<String, String>),
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,
    #[error("rate limit exceeded")]
    RateLimitExceeded,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<BodyError> for ApiError {
    fn from(err: BodyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<Validator> for ApiError {
    fn from(v: Validator) -> Self {
        ApiError::FailedValidation(v.into_errors())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal(err) => {
                let mut resp = error_response(status, SERVER_ERROR_MESSAGE);
                resp.extensions_mut()
                    .insert(ServerFault::new(format!("{err:#}")));
                resp
            }
            ApiError::FailedValidation(errors) => {
                tracing::debug!(status = status.as_u16(), fields = errors.len(), "failed validation");
                error_response(status, errors)
            }
            other => {
                let message = other.to_string();
                tracing::debug!(status = status.as_u16(), error = %message, "request failed");
                error_response(status, message)
            }
        }
    }
}

/// Wraps `message` in the `"error"` envelope.
///
/// If the envelope cannot be written the client gets a bare 500 with no
/// headers and no body; the writer failure itself is only recorded as a
/// [`ServerFault`].
pub fn error_response(status: StatusCode, message: impl Serialize) -> Response {
    match write_json(status, &Envelope::new("error", message), None) {
        Ok(resp) => resp,
        Err(err) => {
            let mut resp = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            resp.extensions_mut().insert(ServerFault::new(err.to_string()));
            resp
        }
    }
}

/// Full detail of a server-side failure, attached to the response it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFault(String);

impl ServerFault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    pub fn detail(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logs `err` along with the request method and target URI.
pub fn log_error(method: &Method, uri: &Uri, err: &dyn fmt::Display) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    tracing::error!(method = %method, uri = %target, "{err}");
}

/// Middleware: logs and strips the [`ServerFault`] of every response that carries one.
pub async fn report_server_faults(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let mut resp = next.run(req).await;
    if let Some(fault) = resp.extensions_mut().remove::<ServerFault>() {
        log_error(&method, &uri, &fault);
    }
    resp
}
