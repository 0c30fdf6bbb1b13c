//! Router-level wiring for the decode/validate/respond pipeline.

use std::any::Any;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware::from_fn,
    response::{IntoResponse, Response},
    Extension, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::api::error::{report_server_faults, ApiError};
use crate::api::request::BodyLimit;
use crate::config::ApiConfig;

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for a matched path without a handler for the request method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Turns a panic inside a handler into the generic 500 response.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(panic_response as PanicHandler)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(anyhow::anyhow!("panic while handling request: {detail}")).into_response()
}

/// Request span carrying the method and path of every request.
#[allow(clippy::type_complexity)]
pub fn trace_layer() -> TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            version = ?req.version(),
        )
    })
}

/// Installs the 404/405 fallbacks, the configured body limit, panic capture,
/// server-fault reporting and request tracing on `router`.
pub fn with_pipeline<S>(router: Router<S>, config: &ApiConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(Extension(BodyLimit(config.max_body_bytes)))
        .layer(catch_panic_layer())
        .layer(from_fn(report_server_faults))
        .layer(trace_layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{ServerFault, SERVER_ERROR_MESSAGE};
    use axum::http::StatusCode;

    #[test]
    fn panic_payloads_become_server_faults() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.extensions().get::<ServerFault>().unwrap().detail(),
            "panic while handling request: boom"
        );

        let resp = panic_response(Box::new(String::from("owned boom")));
        assert!(resp
            .extensions()
            .get::<ServerFault>()
            .unwrap()
            .detail()
            .ends_with("owned boom"));

        let resp = panic_response(Box::new(17_u8));
        assert!(resp
            .extensions()
            .get::<ServerFault>()
            .unwrap()
            .detail()
            .ends_with("unknown panic payload"));
        assert!(!SERVER_ERROR_MESSAGE.contains("panic"));
    }
}
