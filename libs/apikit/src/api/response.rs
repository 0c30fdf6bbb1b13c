use std::borrow::Cow;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::api::error::ApiError;

pub const APPLICATION_JSON: &str = "application/json";

/// Single-key wrapper every response body is rendered through,
/// e.g. `{"movie": {...}}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    key: Cow<'static, str>,
    payload: T,
}

impl<T> Envelope<T> {
    pub fn new(key: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.payload)?;
        map.end()
    }
}

/// Renders `data` as tab-indented JSON followed by a newline.
///
/// `headers` are applied first (replacing same-named entries), then the
/// JSON content type. Nothing is produced when serialization fails.
pub fn write_json<T: Serialize>(
    status: StatusCode,
    data: &Envelope<T>,
    headers: Option<HeaderMap>,
) -> Result<Response, serde_json::Error> {
    let mut js = Vec::with_capacity(128);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut js, formatter);
    data.serialize(&mut ser)?;
    js.push(b'\n');

    let mut resp = Response::new(Body::from(js));
    if let Some(headers) = headers {
        resp.headers_mut().extend(headers);
    }
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    *resp.status_mut() = status;
    Ok(resp)
}

/// Success-path helper for handlers: a serialization failure becomes a 500.
pub fn respond<T: Serialize>(
    status: StatusCode,
    data: Envelope<T>,
    headers: Option<HeaderMap>,
) -> Result<Response, ApiError> {
    write_json(status, &data, headers).map_err(|e| ApiError::Internal(e.into()))
}
