//! Request body decoding.
//!
//! Every failure of the underlying JSON parser is narrowed into one of the
//! [`BodyError`] variants, whose `Display` output is safe to send back to the
//! client as-is. The classification runs in a fixed order: specific shapes
//! first, pass-through last.

use std::io::{self, Read};

use axum::{
    body::Body,
    extract::{FromRequest, Request},
};
use futures::StreamExt;
use serde::de::{Deserialize, DeserializeOwned, IgnoredAny};
use serde_json::error::Category;

use crate::api::error::ApiError;

/// Largest request body accepted by default (1 MiB).
pub const MAX_BODY_BYTES: u64 = 1_048_576;

/// Caller-facing decode failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    Syntax { offset: u64 },
    #[error("body contains badly-formed JSON")]
    UnexpectedEof,
    #[error("body contains incorrect JSON type for field {field:?}")]
    FieldType { field: String },
    #[error("body contains incorrect JSON type (at character {offset})")]
    Type { offset: u64 },
    #[error("body must not be empty")]
    Empty,
    #[error("body contains unknown key {0}")]
    UnknownKey(String),
    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("{0}")]
    Other(String),
    #[error("body must only contain a single JSON value")]
    TrailingData,
}

/// Raised by [`MaxBytesReader`] once the body grows past its limit.
#[derive(Debug, thiserror::Error)]
#[error("request body too large")]
struct MaxBytesError {
    limit: u64,
}

/// Bounded reader that keeps a copy of everything it hands out, so the
/// checked bytes can be decoded a second time and parser positions can be
/// mapped back to byte offsets.
struct MaxBytesReader<R> {
    inner: R,
    limit: u64,
    seen: Vec<u8>,
}

impl<R: Read> MaxBytesReader<R> {
    fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            seen: Vec::new(),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.seen
    }
}

impl<R: Read> Read for MaxBytesReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Ask for one byte more than allowed so an oversized body is noticed.
        let remaining = self.limit - self.seen.len() as u64;
        let want = buf.len().min(usize::try_from(remaining.saturating_add(1)).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..want])?;
        if n as u64 > remaining {
            return Err(io::Error::other(MaxBytesError { limit: self.limit }));
        }

        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// Decodes exactly one JSON value from `body`, reading at most [`MAX_BODY_BYTES`].
///
/// The body is first checked as a whole: syntax, truncation and the size
/// limit are reported before any mismatch with `T` is looked at. Trailing
/// content is reported last, once the value itself decoded cleanly.
///
/// # Panics
///
/// When `T` borrows from its input (`&str`, `&[u8]`, ...). Such a target can
/// never be filled from a stream, whatever the client sends, so this is a bug
/// in the caller rather than a bad request.
///
/// The panic fires when the borrowed field is actually reached; a body that
/// never gets there (`{}` for a required `&str` field) fails with the
/// ordinary decode error instead. Handlers should use [`StrictJson`], which
/// only accepts owned targets.
pub fn read_json<'de, T, R>(body: R) -> Result<T, BodyError>
where
    T: Deserialize<'de>,
    R: Read,
{
    read_json_with_limit(body, MAX_BODY_BYTES)
}

/// Same as [`read_json`] with an explicit size limit in bytes.
pub fn read_json_with_limit<'de, T, R>(body: R, limit: u64) -> Result<T, BodyError>
where
    T: Deserialize<'de>,
    R: Read,
{
    let scanned = scan(body, limit)?;
    let value = decode::<T>(&scanned.bytes)?;
    if !scanned.single {
        return Err(BodyError::TrailingData);
    }
    Ok(value)
}

/// Bytes of a well-formed JSON value and whether nothing but whitespace
/// followed it.
struct Scanned {
    bytes: Vec<u8>,
    single: bool,
}

fn scan<R: Read>(body: R, limit: u64) -> Result<Scanned, BodyError> {
    let mut reader = MaxBytesReader::new(body, limit);

    let (outcome, single) = {
        let mut de = serde_json::Deserializer::from_reader(&mut reader);
        match IgnoredAny::deserialize(&mut de) {
            Ok(_) => (Ok(()), de.end().is_ok()),
            Err(err) => (Err(err), false),
        }
    };

    let bytes = reader.into_bytes();
    match outcome {
        Ok(()) => Ok(Scanned { bytes, single }),
        Err(err) => Err(classify(err, None, &bytes)),
    }
}

fn decode<'de, T: Deserialize<'de>>(bytes: &[u8]) -> Result<T, BodyError> {
    let mut de = serde_json::Deserializer::from_reader(bytes);
    serde_path_to_error::deserialize(&mut de).map_err(|err| {
        let field = err.path().iter().next().map(|_| err.path().to_string());
        classify(err.into_inner(), field, bytes)
    })
}

fn classify(inner: serde_json::Error, field: Option<String>, bytes: &[u8]) -> BodyError {
    let category = inner.classify();
    let message = bare_message(&inner);
    let position = offset(bytes, inner.line(), inner.column());

    if category == Category::Syntax {
        if let Some(offset) = position {
            return BodyError::Syntax { offset };
        }
    }

    if category == Category::Syntax || (category == Category::Eof && has_content(bytes)) {
        return BodyError::UnexpectedEof;
    }

    if category == Category::Data && is_type_mismatch(&message) {
        return match field {
            Some(field) => BodyError::FieldType { field },
            None => BodyError::Type {
                offset: position.unwrap_or(bytes.len() as u64),
            },
        };
    }

    if category == Category::Eof {
        return BodyError::Empty;
    }

    if category == Category::Data {
        if let Some(name) = unknown_field(&message) {
            return BodyError::UnknownKey(name.to_owned());
        }
    }

    if category == Category::Io {
        let io_err = io::Error::from(inner);
        if let Some(too_large) = io_err
            .get_ref()
            .and_then(|e| e.downcast_ref::<MaxBytesError>())
        {
            return BodyError::TooLarge {
                limit: too_large.limit,
            };
        }
        return BodyError::Other(io_err.to_string());
    }

    if category == Category::Data && is_borrowed_target(&message) {
        panic!("invalid decode target: {message}");
    }

    BodyError::Other(message)
}

/// Byte offset of `column` on `line` (both 1-based) within `bytes`.
fn offset(bytes: &[u8], line: usize, column: usize) -> Option<u64> {
    let start = match line.checked_sub(1)? {
        0 => 0,
        n => {
            bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .nth(n - 1)?
                .0
                + 1
        }
    };
    Some((start + column) as u64)
}

fn has_content(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .any(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// The parser message without its trailing " at line L column C".
fn bare_message(err: &serde_json::Error) -> String {
    let full = err.to_string();
    if err.line() == 0 {
        return full;
    }
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    if let Some(bare) = full.strip_suffix(&suffix) {
        return bare.to_owned();
    }
    full
}

fn is_borrowed_target(message: &str) -> bool {
    message.contains("expected a borrowed")
}

fn is_type_mismatch(message: &str) -> bool {
    let mismatch = message.starts_with("invalid type: ")
        || message.starts_with("invalid value: ")
        || message.starts_with("invalid length ");
    mismatch && !is_borrowed_target(message)
}

/// `unknown field `name`, expected ...` -> `name`
fn unknown_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split('`').next()
}

/// Request-scoped override of the body size limit, read by [`StrictJson`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimit(pub u64);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(MAX_BODY_BYTES)
    }
}

/// JSON body extractor applying the decode rules of [`read_json`].
///
/// Unknown fields are only rejected for destination types declared with
/// `#[serde(deny_unknown_fields)]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let BodyLimit(limit) = req
            .extensions()
            .get::<BodyLimit>()
            .copied()
            .unwrap_or_default();

        let bytes = buffer_body(req.into_body(), limit).await?;
        if bytes.len() as u64 > limit {
            return Err(BodyError::TooLarge { limit }.into());
        }
        let value = read_json_with_limit(bytes.as_slice(), limit)?;
        Ok(Self(value))
    }
}

/// Buffers at most `limit + 1` bytes, enough to tell an oversized body apart.
async fn buffer_body(body: Body, limit: u64) -> Result<Vec<u8>, ApiError> {
    let cap = usize::try_from(limit.saturating_add(1)).unwrap_or(usize::MAX);
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let room = cap - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() == cap {
            break;
        }
    }

    Ok(buf)
}
