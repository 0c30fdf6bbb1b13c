//! # apikit
//!
//! Support layer for JSON-over-HTTP handlers built on `axum`:
//!
//! - **Decoding**: [`StrictJson`] / [`read_json`] read one size-bounded JSON
//!   value and narrow every parser failure into a stable, client-facing message
//! - **Validation**: [`Validator`] collects at most one message per field
//! - **Responses**: [`write_json`] renders the single-key [`Envelope`];
//!   [`ApiError`] maps failures to status codes
//! - **Scalars**: [`Runtime`], minutes on the wire as `"<n> mins"`
//!
//! ```rust,ignore
//! async fn create_movie(StrictJson(input): StrictJson<CreateMovie>) -> ApiResult<Response> {
//!     let mut v = Validator::new();
//!     v.check(!input.title.is_empty(), "title", "must be provided");
//!     if !v.valid() {
//!         return Err(v.into());
//!     }
//!     respond(StatusCode::CREATED, Envelope::new("movie", input), None)
//! }
//! ```

pub mod api;
pub mod config;
pub mod data;
pub mod validator;

pub use api::{
    respond, with_pipeline, write_json, ApiError, ApiResult, BodyError, Envelope, IdParam,
    StrictJson,
};
pub use api::{read_json, read_json_with_limit};
pub use config::ApiConfig;
pub use data::Runtime;
pub use validator::Validator;
