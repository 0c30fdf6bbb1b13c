//! The decode → validate → respond pipeline used by request handlers.

pub mod error;
pub mod layers;
pub mod params;
pub mod request;
pub mod response;

pub use error::{error_response, log_error, report_server_faults, ApiError, ServerFault};
pub use layers::{catch_panic_layer, method_not_allowed, not_found, trace_layer, with_pipeline};
pub use params::{read_id_param, IdParam, InvalidIdParam};
pub use request::{read_json, read_json_with_limit, BodyError, BodyLimit, StrictJson, MAX_BODY_BYTES};
pub use response::{respond, write_json, Envelope};

/// Result alias for handlers built on this pipeline.
pub type ApiResult<T> = Result<T, ApiError>;
