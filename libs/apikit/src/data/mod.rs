//! Scalar types shared by request and response payloads.

pub mod runtime;

pub use self::runtime::{InvalidRuntimeFormat, Runtime};
