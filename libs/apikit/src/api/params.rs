use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::api::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid id parameter")]
pub struct InvalidIdParam;

/// Parses a resource id: a base-10 `i64` no smaller than 1.
pub fn read_id_param(raw: &str) -> Result<i64, InvalidIdParam> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(InvalidIdParam),
    }
}

/// The `{id}` path parameter of the matched route.
///
/// A missing or malformed id cannot name any resource, so the rejection is
/// [`ApiError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParam(pub i64);

impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;

        let raw = params.get("id").ok_or(ApiError::NotFound)?;
        read_id_param(raw).map(Self).map_err(|err| {
            tracing::debug!(id = %raw, error = %err, "rejecting path parameter");
            ApiError::NotFound
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_ids() {
        assert_eq!(read_id_param("1"), Ok(1));
        assert_eq!(read_id_param("42"), Ok(42));
        assert_eq!(read_id_param("9223372036854775807"), Ok(i64::MAX));
    }

    #[test]
    fn rejects_everything_else() {
        for raw in ["0", "-3", "", "abc", "1.5", " 7", "9223372036854775808"] {
            assert_eq!(read_id_param(raw), Err(InvalidIdParam), "{raw:?}");
        }
        assert_eq!(InvalidIdParam.to_string(), "invalid id parameter");
    }
}
