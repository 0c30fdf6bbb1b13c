//! Field-level validation accumulator and the generic predicates handlers use
//! with it.
//!
//! A [`Validator`] is created per request, filled by `check`/`add_error`
//! calls, inspected once with [`Validator::valid`] and then either dropped or
//! turned into a 422 response via `ApiError::from`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Email shape check. Compiled once, read-only afterwards.
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// Accumulates at most one error message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field has a recorded error.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `field` unless the field already has one.
    /// The first error wins.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Records `message` for `field` only when `ok` is false.
    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True if `value` matches `rx`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True if no two elements of `values` are equal.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validator_is_valid() {
        let v = Validator::new();
        assert!(v.valid());
        assert!(v.errors().is_empty());
    }

    #[test]
    fn first_error_for_a_field_wins() {
        let mut v = Validator::new();
        v.add_error("title", "must be provided");
        v.add_error("title", "must not be more than 500 bytes long");

        assert!(!v.valid());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["title"], "must be provided");
    }

    #[test]
    fn check_only_records_failures() {
        let mut v = Validator::new();
        v.check(true, "year", "must be provided");
        assert!(v.valid());

        v.check(false, "year", "must be greater than 1888");
        v.check(false, "year", "must not be in the future");
        v.check(false, "runtime", "must be a positive integer");

        let errors = v.into_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["year"], "must be greater than 1888");
        assert_eq!(errors["runtime"], "must be a positive integer");
    }

    #[test]
    fn permitted_value_checks_membership() {
        assert!(permitted_value(&"title", &["id", "title", "year"]));
        assert!(!permitted_value(&"-runtime", &["id", "title", "year"]));
        assert!(!permitted_value(&1, &[]));
    }

    #[test]
    fn unique_ignores_order() {
        assert!(unique(&[1, 2, 3]));
        assert!(!unique(&[1, 2, 2]));
        assert!(!unique(&[2, 1, 2]));
        assert!(unique::<i32>(&[]));
        assert!(unique(&["drama", "comedy"]));
        assert!(!unique(&["drama", "comedy", "drama"]));
    }

    #[test]
    fn email_pattern() {
        for ok in ["alice@example.com", "a.b+tag@sub.example.co", "x@y"] {
            assert!(matches(ok, &EMAIL_RX), "{ok} should match");
        }
        for bad in ["", "alice", "alice@", "@example.com", "al ice@example.com", "a@-x.com"] {
            assert!(!matches(bad, &EMAIL_RX), "{bad} should not match");
        }
    }
}
