use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The one error every malformed runtime value produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

/// A duration in minutes, carried on the wire as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }
}

impl From<i32> for Runtime {
    fn from(minutes: i32) -> Self {
        Self(minutes)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(' ').collect();
        match parts.as_slice() {
            [minutes, "mins"] => minutes
                .parse::<i32>()
                .map(Self)
                .map_err(|_| InvalidRuntimeFormat),
            _ => Err(InvalidRuntimeFormat),
        }
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RuntimeVisitor)
    }
}

/// Accepts strings only; every other token is reported as the same format
/// error rather than serde's "invalid type".
struct RuntimeVisitor;

impl RuntimeVisitor {
    fn reject<E: de::Error>() -> Result<Runtime, E> {
        Err(E::custom(InvalidRuntimeFormat))
    }
}

impl<'de> Visitor<'de> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(r#"a string of the form "<n> mins""#)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Runtime, E> {
        Self::reject()
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Runtime, E> {
        Self::reject()
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Runtime, E> {
        Self::reject()
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Runtime, E> {
        Self::reject()
    }

    fn visit_unit<E: de::Error>(self) -> Result<Runtime, E> {
        Self::reject()
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _: A) -> Result<Runtime, A::Error> {
        Self::reject()
    }

    fn visit_map<A: MapAccess<'de>>(self, _: A) -> Result<Runtime, A::Error> {
        Self::reject()
    }
}
