//! Three-state optional fields for update requests.
//!
//! An update body needs to tell three cases apart:
//!
//! | Value | JSON | Meaning |
//! |---|---|---|
//! | [`Nullable::Absent`] | field omitted | leave unchanged |
//! | [`Nullable::Null`] | `null` | clear the stored value |
//! | [`Nullable::Value`] | the value | set the value |
//!
//! `Option<T>` collapses the first two, so update requests use this type for
//! every field the gateway allows clearing.
//!
//! # Examples
//!
//! ```
//! use paygate::types::Nullable;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Update {
//!     #[serde(skip_serializing_if = "Nullable::is_absent")]
//!     description: Nullable<String>,
//!     #[serde(skip_serializing_if = "Nullable::is_absent")]
//!     email: Nullable<String>,
//! }
//!
//! let body = Update { description: Nullable::Null, email: Nullable::Absent };
//! assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"description":null}"#);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that may be omitted, explicitly null, or set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    /// Not sent.
    #[default]
    Absent,
    /// Sent as `null`.
    Null,
    /// Sent as the contained value.
    Value(T),
}

impl<T> Nullable<T> {
    /// Returns true for [`Nullable::Absent`].
    ///
    /// Used with `#[serde(skip_serializing_if = "Nullable::is_absent")]`.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true for [`Nullable::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the contained value, if set.
    #[must_use]
    pub const fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    /// Converts into an `Option`, merging absent and null.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    /// Maps the contained value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Nullable<U> {
        match self {
            Self::Absent => Nullable::Absent,
            Self::Null => Nullable::Null,
            Self::Value(value) => Nullable::Value(f(value)),
        }
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// `None` becomes [`Nullable::Null`]: an explicit `Option` is a decision to
/// send the field.
impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}

/// A missing field only deserializes to [`Nullable::Absent`] when the field
/// is marked `#[serde(default)]`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Nullable::is_absent")]
        description: Nullable<String>,
    }

    #[test]
    fn test_serialize_three_states() {
        let absent = Patch { description: Nullable::Absent };
        let null = Patch { description: Nullable::Null };
        let value = Patch { description: "vip".to_owned().into() };

        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(&null).unwrap(), json!({"description": null}));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"description": "vip"}));
    }

    #[test]
    fn test_deserialize_three_states() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        let null: Patch = serde_json::from_value(json!({"description": null})).unwrap();
        let value: Patch = serde_json::from_value(json!({"description": "vip"})).unwrap();

        assert!(absent.description.is_absent());
        assert!(null.description.is_null());
        assert_eq!(value.description.as_value().map(String::as_str), Some("vip"));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Nullable::from(Some(3)), Nullable::Value(3));
        assert_eq!(Nullable::<i32>::from(None), Nullable::Null);
        assert_eq!(Nullable::<i32>::default(), Nullable::Absent);
    }

    #[test]
    fn test_map_and_into_option() {
        assert_eq!(Nullable::Value(2).map(|v| v * 10), Nullable::Value(20));
        assert_eq!(Nullable::<i32>::Null.map(|v| v * 10), Nullable::Null);
        assert_eq!(Nullable::<i32>::Absent.into_option(), None);
        assert_eq!(Nullable::Value("x").into_option(), Some("x"));
    }

    fn nullable_strategy() -> impl Strategy<Value = Nullable<i64>> {
        prop_oneof![
            Just(Nullable::Absent),
            Just(Nullable::Null),
            any::<i64>().prop_map(Nullable::Value),
        ]
    }

    proptest! {
        #[test]
        fn prop_state_survives_json(field in nullable_strategy()) {
            #[derive(Serialize, Deserialize)]
            struct Wrapper {
                #[serde(default, skip_serializing_if = "Nullable::is_absent")]
                field: Nullable<i64>,
            }

            let encoded = serde_json::to_string(&Wrapper { field }).unwrap();
            let decoded: Wrapper = serde_json::from_str(&encoded).unwrap();
            prop_assert_eq!(decoded.field, field);
        }
    }
}
