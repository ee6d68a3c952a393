//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The backend owns ID
//! allocation and treats IDs as opaque strings; optimistic store entries use
//! a `local()` placeholder ID until the create call returns the server one.

use serde::{Deserialize, Serialize};

/// Prefix shared by all locally generated placeholder IDs.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` (transparent) and a tolerant `Deserialize` that accepts
///   both string and integer IDs (the backend is inconsistent about which
///   it sends)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `new()`, `as_str()`, `local()` and `is_local()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use clementine_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("17");
/// let order_id = OrderId::new("17");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a placeholder ID for an optimistic local entry.
            #[must_use]
            pub fn local() -> Self {
                Self(format!(
                    "{}{}",
                    $crate::types::id::LOCAL_ID_PREFIX,
                    ::uuid::Uuid::new_v4()
                ))
            }

            /// Whether this ID is a local placeholder not yet confirmed by
            /// the backend.
            #[must_use]
            pub fn is_local(&self) -> bool {
                self.0.starts_with($crate::types::id::LOCAL_ID_PREFIX)
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(i64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(s) => Self(s),
                    Raw::Number(n) => Self(n.to_string()),
                })
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(AddressId);
define_id!(CardId);
define_id!(OrderId);

/// Numeric product ID.
///
/// The catalog service is the one backend surface that keys entities by
/// integer; cart and order payloads reference products through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Create a new product ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ProductId> for i64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ids_are_flagged_and_unique() {
        let a = AddressId::local();
        let b = AddressId::local();
        assert!(a.is_local());
        assert!(b.is_local());
        assert_ne!(a, b);
        assert!(!AddressId::new("42").is_local());
    }

    #[test]
    fn test_deserialize_accepts_string_and_number() {
        let from_str: OrderId = serde_json::from_str("\"ord-9\"").expect("string id");
        let from_num: OrderId = serde_json::from_str("9").expect("numeric id");
        assert_eq!(from_str.as_str(), "ord-9");
        assert_eq!(from_num.as_str(), "9");
    }

    #[test]
    fn test_serialize_transparent() {
        let id = CardId::new("card-1");
        assert_eq!(
            serde_json::to_string(&id).expect("serialize"),
            "\"card-1\""
        );
    }

    #[test]
    fn test_product_id_roundtrip() {
        let id = ProductId::new(7);
        assert_eq!(id.as_i64(), 7);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
        assert_eq!(id.to_string(), "7");
    }
}
