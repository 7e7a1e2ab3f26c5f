//! String-backed reference types for orders, products and carriers.
//!
//! Order identifiers arrive as free text from uploaded sheets and are a
//! grouping key, not a unique key: the same `OrderRef` appears once per
//! line item and once per upload snapshot.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Email;

macro_rules! string_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw value, trimming surrounding whitespace.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                let raw: String = raw.into();
                Self(raw.trim().to_owned())
            }

            /// Returns the value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

string_ref! {
    /// Order identifier as it appears in the uploaded sheet.
    OrderRef
}

string_ref! {
    /// Tracking / waybill number assigned by the carrier.
    Waybill
}

string_ref! {
    /// Deterministic product identity, derived from the owning
    /// dropshipper's email and the product's display name.
    ProductUid
}

impl ProductUid {
    /// Derive the product identity for a (dropshipper, product name) pair.
    ///
    /// The derivation is deterministic so repeated uploads of the same
    /// sheet map to the same identity: lowercase both parts, collapse any
    /// run of non-alphanumeric characters in the name to a single hyphen,
    /// and join with `"::"`.
    #[must_use]
    pub fn derive(dropshipper: &Email, product_name: &str) -> Self {
        let mut slug = String::with_capacity(product_name.len());
        let mut pending_sep = false;
        for c in product_name.trim().chars() {
            if c.is_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('-');
                }
                pending_sep = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_sep = true;
            }
        }
        Self(format!("{}::{slug}", dropshipper.normalized()))
    }
}

string_ref! {
    /// Carrier / courier identity as reported in the sheet.
    Carrier
}

impl Carrier {
    /// Lowercased form used for rate lookups and default-rate matching.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}
