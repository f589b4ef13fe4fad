//! Stripe object kinds supported by the picker.
//!
//! The kind determines the identifier prefix, the default field set of the
//! stored record, and the label rule. Everything downstream is parameterized
//! over this tag rather than a class-per-kind hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The Stripe object kind a picker field targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Customer,
    Subscription,
    Product,
}

impl ObjectKind {
    /// All supported kinds, in registration order.
    pub const ALL: [ObjectKind; 3] = [
        ObjectKind::Customer,
        ObjectKind::Subscription,
        ObjectKind::Product,
    ];

    /// The Stripe identifier prefix for this kind (`cus_`, `sub_`, `prod_`).
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            ObjectKind::Customer => "cus_",
            ObjectKind::Subscription => "sub_",
            ObjectKind::Product => "prod_",
        }
    }

    /// Lowercase noun used in messages and route paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Customer => "customer",
            ObjectKind::Subscription => "subscription",
            ObjectKind::Product => "product",
        }
    }

    /// Capitalized display name for UI strings.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ObjectKind::Customer => "Customer",
            ObjectKind::Subscription => "Subscription",
            ObjectKind::Product => "Product",
        }
    }

    /// Check whether `id` is a well-formed Stripe identifier for this kind.
    ///
    /// Valid identifiers are the kind prefix followed by at least one
    /// alphanumeric character. Anything else is treated as an opaque or
    /// legacy value, not an error.
    #[must_use]
    pub fn is_valid_id(self, id: &str) -> bool {
        let Some(rest) = id.strip_prefix(self.id_prefix()) else {
            return false;
        };
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown Stripe object kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ObjectKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(ObjectKind::Customer),
            "subscription" => Ok(ObjectKind::Subscription),
            "product" => Ok(ObjectKind::Product),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefix_per_kind() {
        assert_eq!(ObjectKind::Customer.id_prefix(), "cus_");
        assert_eq!(ObjectKind::Subscription.id_prefix(), "sub_");
        assert_eq!(ObjectKind::Product.id_prefix(), "prod_");
    }

    #[test]
    fn test_is_valid_id() {
        assert!(ObjectKind::Customer.is_valid_id("cus_ABC123"));
        assert!(ObjectKind::Subscription.is_valid_id("sub_1Xyz9"));
        assert!(ObjectKind::Product.is_valid_id("prod_0001"));

        // Wrong prefix for the kind.
        assert!(!ObjectKind::Customer.is_valid_id("sub_ABC123"));
        // Prefix alone is not an identifier.
        assert!(!ObjectKind::Customer.is_valid_id("cus_"));
        // Non-alphanumeric tail.
        assert!(!ObjectKind::Customer.is_valid_id("cus_abc!"));
        assert!(!ObjectKind::Customer.is_valid_id(""));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("customer".parse::<ObjectKind>().unwrap(), ObjectKind::Customer);
        assert_eq!("product".parse::<ObjectKind>().unwrap(), ObjectKind::Product);
        assert!("invoice".parse::<ObjectKind>().is_err());
    }
}
