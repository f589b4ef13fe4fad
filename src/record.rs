//! Canonical record shapes stored alongside a picker selection.
//!
//! A canonical record is the normalized, storable snapshot of a remote
//! Stripe object: every descriptive field is always present (empty string
//! or `false` when unknown, never null), and `label` is derived display
//! text that is blank exactly when `id` is blank.

use serde::{Deserialize, Serialize};

use crate::kind::ObjectKind;

/// Normalized customer snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerRecord {
    pub id: String,
    pub label: String,
    pub name: String,
    pub email: String,
}

/// Normalized subscription snapshot.
///
/// `name`/`email` are legacy aliases of `customer_name`/`customer_email`
/// kept mutually synchronized whenever either side is known; older stored
/// values only carry the short names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionRecord {
    pub id: String,
    pub label: String,
    pub plan: String,
    pub status: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub name: String,
    pub email: String,
}

/// Normalized product snapshot.
///
/// Price fields are strings so "unknown" can be stored as an empty value;
/// amounts are major currency units, formatted to two decimals at label
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub id: String,
    pub label: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub price_amount: String,
    pub price_currency: String,
    pub price_interval: String,
}

/// A canonical record of any kind.
///
/// Serializes as the bare kind-specific object; the kind itself is implied
/// by the field that stores the record, so no tag is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Customer(CustomerRecord),
    Subscription(SubscriptionRecord),
    Product(ProductRecord),
}

impl CanonicalRecord {
    /// An all-default record for the given kind (empty id, empty label).
    #[must_use]
    pub fn empty(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Customer => Self::Customer(CustomerRecord::default()),
            ObjectKind::Subscription => Self::Subscription(SubscriptionRecord::default()),
            ObjectKind::Product => Self::Product(ProductRecord::default()),
        }
    }

    /// The kind this record belongs to.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Customer(_) => ObjectKind::Customer,
            Self::Subscription(_) => ObjectKind::Subscription,
            Self::Product(_) => ObjectKind::Product,
        }
    }

    /// The provider-assigned identifier; empty means "no selection".
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Customer(r) => &r.id,
            Self::Subscription(r) => &r.id,
            Self::Product(r) => &r.id,
        }
    }

    /// The derived display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Customer(r) => &r.label,
            Self::Subscription(r) => &r.label,
            Self::Product(r) => &r.label,
        }
    }

    /// Whether a record has been selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        !self.id().is_empty()
    }
}

/// One dropdown entry returned by a search. Transient, never persisted.
///
/// `text` is the select2-facing display string; the remaining fields are
/// the kind's display data so the client can cache them for the save path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub text: String,
    #[serde(flatten)]
    pub record: serde_json::Map<String, serde_json::Value>,
}

impl SearchResultItem {
    /// Build an item from a canonical record; `text` mirrors the label.
    #[must_use]
    pub fn from_record(record: &CanonicalRecord) -> Self {
        let value = serde_json::to_value(record).unwrap_or_default();
        let mut fields = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        fields.remove("id");
        Self {
            id: record.id().to_string(),
            text: record.label().to_string(),
            record: fields,
        }
    }
}

/// One page of search results.
///
/// There is no cursor contract beyond page 1; `more` only signals that
/// further records exist upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub more: bool,
}

impl<T> Page<T> {
    /// A page holding exactly one item, with no further results.
    #[must_use]
    pub fn single(item: T) -> Self {
        Self {
            items: vec![item],
            more: false,
        }
    }
}
