//! Record normalization.
//!
//! Converts the four value shapes the picker can encounter (an empty
//! value, an object carrying an `id`, a JSON-encoded string, or a bare
//! identifier) into a fully defaulted [`CanonicalRecord`]. Also maps raw
//! Stripe API payloads (expanded customers, plan/price item chains,
//! `default_price` blocks) onto the same canonical shape.
//!
//! Normalization is pure and total: no input shape causes an error, and
//! normalizing an already-normalized record is a no-op.

use serde_json::{Map, Value};

use crate::kind::ObjectKind;
use crate::label;
use crate::record::{CanonicalRecord, CustomerRecord, ProductRecord, SubscriptionRecord};

/// The shapes a stored or submitted value can take, decided once at the
/// codec boundary instead of ad hoc type sniffing downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// A JSON object already carrying an `id` key.
    RawObject(Map<String, Value>),
    /// A string that itself decodes to an object carrying an `id` key.
    JsonText(Map<String, Value>),
    /// Any other non-empty string; treated as the identifier verbatim.
    BareIdentifier(String),
    /// Null, empty string, or an object without an identifier.
    Empty,
}

/// Classify a raw value into one of the supported shapes.
#[must_use]
pub fn classify(value: &Value) -> StoredValue {
    match value {
        Value::Object(map) => {
            if map.get("id").map_or(false, has_text) {
                StoredValue::RawObject(map.clone())
            } else {
                StoredValue::Empty
            }
        }
        Value::String(text) => {
            if text.is_empty() {
                return StoredValue::Empty;
            }
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
                if map.get("id").map_or(false, has_text) {
                    return StoredValue::JsonText(map);
                }
            }
            StoredValue::BareIdentifier(text.clone())
        }
        _ => StoredValue::Empty,
    }
}

/// Normalize any supported value shape into a canonical record.
///
/// Known fields from the input override kind defaults; unknown keys are
/// dropped. The label is always recomputed from the merged data, so an
/// inbound `label` never outlives the fields it summarizes. A bare
/// identifier produces a record whose label is the identifier itself.
#[must_use]
pub fn normalize(raw: &Value, kind: ObjectKind) -> CanonicalRecord {
    match classify(raw) {
        StoredValue::Empty => CanonicalRecord::empty(kind),
        StoredValue::RawObject(map) | StoredValue::JsonText(map) => merge(&map, kind),
        StoredValue::BareIdentifier(id) => bare(id, kind),
    }
}

/// Map a raw Stripe API payload onto the canonical shape.
///
/// Customers and products share the plain merge path (products pick their
/// price out of `default_price` there); subscriptions additionally flatten
/// the plan/item chain and the possibly-expanded customer before merging.
#[must_use]
pub fn from_provider_payload(payload: &Value, kind: ObjectKind) -> CanonicalRecord {
    match kind {
        ObjectKind::Customer | ObjectKind::Product => normalize(payload, kind),
        ObjectKind::Subscription => {
            let Some(map) = payload.as_object() else {
                return normalize(payload, kind);
            };
            let flat = flatten_subscription_payload(map);
            merge(&flat, kind)
        }
    }
}

fn merge(map: &Map<String, Value>, kind: ObjectKind) -> CanonicalRecord {
    match kind {
        ObjectKind::Customer => {
            let mut record = CustomerRecord {
                id: text(map, "id"),
                name: text(map, "name"),
                email: text(map, "email"),
                ..CustomerRecord::default()
            };
            record.label = label::customer_label(&record);
            CanonicalRecord::Customer(record)
        }
        ObjectKind::Subscription => {
            let mut record = SubscriptionRecord {
                id: text(map, "id"),
                plan: text(map, "plan"),
                status: text(map, "status"),
                customer_id: text(map, "customer_id"),
                customer_name: text(map, "customer_name"),
                customer_email: text(map, "customer_email"),
                name: text(map, "name"),
                email: text(map, "email"),
                ..SubscriptionRecord::default()
            };
            sync_customer_aliases(&mut record);
            record.label = label::subscription_record_label(&record);
            CanonicalRecord::Subscription(record)
        }
        ObjectKind::Product => {
            let mut record = ProductRecord {
                id: text(map, "id"),
                name: text(map, "name"),
                description: text(map, "description"),
                active: truthy(map.get("active")),
                price_amount: text(map, "price_amount"),
                price_currency: text(map, "price_currency"),
                price_interval: text(map, "price_interval"),
                ..ProductRecord::default()
            };
            if record.price_amount.is_empty() {
                apply_default_price(&mut record, map.get("default_price"));
            }
            record.label = label::product_label(&record);
            CanonicalRecord::Product(record)
        }
    }
}

fn bare(id: String, kind: ObjectKind) -> CanonicalRecord {
    // An identifier with no descriptive data: the label is the id verbatim.
    match kind {
        ObjectKind::Customer => CanonicalRecord::Customer(CustomerRecord {
            label: id.clone(),
            id,
            ..CustomerRecord::default()
        }),
        ObjectKind::Subscription => CanonicalRecord::Subscription(SubscriptionRecord {
            label: id.clone(),
            id,
            ..SubscriptionRecord::default()
        }),
        ObjectKind::Product => CanonicalRecord::Product(ProductRecord {
            label: id.clone(),
            id,
            ..ProductRecord::default()
        }),
    }
}

/// Keep `name`/`email` and `customer_name`/`customer_email` mutually
/// synchronized whenever either side is known.
fn sync_customer_aliases(record: &mut SubscriptionRecord) {
    if record.customer_name.is_empty() && !record.name.is_empty() {
        record.customer_name = record.name.clone();
    }
    if record.customer_email.is_empty() && !record.email.is_empty() {
        record.customer_email = record.email.clone();
    }
    if record.name.is_empty() && !record.customer_name.is_empty() {
        record.name = record.customer_name.clone();
    }
    if record.email.is_empty() && !record.customer_email.is_empty() {
        record.email = record.customer_email.clone();
    }
}

/// Derive price fields from an expanded `default_price` object
/// (`unit_amount` cents, `currency`, `recurring.interval`).
fn apply_default_price(record: &mut ProductRecord, default_price: Option<&Value>) {
    let Some(price) = default_price.and_then(Value::as_object) else {
        return;
    };
    if let Some(cents) = price.get("unit_amount").and_then(Value::as_i64) {
        record.price_amount = format!("{:.2}", cents as f64 / 100.0);
    }
    if let Some(currency) = price.get("currency").and_then(Value::as_str) {
        record.price_currency = currency.to_string();
    }
    if let Some(interval) = price
        .get("recurring")
        .and_then(Value::as_object)
        .and_then(|r| r.get("interval"))
        .and_then(Value::as_str)
    {
        record.price_interval = interval.to_string();
    }
}

/// Flatten a raw subscription payload into the stored field names.
fn flatten_subscription_payload(map: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flat.insert("id".into(), Value::String(text(map, "id")));
    flat.insert("status".into(), Value::String(text(map, "status")));
    flat.insert("plan".into(), Value::String(extract_plan_name(map)));

    let (customer_id, customer_name, customer_email) = extract_customer_details(map);
    flat.insert("customer_id".into(), Value::String(customer_id));
    flat.insert("customer_name".into(), Value::String(customer_name));
    flat.insert("customer_email".into(), Value::String(customer_email));
    flat
}

/// Plan display name precedence: top-level plan nickname, plan id, then
/// the first item's plan nickname/id, then its price nickname/id.
fn extract_plan_name(map: &Map<String, Value>) -> String {
    let first_item = map
        .get("items")
        .and_then(|items| items.get("data"))
        .and_then(|data| data.get(0));

    let candidates = [
        map.get("plan").and_then(|p| p.get("nickname")),
        map.get("plan").and_then(|p| p.get("id")),
        first_item.and_then(|i| i.get("plan")).and_then(|p| p.get("nickname")),
        first_item.and_then(|i| i.get("plan")).and_then(|p| p.get("id")),
        first_item.and_then(|i| i.get("price")).and_then(|p| p.get("nickname")),
        first_item.and_then(|i| i.get("price")).and_then(|p| p.get("id")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// The customer block may be an expanded object or a bare id string.
fn extract_customer_details(map: &Map<String, Value>) -> (String, String, String) {
    match map.get("customer") {
        Some(Value::Object(customer)) => (
            text(customer, "id"),
            text(customer, "name"),
            text(customer, "email"),
        ),
        Some(Value::String(id)) => (id.clone(), String::new(), String::new()),
        _ => (String::new(), String::new(), String::new()),
    }
}

/// String view of a field: strings pass through, numbers are rendered,
/// everything else (including null) is empty.
fn text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        _ => false,
    }
}

fn has_text(value: &Value) -> bool {
    value.as_str().map_or(false, |s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_shapes() {
        assert_eq!(classify(&Value::Null), StoredValue::Empty);
        assert_eq!(classify(&json!("")), StoredValue::Empty);
        assert_eq!(classify(&json!({"name": "no id"})), StoredValue::Empty);
        assert!(matches!(
            classify(&json!({"id": "cus_1"})),
            StoredValue::RawObject(_)
        ));
        assert!(matches!(
            classify(&json!(r#"{"id":"cus_1","name":"Ann"}"#)),
            StoredValue::JsonText(_)
        ));
        assert_eq!(
            classify(&json!("cus_legacy")),
            StoredValue::BareIdentifier("cus_legacy".into())
        );
        // Malformed JSON text is an identifier, not an error.
        assert_eq!(
            classify(&json!("{not json")),
            StoredValue::BareIdentifier("{not json".into())
        );
    }

    #[test]
    fn test_normalize_empty_input() {
        let record = normalize(&Value::Null, ObjectKind::Customer);
        assert_eq!(record.id(), "");
        assert_eq!(record.label(), "");
    }

    #[test]
    fn test_normalize_customer_object() {
        let raw = json!({"id": "cus_1", "name": "Ann Lee", "email": "ann@x.com", "extra": "dropped"});
        let record = normalize(&raw, ObjectKind::Customer);
        let CanonicalRecord::Customer(customer) = &record else {
            panic!("expected customer record");
        };
        assert_eq!(customer.name, "Ann Lee");
        assert_eq!(customer.label, "Ann Lee (ann@x.com)");

        // Unknown keys never survive into storage.
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_normalize_json_text() {
        let raw = json!(r#"{"id":"cus_2","email":"bo@x.com"}"#);
        let record = normalize(&raw, ObjectKind::Customer);
        assert_eq!(record.id(), "cus_2");
        assert_eq!(record.label(), "bo@x.com");
    }

    #[test]
    fn test_normalize_bare_identifier() {
        let record = normalize(&json!("cus_legacy1"), ObjectKind::Customer);
        assert_eq!(record.id(), "cus_legacy1");
        assert_eq!(record.label(), "cus_legacy1");
    }

    #[test]
    fn test_stale_label_is_recomputed() {
        let raw = json!({"id": "cus_1", "name": "Ann Lee", "email": "ann@x.com", "label": "stale text"});
        let record = normalize(&raw, ObjectKind::Customer);
        assert_eq!(record.label(), "Ann Lee (ann@x.com)");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({"id": "sub_1", "plan": "Gold", "status": "active", "name": "Ann", "email": "ann@x.com"});
        let once = normalize(&raw, ObjectKind::Subscription);
        let twice = normalize(
            &serde_json::to_value(&once).unwrap(),
            ObjectKind::Subscription,
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_subscription_alias_sync_both_directions() {
        let raw = json!({"id": "sub_1", "name": "Ann", "email": "ann@x.com"});
        let CanonicalRecord::Subscription(record) = normalize(&raw, ObjectKind::Subscription)
        else {
            panic!("expected subscription record");
        };
        assert_eq!(record.customer_name, "Ann");
        assert_eq!(record.customer_email, "ann@x.com");

        let raw = json!({"id": "sub_2", "customer_name": "Bo", "customer_email": "bo@x.com"});
        let CanonicalRecord::Subscription(record) = normalize(&raw, ObjectKind::Subscription)
        else {
            panic!("expected subscription record");
        };
        assert_eq!(record.name, "Bo");
        assert_eq!(record.email, "bo@x.com");
    }

    #[test]
    fn test_product_default_price_extraction() {
        let raw = json!({
            "id": "prod_1",
            "name": "Gold Plan",
            "active": true,
            "default_price": {
                "unit_amount": 2550,
                "currency": "usd",
                "recurring": {"interval": "month"}
            }
        });
        let CanonicalRecord::Product(record) = normalize(&raw, ObjectKind::Product) else {
            panic!("expected product record");
        };
        assert_eq!(record.price_amount, "25.50");
        assert_eq!(record.price_currency, "usd");
        assert_eq!(record.price_interval, "month");
        assert_eq!(record.label, "Gold Plan \u{2013} USD25.50/month");
    }

    #[test]
    fn test_product_stored_price_wins_over_default_price() {
        let raw = json!({
            "id": "prod_1",
            "price_amount": "10.00",
            "price_currency": "gbp",
            "default_price": {"unit_amount": 2550, "currency": "usd"}
        });
        let CanonicalRecord::Product(record) = normalize(&raw, ObjectKind::Product) else {
            panic!("expected product record");
        };
        assert_eq!(record.price_amount, "10.00");
        assert_eq!(record.price_currency, "gbp");
    }

    #[test]
    fn test_subscription_payload_plan_precedence() {
        let payload = json!({
            "id": "sub_1",
            "status": "active",
            "customer": {"id": "cus_1", "name": "Ann", "email": "ann@x.com"},
            "items": {"data": [{"price": {"id": "price_9", "nickname": "Gold Monthly"}}]}
        });
        let CanonicalRecord::Subscription(record) =
            from_provider_payload(&payload, ObjectKind::Subscription)
        else {
            panic!("expected subscription record");
        };
        assert_eq!(record.plan, "Gold Monthly");
        assert_eq!(record.customer_id, "cus_1");
        assert_eq!(record.customer_name, "Ann");
        assert_eq!(record.name, "Ann");
        assert_eq!(record.label, "Gold Monthly \u{2013} Ann (ann@x.com)");
    }

    #[test]
    fn test_subscription_payload_unexpanded_customer() {
        let payload = json!({
            "id": "sub_2",
            "status": "past_due",
            "customer": "cus_77",
            "plan": {"id": "plan_basic"}
        });
        let CanonicalRecord::Subscription(record) =
            from_provider_payload(&payload, ObjectKind::Subscription)
        else {
            panic!("expected subscription record");
        };
        assert_eq!(record.plan, "plan_basic");
        assert_eq!(record.customer_id, "cus_77");
        assert_eq!(record.label, "plan_basic \u{2013} cus_77");
    }

    #[test]
    fn test_every_field_present_for_all_shapes() {
        let inputs = [
            Value::Null,
            json!({"id": "sub_1"}),
            json!(r#"{"id":"sub_1"}"#),
            json!("sub_legacy"),
        ];
        for input in &inputs {
            let record = normalize(input, ObjectKind::Subscription);
            let value = serde_json::to_value(&record).unwrap();
            let obj = value.as_object().unwrap();
            for field in [
                "id",
                "label",
                "plan",
                "status",
                "customer_id",
                "customer_name",
                "customer_email",
                "name",
                "email",
            ] {
                assert!(obj.contains_key(field), "missing {field} for {input}");
                assert!(obj[field].is_string(), "{field} not a string for {input}");
            }
        }
    }
}
