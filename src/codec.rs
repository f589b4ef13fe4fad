//! Stored-value codec.
//!
//! `decode` turns whatever the host persisted (current JSON object or
//! legacy bare id) back into a canonical record; `encode` models the save
//! path, resolving the submitted identifier against the client-side cache
//! and, failing that, a live fetch. Encoding never fails: an unreachable
//! provider degrades the stored value to an id-only record instead of
//! blocking the save.

use serde_json::Value;

use crate::kind::ObjectKind;
use crate::lookup::{LookupAdapter, ProviderClient};
use crate::normalize;
use crate::record::CanonicalRecord;

/// Decode a stored value into a canonical record.
///
/// Handles every historical storage format: the current canonical object,
/// a JSON-encoded string of it, and the original bare-identifier format.
#[must_use]
pub fn decode(stored: &Value, kind: ObjectKind) -> CanonicalRecord {
    normalize::normalize(stored, kind)
}

/// Extract the form-facing value (the bare identifier) from a stored
/// value, for populating the editing widget.
#[must_use]
pub fn form_value(stored: &Value, kind: ObjectKind) -> String {
    decode(stored, kind).id().to_string()
}

/// Build the storage record for a submitted selection.
///
/// `form_value` is the bare identifier the editor submitted;
/// `client_cache` is the display snapshot the widget captured at selection
/// time. Resolution order, each step only when the previous is
/// unavailable:
///
/// 1. a cache whose `id` matches `form_value` is trusted (no network);
/// 2. a connected adapter fetches the record live;
/// 3. an id-only record with empty descriptive fields.
///
/// A `form_value` that does not match the kind's identifier prefix skips
/// straight to step 3: it is treated as an opaque legacy value, not an
/// error. Remote failures in step 2 also fall through to step 3.
pub async fn encode<C: ProviderClient>(
    form_value: &str,
    client_cache: Option<&Value>,
    kind: ObjectKind,
    adapter: &LookupAdapter<C>,
) -> CanonicalRecord {
    let form_value = form_value.trim();
    if form_value.is_empty() {
        return CanonicalRecord::empty(kind);
    }

    if !kind.is_valid_id(form_value) {
        return normalize::normalize(&Value::String(form_value.to_string()), kind);
    }

    if let Some(cache) = client_cache {
        let cached_id = cache.get("id").and_then(Value::as_str).unwrap_or("");
        if cached_id == form_value {
            return normalize::normalize(cache, kind);
        }
    }

    if adapter.is_connected() {
        match adapter.fetch(form_value, kind).await {
            Ok(record) => return record,
            Err(err) => {
                // Persistence must not be blocked by an unreachable API.
                tracing::debug!(
                    target: "stripe_picker::codec",
                    kind = %kind,
                    id = form_value,
                    error = %err,
                    "Live fetch failed during save, storing id-only record"
                );
            }
        }
    }

    normalize::normalize(&Value::String(form_value.to_string()), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::lookup::test::MockProviderClient;
    use serde_json::json;

    fn adapter(connected: bool) -> LookupAdapter<MockProviderClient> {
        LookupAdapter::new(MockProviderClient::new(), connected)
    }

    #[test]
    fn test_decode_current_format() {
        let stored = json!({"id": "cus_1", "name": "Ann Lee", "email": "ann@x.com", "label": ""});
        let record = decode(&stored, ObjectKind::Customer);
        assert_eq!(record.label(), "Ann Lee (ann@x.com)");
        assert_eq!(form_value(&stored, ObjectKind::Customer), "cus_1");
    }

    #[test]
    fn test_decode_legacy_bare_id() {
        let record = decode(&json!("cus_old"), ObjectKind::Customer);
        assert_eq!(record.id(), "cus_old");
        assert_eq!(record.label(), "cus_old");
    }

    #[test]
    fn test_decode_encode_roundtrip_is_idempotent() {
        let stored = json!({"id": "sub_1", "plan": "Gold", "status": "active", "name": "Ann"});
        let once = decode(&stored, ObjectKind::Subscription);
        let again = decode(&serde_json::to_value(&once).unwrap(), ObjectKind::Subscription);
        assert_eq!(once, again);
    }

    #[tokio::test]
    async fn test_encode_trusts_matching_cache_without_transport() {
        let adapter = adapter(true);
        let cache = json!({"id": "cus_999", "name": "Bo", "email": "bo@x.com"});

        let record = encode("cus_999", Some(&cache), ObjectKind::Customer, &adapter).await;
        assert_eq!(record.id(), "cus_999");
        assert_eq!(record.label(), "Bo (bo@x.com)");
        assert_eq!(adapter_client(&adapter).calls(), 0);
    }

    #[tokio::test]
    async fn test_encode_ignores_mismatched_cache() {
        let client = MockProviderClient::new();
        client.insert(json!({"id": "cus_2", "name": "Cay", "email": "cay@x.com"}));
        let adapter = LookupAdapter::new(client, true);
        let stale_cache = json!({"id": "cus_1", "name": "Ann"});

        let record = encode("cus_2", Some(&stale_cache), ObjectKind::Customer, &adapter).await;
        assert_eq!(record.label(), "Cay (cay@x.com)");
    }

    #[tokio::test]
    async fn test_encode_fetches_live_when_no_cache() {
        let client = MockProviderClient::new();
        client.insert(json!({"id": "cus_1", "name": "Ann Lee", "email": "ann@x.com"}));
        let adapter = LookupAdapter::new(client, true);

        let record = encode("cus_1", None, ObjectKind::Customer, &adapter).await;
        assert_eq!(record.label(), "Ann Lee (ann@x.com)");
    }

    #[tokio::test]
    async fn test_encode_swallows_remote_failure() {
        let client = MockProviderClient::new();
        client.fail_with(LookupError::provider("rate limited"));
        let adapter = LookupAdapter::new(client, true);

        let record = encode("cus_1", None, ObjectKind::Customer, &adapter).await;
        assert_eq!(record.id(), "cus_1");
        assert_eq!(record.label(), "cus_1");
        let CanonicalRecord::Customer(customer) = record else {
            panic!("expected customer record");
        };
        assert_eq!(customer.name, "");
        assert_eq!(customer.email, "");
    }

    #[tokio::test]
    async fn test_encode_disconnected_stores_id_only() {
        let adapter = adapter(false);
        let record = encode("cus_1", None, ObjectKind::Customer, &adapter).await;
        assert_eq!(record.id(), "cus_1");
        assert_eq!(adapter_client(&adapter).calls(), 0);
    }

    #[tokio::test]
    async fn test_encode_rejects_foreign_prefix_without_transport() {
        let adapter = adapter(true);
        let record = encode("sub_123", None, ObjectKind::Customer, &adapter).await;
        assert_eq!(record.id(), "sub_123");
        assert_eq!(record.label(), "sub_123");
        assert_eq!(adapter_client(&adapter).calls(), 0);
    }

    #[tokio::test]
    async fn test_encode_empty_value_clears_selection() {
        let adapter = adapter(true);
        let record = encode("", None, ObjectKind::Customer, &adapter).await;
        assert_eq!(record.id(), "");
        assert_eq!(record.label(), "");
    }

    fn adapter_client(adapter: &LookupAdapter<MockProviderClient>) -> &MockProviderClient {
        adapter.client_ref()
    }
}
