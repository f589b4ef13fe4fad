//! Remote lookup adapter.
//!
//! Translates picker search terms and identifiers into provider calls and
//! shapes the responses into canonical records and dropdown pages. The
//! provider itself sits behind [`ProviderClient`] so tests run against a
//! mock and production runs against the Stripe SDK client.

use serde_json::Value;

use crate::error::{LookupError, Result};
use crate::kind::ObjectKind;
use crate::label;
use crate::normalize;
use crate::record::{CanonicalRecord, Page, SearchResultItem};

/// Fixed page size for searches and listings. No deeper pagination is
/// offered; callers only learn whether more records exist.
pub const PAGE_LIMIT: u64 = 20;

/// Maximum length of a sanitized search term embedded in a provider query.
const MAX_TERM_LEN: usize = 50;

/// One page of raw provider payloads.
#[derive(Debug, Clone, Default)]
pub struct ProviderPage {
    pub data: Vec<Value>,
    pub has_more: bool,
}

/// Transport-level operations against the billing provider.
///
/// Implementations return raw JSON payloads; all shaping happens in the
/// normalizer. The live implementation wraps the Stripe SDK, the mock
/// serves fixtures and counts calls.
///
/// Methods are declared with explicit `Send` futures so adapter calls can
/// cross `await` points inside axum handlers; implementations can still
/// use plain `async fn`.
pub trait ProviderClient: Send + Sync {
    /// Retrieve a single object by identifier.
    fn retrieve(
        &self,
        kind: ObjectKind,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;

    /// List the first page of objects, unfiltered.
    fn list(
        &self,
        kind: ObjectKind,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<ProviderPage>> + Send;

    /// Run a provider search query (Stripe search syntax).
    fn search(
        &self,
        kind: ObjectKind,
        query: &str,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<ProviderPage>> + Send;

    /// Retrieve a plan (or price) object, for plan-name resolution.
    fn retrieve_plan(&self, plan_id: &str) -> impl std::future::Future<Output = Result<Value>> + Send;
}

/// Per-request lookup context.
///
/// Constructed once per inbound request from the configured connection
/// state and discarded afterwards; no record caching happens across
/// requests.
pub struct LookupAdapter<C> {
    client: C,
    connected: bool,
}

impl<C: ProviderClient> LookupAdapter<C> {
    /// Create an adapter. `connected` should come from
    /// [`crate::config::PickerConfig::is_connected`]; when false, every
    /// operation fails with [`LookupError::NotConfigured`] before touching
    /// the client.
    pub fn new(client: C, connected: bool) -> Self {
        Self { client, connected }
    }

    /// Whether a provider credential is available.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Borrow the underlying provider client.
    #[must_use]
    pub fn client_ref(&self) -> &C {
        &self.client
    }

    fn require_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(LookupError::NotConfigured)
        }
    }

    /// Fetch a single record by identifier and normalize it.
    pub async fn fetch(&self, id: &str, kind: ObjectKind) -> Result<CanonicalRecord> {
        self.require_connected()?;

        let id = id.trim();
        if id.is_empty() {
            return Err(LookupError::MissingIdentifier { kind });
        }

        let payload = self.client.retrieve(kind, id).await?;
        Ok(normalize::from_provider_payload(&payload, kind))
    }

    /// Search for records matching a free-text term.
    ///
    /// A term that is itself a well-formed identifier for the kind routes
    /// to single-record fetch semantics. Otherwise the term is sanitized
    /// and turned into a starts-with provider query; terms that sanitize
    /// to nothing (and empty terms) produce the unfiltered first page.
    pub async fn search(&self, term: &str, kind: ObjectKind) -> Result<Page<SearchResultItem>> {
        self.require_connected()?;

        let term = term.trim();
        if kind.is_valid_id(term) {
            let record = self.fetch(term, kind).await?;
            let item = self.prepare_item(record).await;
            return Ok(Page::single(item));
        }

        let page = match build_search_query(term, kind) {
            Some(query) => self.client.search(kind, &query, PAGE_LIMIT).await?,
            None => self.client.list(kind, PAGE_LIMIT).await?,
        };

        let mut items = Vec::with_capacity(page.data.len());
        for payload in &page.data {
            let record = normalize::from_provider_payload(payload, kind);
            items.push(self.prepare_item(record).await);
        }

        Ok(Page {
            items,
            more: page.has_more,
        })
    }

    /// Resolve a plan identifier to `"{product_name} {CURRENCY}{amount}/{interval}"`.
    ///
    /// Requires two remote calls (plan, then its parent product). Any
    /// failure degrades to the raw plan string rather than an error, so a
    /// label can always be produced.
    pub async fn plan_label(&self, plan: &str) -> String {
        let plan = plan.trim();
        if plan.is_empty() {
            return String::new();
        }

        match self.resolve_plan_label(plan).await {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::debug!(
                    target: "stripe_picker::lookup",
                    plan = plan,
                    error = %err,
                    "Plan label resolution failed, using raw plan string"
                );
                plan.to_string()
            }
        }
    }

    async fn resolve_plan_label(&self, plan_id: &str) -> Result<String> {
        self.require_connected()?;

        let plan = self.client.retrieve_plan(plan_id).await?;

        let product_id = plan
            .get("product")
            .and_then(plan_product_id)
            .ok_or_else(|| LookupError::provider("Product id is missing from the plan object"))?;

        let product = self.client.retrieve(ObjectKind::Product, &product_id).await?;
        let product_name = product
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown product");

        let amount = plan
            .get("amount")
            .and_then(Value::as_i64)
            .map(|cents| format!("{:.2}", cents as f64 / 100.0))
            .unwrap_or_else(|| "0.00".to_string());
        let currency = plan.get("currency").and_then(Value::as_str).unwrap_or("");
        let interval = plan.get("interval").and_then(Value::as_str).unwrap_or("");

        Ok(format!(
            "{} {}{}/{}",
            product_name,
            currency.to_uppercase(),
            amount,
            interval
        ))
    }

    /// Shape a canonical record into a dropdown item. Subscription items
    /// get their plan label resolved remotely, degrading to the raw plan
    /// string on failure.
    async fn prepare_item(&self, record: CanonicalRecord) -> SearchResultItem {
        match record {
            CanonicalRecord::Subscription(mut sub) => {
                let plan_label = self.plan_label(&sub.plan).await;
                let display = label::customer_display(
                    &sub.customer_name,
                    &sub.customer_email,
                    &sub.customer_id,
                );
                sub.label = label::subscription_label(
                    &plan_label,
                    &display,
                    &sub.status,
                    &sub.id,
                    label::LabelOptions::default(),
                );
                SearchResultItem::from_record(&CanonicalRecord::Subscription(sub))
            }
            other => SearchResultItem::from_record(&other),
        }
    }
}

/// Plan payloads carry `product` as either a bare id or an expanded object.
fn plan_product_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(map) => map
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Strip a term down to `[A-Za-z0-9@._- ]`, truncate to 50 characters and
/// trim. The surviving term becomes a starts-with query over the fields
/// the kind is searchable by; `None` means "list unfiltered instead".
///
/// Subscriptions are never text-searchable: Stripe has no name/email
/// fields on them, so any non-identifier term lists the first page.
#[must_use]
pub fn build_search_query(term: &str, kind: ObjectKind) -> Option<String> {
    if kind == ObjectKind::Subscription {
        return None;
    }

    let sanitized = sanitize_term(term);
    if sanitized.is_empty() {
        return None;
    }

    match kind {
        ObjectKind::Customer => Some(format!(
            "name:'{sanitized}*' OR email:'{sanitized}*'"
        )),
        ObjectKind::Product => Some(format!("name:'{sanitized}*'")),
        ObjectKind::Subscription => None,
    }
}

/// Remove characters outside letters/digits/`@._-`/space, then truncate
/// and trim.
#[must_use]
pub fn sanitize_term(term: &str) -> String {
    let filtered: String = term
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | ' '))
        .take(MAX_TERM_LEN)
        .collect();
    filtered.trim().to_string()
}

/// Mock provider client serving canned payloads and counting calls.
#[cfg(any(test, feature = "test-client"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    /// In-memory provider client for tests.
    ///
    /// Records are keyed by id; searches return every stored payload of
    /// the kind (the query itself is recorded for assertions).
    #[derive(Default)]
    pub struct MockProviderClient {
        objects: RwLock<HashMap<String, Value>>,
        plans: RwLock<HashMap<String, Value>>,
        queries: RwLock<Vec<String>>,
        call_count: AtomicU64,
        forced_error: RwLock<Option<LookupError>>,
    }

    impl MockProviderClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an object payload; the payload must carry an `id`.
        pub fn insert(&self, payload: Value) {
            let id = payload
                .get("id")
                .and_then(Value::as_str)
                .expect("mock payload requires an id")
                .to_string();
            self.objects.write().unwrap().insert(id, payload);
        }

        /// Seed a plan payload for plan-label resolution.
        pub fn insert_plan(&self, id: &str, payload: Value) {
            self.plans.write().unwrap().insert(id.to_string(), payload);
        }

        /// Make every subsequent call fail with the given error.
        pub fn fail_with(&self, error: LookupError) {
            *self.forced_error.write().unwrap() = Some(error);
        }

        /// Total transport calls issued, for no-I/O assertions.
        pub fn calls(&self) -> u64 {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Search queries received, in order.
        pub fn queries(&self) -> Vec<String> {
            self.queries.read().unwrap().clone()
        }

        fn checked_call(&self) -> Result<()> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match &*self.forced_error.read().unwrap() {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn of_kind(&self, kind: ObjectKind, limit: u64) -> Vec<Value> {
            let mut data: Vec<(String, Value)> = self
                .objects
                .read()
                .unwrap()
                .iter()
                .filter(|(id, _)| id.starts_with(kind.id_prefix()))
                .map(|(id, v)| (id.clone(), v.clone()))
                .collect();
            data.sort_by(|a, b| a.0.cmp(&b.0));
            data.into_iter()
                .take(limit as usize)
                .map(|(_, v)| v)
                .collect()
        }
    }

    impl ProviderClient for MockProviderClient {
        async fn retrieve(&self, kind: ObjectKind, id: &str) -> Result<Value> {
            self.checked_call()?;
            self.objects
                .read()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| LookupError::NotFound {
                    kind,
                    id: id.to_string(),
                })
        }

        async fn list(&self, kind: ObjectKind, limit: u64) -> Result<ProviderPage> {
            self.checked_call()?;
            Ok(ProviderPage {
                data: self.of_kind(kind, limit),
                has_more: false,
            })
        }

        async fn search(&self, kind: ObjectKind, query: &str, limit: u64) -> Result<ProviderPage> {
            self.checked_call()?;
            self.queries.write().unwrap().push(query.to_string());
            Ok(ProviderPage {
                data: self.of_kind(kind, limit),
                has_more: false,
            })
        }

        async fn retrieve_plan(&self, plan_id: &str) -> Result<Value> {
            self.checked_call()?;
            self.plans
                .read()
                .unwrap()
                .get(plan_id)
                .cloned()
                .ok_or_else(|| LookupError::provider(format!("No such plan: '{plan_id}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MockProviderClient;
    use super::*;
    use serde_json::json;

    fn seeded_adapter() -> LookupAdapter<MockProviderClient> {
        let client = MockProviderClient::new();
        client.insert(json!({"id": "cus_1", "name": "Ann Lee", "email": "ann@x.com"}));
        client.insert(json!({"id": "cus_2", "name": "Bo", "email": "bo@x.com"}));
        LookupAdapter::new(client, true)
    }

    #[test]
    fn test_sanitize_term() {
        assert_eq!(sanitize_term("Ann*; DROP"), "Ann DROP");
        assert_eq!(sanitize_term("ann@x.com"), "ann@x.com");
        assert_eq!(sanitize_term("  !!  "), "");
        assert_eq!(sanitize_term(&"a".repeat(80)).len(), 50);
    }

    #[test]
    fn test_build_search_query() {
        assert_eq!(
            build_search_query("Ann", ObjectKind::Customer).unwrap(),
            "name:'Ann*' OR email:'Ann*'"
        );
        assert_eq!(
            build_search_query("Gold", ObjectKind::Product).unwrap(),
            "name:'Gold*'"
        );
        assert_eq!(build_search_query("", ObjectKind::Customer), None);
        assert_eq!(build_search_query("!!!", ObjectKind::Customer), None);
        assert_eq!(build_search_query("Gold", ObjectKind::Subscription), None);
    }

    #[tokio::test]
    async fn test_fetch_normalizes_payload() {
        let adapter = seeded_adapter();
        let record = adapter.fetch("cus_1", ObjectKind::Customer).await.unwrap();
        assert_eq!(record.id(), "cus_1");
        assert_eq!(record.label(), "Ann Lee (ann@x.com)");
    }

    #[tokio::test]
    async fn test_fetch_empty_id_is_validation_error() {
        let adapter = seeded_adapter();
        let err = adapter.fetch("   ", ObjectKind::Customer).await.unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingIdentifier {
                kind: ObjectKind::Customer
            }
        );
        // The transport saw nothing.
        assert_eq!(adapter.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_configured_issues_no_calls() {
        let client = MockProviderClient::new();
        let adapter = LookupAdapter::new(client, false);

        assert_eq!(
            adapter.search("Ann", ObjectKind::Customer).await.unwrap_err(),
            LookupError::NotConfigured
        );
        assert_eq!(
            adapter.fetch("cus_1", ObjectKind::Customer).await.unwrap_err(),
            LookupError::NotConfigured
        );
        assert_eq!(adapter.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_identifier_term_routes_to_fetch() {
        let adapter = seeded_adapter();
        let page = adapter.search("cus_1", ObjectKind::Customer).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "cus_1");
        assert!(!page.more);
        // Exactly one retrieve, never the query path.
        assert_eq!(adapter.client.calls(), 1);
        assert!(adapter.client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_text_term_builds_sanitized_query() {
        let adapter = seeded_adapter();
        adapter.search("Ann*; DROP", ObjectKind::Customer).await.unwrap();
        assert_eq!(
            adapter.client.queries(),
            vec!["name:'Ann DROP*' OR email:'Ann DROP*'".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_term_lists_unfiltered() {
        let adapter = seeded_adapter();
        let page = adapter.search("", ObjectKind::Customer).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(adapter.client.queries().is_empty());
        assert_eq!(page.items[0].text, "Ann Lee (ann@x.com)");
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced_not_thrown() {
        let client = MockProviderClient::new();
        client.fail_with(LookupError::provider("No such customer: 'cus_404'"));
        let adapter = LookupAdapter::new(client, true);

        let err = adapter.fetch("cus_404", ObjectKind::Customer).await.unwrap_err();
        assert_eq!(
            err,
            LookupError::provider("No such customer: 'cus_404'")
        );
    }

    #[tokio::test]
    async fn test_plan_label_resolution() {
        let client = MockProviderClient::new();
        client.insert(json!({"id": "prod_9", "name": "Gold Plan"}));
        client.insert_plan(
            "plan_gold",
            json!({"id": "plan_gold", "product": "prod_9", "amount": 2500, "currency": "usd", "interval": "month"}),
        );
        let adapter = LookupAdapter::new(client, true);

        assert_eq!(adapter.plan_label("plan_gold").await, "Gold Plan USD25.00/month");
    }

    #[tokio::test]
    async fn test_plan_label_degrades_to_raw_string() {
        let adapter = seeded_adapter();
        // Nothing seeded under this id; resolution fails and degrades.
        assert_eq!(adapter.plan_label("Gold Monthly").await, "Gold Monthly");
        assert_eq!(adapter.plan_label("").await, "");
    }

    #[tokio::test]
    async fn test_subscription_items_resolve_plan_labels() {
        let client = MockProviderClient::new();
        client.insert(json!({
            "id": "sub_1",
            "status": "active",
            "customer": {"id": "cus_1", "name": "Ann", "email": "ann@x.com"},
            "plan": {"id": "plan_gold"}
        }));
        client.insert(json!({"id": "prod_9", "name": "Gold Plan"}));
        client.insert_plan(
            "plan_gold",
            json!({"id": "plan_gold", "product": "prod_9", "amount": 2500, "currency": "usd", "interval": "month"}),
        );
        let adapter = LookupAdapter::new(client, true);

        let page = adapter.search("", ObjectKind::Subscription).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.items[0].text,
            "Gold Plan USD25.00/month \u{2013} Ann (ann@x.com)"
        );
    }
}
