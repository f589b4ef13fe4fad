//! Live Stripe client.
//!
//! Implements [`ProviderClient`] over the Stripe SDK with secure key
//! handling and uniform error mapping. Typed SDK responses are converted
//! to raw JSON at the trait boundary so the normalizer sees the same
//! payload shape regardless of transport.
//!
//! A single failed attempt is surfaced immediately; retry policy and
//! timeouts belong to the HTTP layer underneath the SDK, not here.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::{validate_secret_key, InvalidSecretKey, PickerConfig};
use crate::error::{LookupError, Result};
use crate::kind::ObjectKind;
use crate::lookup::{ProviderClient, ProviderPage};

/// Expansions applied to subscription reads so customer and plan data
/// arrive inline.
const SUBSCRIPTION_EXPAND: &[&str] = &["customer", "items.data.plan", "items.data.price"];
const SUBSCRIPTION_LIST_EXPAND: &[&str] = &[
    "data.customer",
    "data.items.data.plan",
    "data.items.data.price",
];

/// Production Stripe client.
///
/// The secret key is validated on construction and held in a
/// [`SecretString`] so it never appears in debug output.
#[derive(Clone)]
pub struct LiveStripeClient {
    client: stripe::Client,
    api_key: SecretString,
}

impl LiveStripeClient {
    /// Create a client from a secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key format is invalid.
    pub fn new(api_key: impl Into<SecretString>) -> std::result::Result<Self, InvalidSecretKey> {
        let api_key: SecretString = api_key.into();
        validate_secret_key(&api_key)?;

        let client = stripe::Client::new(api_key.expose_secret()).with_app_info(
            "stripe-picker".to_string(),
            Some(env!("CARGO_PKG_VERSION").to_string()),
            None,
        );

        Ok(Self { client, api_key })
    }

    /// Create a client from a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotConfigured`] when no key is configured,
    /// or a provider error when the key format is invalid.
    pub fn from_config(config: &PickerConfig) -> Result<Self> {
        let key = config.secret_key().ok_or(LookupError::NotConfigured)?;
        Self::new(key.clone()).map_err(|err| LookupError::provider(err.to_string()))
    }

    /// Whether the client holds a test-mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        let key = self.api_key.expose_secret();
        key.starts_with("sk_test_") || key.starts_with("rk_test_")
    }
}

impl std::fmt::Debug for LiveStripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStripeClient")
            .field("is_test_mode", &self.is_test_mode())
            .finish_non_exhaustive()
    }
}

impl ProviderClient for LiveStripeClient {
    async fn retrieve(&self, kind: ObjectKind, id: &str) -> Result<Value> {
        match kind {
            ObjectKind::Customer => {
                let customer_id = parse_id::<stripe::CustomerId>(kind, id)?;
                let customer = stripe::Customer::retrieve(&self.client, &customer_id, &[])
                    .await
                    .map_err(|e| map_stripe_error(e, kind, id))?;
                to_payload(&customer)
            }
            ObjectKind::Subscription => {
                let subscription_id = parse_id::<stripe::SubscriptionId>(kind, id)?;
                let subscription = stripe::Subscription::retrieve(
                    &self.client,
                    &subscription_id,
                    SUBSCRIPTION_EXPAND,
                )
                .await
                .map_err(|e| map_stripe_error(e, kind, id))?;
                to_payload(&subscription)
            }
            ObjectKind::Product => {
                let product_id = parse_id::<stripe::ProductId>(kind, id)?;
                let product = stripe::Product::retrieve(&self.client, &product_id, &[])
                    .await
                    .map_err(|e| map_stripe_error(e, kind, id))?;
                to_payload(&product)
            }
        }
    }

    async fn list(&self, kind: ObjectKind, limit: u64) -> Result<ProviderPage> {
        match kind {
            ObjectKind::Customer => {
                let mut params = stripe::ListCustomers::new();
                params.limit = Some(limit);
                let list = stripe::Customer::list(&self.client, &params)
                    .await
                    .map_err(|e| map_stripe_error(e, kind, ""))?;
                collect_page(list.data, list.has_more)
            }
            ObjectKind::Subscription => {
                let mut params = stripe::ListSubscriptions::new();
                params.limit = Some(limit);
                params.expand = SUBSCRIPTION_LIST_EXPAND;
                let list = stripe::Subscription::list(&self.client, &params)
                    .await
                    .map_err(|e| map_stripe_error(e, kind, ""))?;
                collect_page(list.data, list.has_more)
            }
            ObjectKind::Product => {
                let mut params = stripe::ListProducts::new();
                params.limit = Some(limit);
                let list = stripe::Product::list(&self.client, &params)
                    .await
                    .map_err(|e| map_stripe_error(e, kind, ""))?;
                collect_page(list.data, list.has_more)
            }
        }
    }

    async fn search(&self, kind: ObjectKind, query: &str, limit: u64) -> Result<ProviderPage> {
        match kind {
            ObjectKind::Customer => {
                let params = stripe::CustomerSearchParams {
                    query: query.to_string(),
                    limit: Some(limit),
                    ..Default::default()
                };
                let list = stripe::Customer::search(&self.client, params)
                    .await
                    .map_err(|e| map_stripe_error(e, kind, ""))?;
                collect_page(list.data, list.has_more)
            }
            ObjectKind::Product => {
                let params = stripe::ProductSearchParams {
                    query: query.to_string(),
                    limit: Some(limit),
                    ..Default::default()
                };
                let list = stripe::Product::search(&self.client, params)
                    .await
                    .map_err(|e| map_stripe_error(e, kind, ""))?;
                collect_page(list.data, list.has_more)
            }
            // Stripe has no text search over subscriptions; the adapter
            // never routes here, but an unfiltered page is the safe answer.
            ObjectKind::Subscription => self.list(kind, limit).await,
        }
    }

    async fn retrieve_plan(&self, plan_id: &str) -> Result<Value> {
        let id: stripe::PlanId = plan_id
            .parse()
            .map_err(|_| LookupError::provider(format!("Invalid plan ID: {plan_id}")))?;
        let plan = stripe::Plan::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| map_stripe_error(e, ObjectKind::Product, plan_id))?;
        to_payload(&plan)
    }
}

fn parse_id<T: std::str::FromStr>(kind: ObjectKind, id: &str) -> Result<T> {
    id.parse().map_err(|_| {
        LookupError::provider(format!("Invalid {} ID: {id}", kind.as_str()))
    })
}

/// Serialize a typed SDK object into the raw payload shape the
/// normalizer consumes.
fn to_payload<T: serde::Serialize>(object: &T) -> Result<Value> {
    serde_json::to_value(object)
        .map_err(|e| LookupError::provider(format!("Failed to serialize Stripe response: {e}")))
}

fn collect_page<T: serde::Serialize>(data: Vec<T>, has_more: bool) -> Result<ProviderPage> {
    let data = data
        .iter()
        .map(to_payload)
        .collect::<Result<Vec<Value>>>()?;
    Ok(ProviderPage { data, has_more })
}

/// Map SDK errors onto the lookup taxonomy. A 404 from Stripe is a
/// legitimate "no such record"; everything else carries the provider's
/// message through verbatim.
fn map_stripe_error(error: stripe::StripeError, kind: ObjectKind, id: &str) -> LookupError {
    match error {
        stripe::StripeError::Stripe(request_error) => {
            if request_error.http_status == 404 && !id.is_empty() {
                return LookupError::NotFound {
                    kind,
                    id: id.to_string(),
                };
            }
            let message = request_error
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            LookupError::Provider { message }
        }
        stripe::StripeError::Timeout => LookupError::provider("Request timed out"),
        stripe::StripeError::ClientError(msg) => {
            LookupError::provider(format!("HTTP client error: {msg}"))
        }
        other => LookupError::provider(other.to_string()),
    }
}
