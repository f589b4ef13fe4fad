//! Stripe record picker for admin forms.
//!
//! Lets content editors pick a remote Stripe record (customer,
//! subscription, or product) through a searchable dropdown and stores a
//! durable, denormalized snapshot of the record's display data alongside
//! its identifier. Search relevance and pagination belong to Stripe; this
//! crate normalizes payloads, derives display labels, and proxies lookups.
//!
//! # Components
//!
//! - [`normalize`]: converts raw payloads (object, JSON text, bare id,
//!   empty) into canonical records with every field defaulted.
//! - [`label`]: pure, deterministic per-kind display labels.
//! - [`codec`]: decode of stored values and the never-failing save path.
//! - [`lookup`]: search/fetch over a trait-abstracted provider client.
//! - [`routes`]: the axum search endpoint the dropdown widget calls.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stripe_picker::{
//!     picker_routes, LiveStripeClient, LookupAdapter, PickerConfig,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! stripe_picker::init_tracing();
//!
//! let config = PickerConfig::builder().from_env().build();
//! let client = LiveStripeClient::from_config(&config)?;
//! let adapter = LookupAdapter::new(client, config.is_connected());
//!
//! // Mount under the host app's authenticated admin scope.
//! let routes = picker_routes(adapter);
//! # let _ = routes;
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod config;
mod error;
mod kind;
pub mod label;
mod live_client;
pub mod lookup;
pub mod normalize;
mod record;
pub mod routes;

// Re-exports for the public API
pub use codec::{decode, encode, form_value};
pub use config::{
    ConfigBuilder, CredentialSource, InvalidSecretKey, PickerConfig, SECRET_KEY_ENV,
};
pub use error::{LookupError, Result};
pub use kind::{ObjectKind, UnknownKind};
pub use label::LabelOptions;
pub use live_client::LiveStripeClient;
pub use lookup::{LookupAdapter, ProviderClient, ProviderPage, PAGE_LIMIT};
pub use record::{
    CanonicalRecord, CustomerRecord, Page, ProductRecord, SearchResultItem, SubscriptionRecord,
};
pub use routes::{picker_routes, EditCapability, SearchQuery};

#[cfg(any(test, feature = "test-client"))]
pub use lookup::test::MockProviderClient;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults.
///
/// Call early, before building the routes.
///
/// # Environment Variables
///
/// - `RUST_LOG`: log level filter (e.g. "info", "stripe_picker=debug")
/// - `STRIPE_PICKER_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("STRIPE_PICKER_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
