//! Picker configuration.
//!
//! The only credential is the Stripe secret key. Resolution uses explicit,
//! enumerated sources with documented precedence (an explicitly supplied
//! key always wins over the environment) instead of ambient discovery.
//! A missing key is not an error: every remote-dependent operation
//! degrades to the "not configured" failure.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable consulted by [`ConfigBuilder::from_env`].
pub const SECRET_KEY_ENV: &str = "STRIPE_PICKER_SECRET_KEY";

/// Where a resolved secret key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Supplied directly by the embedding application.
    Explicit,
    /// Read from [`SECRET_KEY_ENV`].
    Environment,
    /// No key available; the picker is display-only.
    None,
}

/// Configuration for the picker.
#[derive(Clone)]
pub struct PickerConfig {
    secret_key: Option<SecretString>,
    source: CredentialSource,
}

impl PickerConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Whether a secret key is available.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.secret_key.is_some()
    }

    /// The source the key was resolved from.
    #[must_use]
    pub fn credential_source(&self) -> CredentialSource {
        self.source
    }

    /// The resolved secret key, if any.
    #[must_use]
    pub fn secret_key(&self) -> Option<&SecretString> {
        self.secret_key.as_ref()
    }
}

// Never expose the key in debug output.
impl std::fmt::Debug for PickerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerConfig")
            .field("connected", &self.is_connected())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PickerConfig`].
#[must_use = "builder does nothing until you call build()"]
#[derive(Default)]
pub struct ConfigBuilder {
    explicit_key: Option<SecretString>,
    env_key: Option<SecretString>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the secret key directly. Takes precedence over the
    /// environment; empty strings are treated as absent.
    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        let key: String = key.into();
        self.explicit_key = non_empty(key);
        self
    }

    /// Read the secret key from [`SECRET_KEY_ENV`] if present.
    pub fn from_env(mut self) -> Self {
        self.env_key = std::env::var(SECRET_KEY_ENV).ok().and_then(non_empty);
        self
    }

    /// Resolve the configuration. Precedence: explicit key, then
    /// environment, then unconfigured.
    pub fn build(self) -> PickerConfig {
        let (secret_key, source) = match (self.explicit_key, self.env_key) {
            (Some(key), _) => (Some(key), CredentialSource::Explicit),
            (None, Some(key)) => (Some(key), CredentialSource::Environment),
            (None, None) => (None, CredentialSource::None),
        };

        if secret_key.is_none() {
            tracing::info!(
                target: "stripe_picker::config",
                "No Stripe secret key configured, picker fields are display-only"
            );
        }

        PickerConfig { secret_key, source }
    }
}

fn non_empty(key: String) -> Option<SecretString> {
    if key.trim().is_empty() {
        None
    } else {
        Some(SecretString::new(key))
    }
}

/// Validate a Stripe secret key format.
///
/// Accepts full-access (`sk_test_`, `sk_live_`) and restricted
/// (`rk_test_`, `rk_live_`) keys of plausible length.
pub fn validate_secret_key(key: &SecretString) -> Result<(), InvalidSecretKey> {
    const MIN_KEY_LENGTH: usize = 20;

    let key = key.expose_secret();
    if key.is_empty() {
        return Err(InvalidSecretKey {
            reason: "secret key cannot be empty".to_string(),
        });
    }
    if key.len() < MIN_KEY_LENGTH {
        return Err(InvalidSecretKey {
            reason: format!("secret key too short (minimum {MIN_KEY_LENGTH} characters)"),
        });
    }

    let valid_prefixes = ["sk_test_", "sk_live_", "rk_test_", "rk_live_"];
    if !valid_prefixes.iter().any(|prefix| key.starts_with(prefix)) {
        return Err(InvalidSecretKey {
            reason: "secret key must start with sk_test_, sk_live_, rk_test_, or rk_live_"
                .to_string(),
        });
    }

    Ok(())
}

/// Error returned when a secret key fails format validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid Stripe secret key: {reason}")]
pub struct InvalidSecretKey {
    pub reason: String,
}
