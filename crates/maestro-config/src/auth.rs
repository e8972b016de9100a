use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Inbound credential check shared by every protocol surface
///
/// When no key is configured (or it expands to an empty string) requests
/// are accepted without credentials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Secret clients must present
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl AuthConfig {
    /// The configured secret, if it is non-empty
    pub fn secret(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|key| !key.expose_secret().is_empty())
    }
}
