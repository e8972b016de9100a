//! Inbound credential checks
//!
//! Each protocol carries the client key in its own place. The configured
//! secret is kept only as a SHA-256 digest, and presented keys are hashed and
//! compared against it without exiting early on the first differing byte.

use http::HeaderMap;
use http::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::error::LlmError;
use crate::protocol::Protocol;

/// Anthropic credential header
const X_API_KEY: &str = "x-api-key";

/// Gemini credential header
const X_GOOG_API_KEY: &str = "x-goog-api-key";

/// Gemini credential query parameter
const KEY_PARAM: &str = "key";

type KeyDigest = [u8; 32];

/// Credential check for one protocol surface
#[derive(Debug, Clone)]
pub struct AuthMatcher {
    protocol: Protocol,
    expected: Option<KeyDigest>,
}

impl AuthMatcher {
    /// Build a matcher; `None` lets every request through
    pub fn new(protocol: Protocol, secret: Option<&SecretString>) -> Self {
        Self {
            protocol,
            expected: secret.map(|secret| digest(secret.expose_secret())),
        }
    }

    /// Protocol whose credential location this matcher reads
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Check the credential carried by a request
    ///
    /// `query` is the raw query string, consulted only for Gemini.
    pub fn authorize(&self, headers: &HeaderMap, query: Option<&str>) -> Result<(), LlmError> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };

        let Some(presented) = self.credential(headers, query) else {
            tracing::debug!(protocol = self.protocol.as_str(), "request carries no credential");
            return Err(LlmError::Unauthorized);
        };

        if digests_match(expected, &digest(&presented)) {
            Ok(())
        } else {
            tracing::debug!(protocol = self.protocol.as_str(), "credential mismatch");
            Err(LlmError::Unauthorized)
        }
    }

    fn credential(&self, headers: &HeaderMap, query: Option<&str>) -> Option<String> {
        match self.protocol {
            Protocol::OpenAiChat | Protocol::OpenAiResponses => {
                header(headers, AUTHORIZATION.as_str()).and_then(bearer_token).map(str::to_owned)
            }
            Protocol::Anthropic => header(headers, X_API_KEY).map(str::to_owned),
            Protocol::Gemini => header(headers, X_GOOG_API_KEY)
                .map(str::to_owned)
                .or_else(|| query.and_then(query_key)),
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Token of a `Bearer` authorization value; the scheme is case-insensitive
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn query_key(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == KEY_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn digest(value: &str) -> KeyDigest {
    Sha256::digest(value.as_bytes()).into()
}

/// Compare every byte, folding the differences together
fn digests_match(a: &KeyDigest, b: &KeyDigest) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
