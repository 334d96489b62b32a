//! Credentials held for the lifetime of one session
//!
//! Nothing here is persisted or refreshed. Re-authentication is a fresh
//! call to the provider that issued the credential.

use std::str::FromStr;

use crate::config::S3Settings;
use crate::error::{Error, Result};

/// How a credential is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Interactive OAuth device-code flow (OneDrive)
    DeviceCode,
    /// Confidential client exchanging a secret for a token (OneDrive)
    ClientCredential,
    /// Access key / secret / region triple (S3)
    StaticKeys,
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "device-code" | "device_code" => Ok(AuthMode::DeviceCode),
            "client-credential" | "client_credential" => Ok(AuthMode::ClientCredential),
            "static-keys" | "static_keys" => Ok(AuthMode::StaticKeys),
            other => Err(Error::Config(format!(
                "Unknown auth mode '{other}'. Use device-code, client-credential or static-keys"
            ))),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::DeviceCode => write!(f, "device-code"),
            AuthMode::ClientCredential => write!(f, "client-credential"),
            AuthMode::StaticKeys => write!(f, "static-keys"),
        }
    }
}

/// Bearer token for Microsoft Graph
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,

    /// Expiry reported by the issuer, informational only
    pub expires_at: Option<jiff::Timestamp>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    /// Record the issuer's `expires_in` relative to now
    pub fn expiring_in(mut self, seconds: Option<u64>) -> Self {
        self.expires_at = seconds.and_then(|s| {
            let span = jiff::SignedDuration::from_secs(i64::try_from(s).ok()?);
            jiff::Timestamp::now().checked_add(span).ok()
        });
        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Static S3 keys
#[derive(Clone, PartialEq, Eq)]
pub struct S3Keys {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,

    /// Custom endpoint for S3-compatible services
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for S3Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Keys")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// A credential for one of the two clouds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(AccessToken),
    S3Keys(S3Keys),
}

impl Credential {
    pub fn as_bearer(&self) -> Option<&AccessToken> {
        match self {
            Credential::Bearer(token) => Some(token),
            Credential::S3Keys(_) => None,
        }
    }

    pub fn as_s3_keys(&self) -> Option<&S3Keys> {
        match self {
            Credential::S3Keys(keys) => Some(keys),
            Credential::Bearer(_) => None,
        }
    }
}

/// Wrap configured S3 keys into a credential
///
/// No network call is made, so bad keys only surface on first use.
pub fn static_keys(settings: &S3Settings) -> Result<Credential> {
    let access_key = settings
        .access_key
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Auth("S3 access key is not configured".into()))?;
    let secret_key = settings
        .secret_key
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Auth("S3 secret key is not configured".into()))?;

    Ok(Credential::S3Keys(S3Keys {
        access_key,
        secret_key,
        region: settings.region.clone(),
        endpoint: settings.endpoint.clone(),
    }))
}
