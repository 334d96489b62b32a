//! OAuth flows against the Microsoft identity platform
//!
//! Tokens live for the session only; nothing is cached or refreshed.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use cx_core::config::Config;
use cx_core::credential::static_keys;
use cx_core::{AccessToken, AuthMode, Credential, OneDriveSettings};

use crate::error::GraphError;

type Result<T> = std::result::Result<T, GraphError>;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Scope requested by the client-credential flow
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Extra delay added to the polling interval on `slow_down`
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// What the user needs to complete a device-code sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodeInfo {
    pub user_code: String,
    pub verification_uri: String,

    /// Human-readable instructions from the issuer
    pub message: Option<String>,
    pub expires_in: u64,
}

#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_uri: Option<String>,
    message: Option<String>,

    #[serde(default = "default_expires_in")]
    expires_in: u64,

    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_expires_in() -> u64 {
    900
}

fn default_interval() -> u64 {
    5
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn failure(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "token endpoint returned no access token".to_string())
    }
}

/// Client for the v2.0 token endpoints of one tenant
pub struct OAuthClient {
    http: reqwest::Client,
    base: String,
    client_id: String,
    scopes: Vec<String>,
    slow_down_step: Duration,
}

impl OAuthClient {
    pub fn new(settings: &OneDriveSettings) -> Result<Self> {
        let client_id = settings
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GraphError::Auth("OneDrive client id is not configured".into()))?;

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base: format!(
                "{}/{}/oauth2/v2.0",
                settings.authority.trim_end_matches('/'),
                settings.tenant_id
            ),
            client_id,
            scopes: settings.scopes.clone(),
            slow_down_step: SLOW_DOWN_STEP,
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<(reqwest::StatusCode, T)> {
        let url = format!("{}/{endpoint}", self.base);
        tracing::debug!(%url, "oauth POST");

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| GraphError::Auth(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GraphError::Auth(e.to_string()))?;

        let parsed = serde_json::from_slice(&body).map_err(|_| {
            GraphError::Auth(format!(
                "{endpoint} returned {status}: {}",
                String::from_utf8_lossy(&body)
            ))
        })?;
        Ok((status, parsed))
    }

    async fn request_code(&self) -> Result<DeviceCodeResponse> {
        let scope = self.scopes.join(" ");
        let (status, code): (_, DeviceCodeResponse) = self
            .post_form(
                "devicecode",
                &[("client_id", self.client_id.as_str()), ("scope", scope.as_str())],
            )
            .await?;

        if !status.is_success() || code.user_code.is_none() || code.device_code.is_none() {
            return Err(GraphError::Auth("Device code flow initiation failed".into()));
        }
        Ok(code)
    }

    async fn poll_token(
        &self,
        device_code: &str,
        interval: u64,
        expires_in: u64,
    ) -> Result<AccessToken> {
        let deadline = Instant::now() + Duration::from_secs(expires_in);
        let mut wait = Duration::from_secs(interval);

        loop {
            tokio::time::sleep(wait).await;
            if Instant::now() >= deadline {
                return Err(GraphError::Auth(
                    "device code expired before sign-in completed".into(),
                ));
            }

            let (_, token): (_, TokenResponse) = self
                .post_form(
                    "token",
                    &[
                        ("client_id", self.client_id.as_str()),
                        ("device_code", device_code),
                        ("grant_type", DEVICE_CODE_GRANT),
                    ],
                )
                .await?;

            if let Some(secret) = token.access_token {
                return Ok(AccessToken::new(secret).expiring_in(token.expires_in));
            }

            match token.error.as_deref() {
                Some("authorization_pending") => {}
                Some("slow_down") => wait += self.slow_down_step,
                _ => return Err(GraphError::Auth(token.failure())),
            }
        }
    }

    /// Interactive sign-in; `prompt` shows the user code before polling starts
    pub async fn device_code<F>(&self, prompt: F) -> Result<AccessToken>
    where
        F: FnOnce(&DeviceCodeInfo),
    {
        let code = self.request_code().await?;
        let (Some(device_code), Some(user_code)) = (code.device_code, code.user_code) else {
            return Err(GraphError::Auth("Device code flow initiation failed".into()));
        };

        prompt(&DeviceCodeInfo {
            user_code,
            verification_uri: code
                .verification_uri
                .unwrap_or_else(|| "https://microsoft.com/devicelogin".to_string()),
            message: code.message,
            expires_in: code.expires_in,
        });

        let token = self
            .poll_token(&device_code, code.interval, code.expires_in)
            .await?;
        tracing::info!("device code sign-in completed");
        Ok(token)
    }

    /// App-only token from a client secret
    pub async fn client_credential(&self, client_secret: &str) -> Result<AccessToken> {
        let (_, token): (_, TokenResponse) = self
            .post_form(
                "token",
                &[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", client_secret),
                    ("scope", GRAPH_DEFAULT_SCOPE),
                    ("grant_type", "client_credentials"),
                ],
            )
            .await?;

        match token.access_token {
            Some(secret) => Ok(AccessToken::new(secret).expiring_in(token.expires_in)),
            None => Err(GraphError::Auth(token.failure())),
        }
    }
}

/// Obtain a credential with the given mode
///
/// Static keys come from the `[s3]` settings; the OAuth modes use
/// `[onedrive]`.
pub async fn authenticate<F>(
    mode: AuthMode,
    config: &Config,
    prompt: F,
) -> cx_core::Result<Credential>
where
    F: FnOnce(&DeviceCodeInfo),
{
    let token = match mode {
        AuthMode::StaticKeys => return static_keys(&config.s3),
        AuthMode::DeviceCode => OAuthClient::new(&config.onedrive)?.device_code(prompt).await?,
        AuthMode::ClientCredential => {
            let secret = config
                .onedrive
                .client_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    cx_core::Error::Auth("OneDrive client secret is not configured".into())
                })?;
            OAuthClient::new(&config.onedrive)?
                .client_credential(secret)
                .await?
        }
    };
    Ok(Credential::Bearer(token))
}
