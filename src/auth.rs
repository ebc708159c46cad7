//! OAuth password-grant token acquisition with scope fallback.
//!
//! The token endpoint is tried once per [`TokenStrategy`], in order, until one
//! attempt answers `200 OK` with an access token. Attempts are independent and
//! sent back to back.

use std::{fmt, time::Duration};

use log::{debug, info, warn};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use url::Url;

use crate::client;
use crate::error::{AttemptFailure, ProbeError};
use crate::rest_types::TokenResponse;

pub const TOKEN_ROUTE: &str = "oauth/token";

#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// One shape of token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStrategy {
    pub label: &'static str,
    pub scope: Option<&'static str>,
}

/// `read+write` is kept as a literal and written into the body unencoded.
/// How the server decodes the `+` is left to the server.
pub const SCOPE_FALLBACK: [TokenStrategy; 3] = [
    TokenStrategy {
        label: "scope=read+write",
        scope: Some("read+write"),
    },
    TokenStrategy {
        label: "scope=api",
        scope: Some("api"),
    },
    TokenStrategy {
        label: "no scope",
        scope: None,
    },
];

impl TokenStrategy {
    /// Form body for this attempt. Values are concatenated without
    /// percent-encoding.
    pub fn request_body(&self, credentials: &Credentials) -> String {
        let mut body = format!(
            "grant_type=password&client_id={}&client_secret={}",
            credentials.client_id, credentials.client_secret
        );
        if let Some(scope) = self.scope {
            body.push_str("&scope=");
            body.push_str(scope);
        }
        body
    }
}

#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    pub expires_in: Option<Duration>,
    pub scope: Option<String>,
    pub strategy: &'static str,
}

impl AccessToken {
    /// Token obtained through `strategy`, with no lifetime or scope echoed.
    pub fn new(secret: impl Into<String>, strategy: &'static str) -> Self {
        Self {
            secret: secret.into(),
            expires_in: None,
            scope: None,
            strategy,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("strategy", &self.strategy)
            .finish()
    }
}

pub async fn acquire_token(
    http: &Client,
    base_url: &Url,
    credentials: &Credentials,
    strategies: &[TokenStrategy],
) -> Result<AccessToken, ProbeError> {
    let url = client::api_root(base_url.clone()).join(TOKEN_ROUTE)?;
    let mut attempts = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        match try_strategy(http, &url, credentials, strategy).await {
            Ok(token) => {
                info!("Obtained access token using {}", strategy.label);
                return Ok(token);
            }
            Err(reason) => {
                warn!("Token attempt with {} failed: {}", strategy.label, reason);
                attempts.push(AttemptFailure {
                    strategy: strategy.label,
                    reason,
                });
            }
        }
    }

    Err(ProbeError::Auth { attempts })
}

async fn try_strategy(
    http: &Client,
    url: &Url,
    credentials: &Credentials,
    strategy: &TokenStrategy,
) -> Result<AccessToken, String> {
    debug!("Requesting token from {} with {}", url, strategy.label);

    let response = http
        .post(url.clone())
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(strategy.request_body(credentials))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status != StatusCode::OK {
        return Err(format!("{} - {}", status, body));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| format!("{} - unreadable token response: {}", status, e))?;

    Ok(AccessToken {
        expires_in: token.expires_in.map(Duration::from_secs),
        scope: token.scope,
        ..AccessToken::new(token.access_token, strategy.label)
    })
}
