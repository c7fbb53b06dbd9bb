//! OAuth2 authorization for Bitrix24 applications.
//!
//! This module implements the authorization-code grant used by local and
//! marketplace applications, plus the refresh-token grant that keeps the
//! access token alive.
//!
//! ## Token Lifetime
//!
//! Access tokens expire after one hour. [`OAuth2Client::access_token`] refreshes
//! an expired token before handing it out, and refreshes are serialized so that
//! two concurrent callers never spend the same refresh token twice.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::client::{
    transport::HttpTransport,
    types::TokenResponse,
    url::UrlFormatter,
};
use crate::error::{Error, Result};
use crate::query::{ParamMap, ParamTree};

/// Tokens are treated as expired this many seconds early.
const EXPIRY_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Tokens {
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Utc::now() + Duration::seconds(EXPIRY_LEEWAY_SECS) >= at)
            .unwrap_or(false)
    }
}

/// In-memory cache for the current token pair.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<Option<Tokens>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Tokens> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stores a token pair. `expires_in` is the access token lifetime in seconds.
    pub fn set(&self, access_token: String, refresh_token: String, expires_in: Option<i64>) {
        let tokens = Tokens {
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        };
        *self
            .tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tokens);
    }

    pub fn is_authorized(&self) -> bool {
        self.get().is_some()
    }
}

/// # Bitrix24 OAuth2 Client
///
/// Builds the browser authorization URL, exchanges authorization codes for
/// tokens and refreshes them. Tokens are cached in a [`TokenStore`].
pub struct OAuth2Client {
    hostname: String,
    client_id: String,
    client_secret: String,
    urls: UrlFormatter,
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    refresh_lock: Mutex<()>,
}

impl OAuth2Client {
    pub fn new(
        hostname: String,
        client_id: String,
        client_secret: String,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            hostname,
            client_id,
            client_secret,
            urls: UrlFormatter::https(),
            transport,
            tokens: TokenStore::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_url_formatter(mut self, urls: UrlFormatter) -> Self {
        self.urls = urls;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// URL the user's browser should open to grant access. `extra` may carry
    /// `state` or `redirect_uri`; `client_id` and `response_type` always win.
    pub fn auth_url(&self, extra: ParamMap) -> Result<String> {
        let mut query = extra;
        query.insert("client_id".to_string(), ParamTree::from(self.client_id.as_str()));
        query.insert("response_type".to_string(), ParamTree::from("code"));
        self.urls
            .format(&self.hostname, &["oauth", "authorize", ""], Some(&query))
    }

    /// Exchanges an authorization code for a token pair and caches it.
    pub async fn fetch_auth(&self, auth_code: &str, extra: ParamMap) -> Result<TokenResponse> {
        let mut query = extra;
        query
            .entry("scope".to_string())
            .or_insert_with(|| ParamTree::from(""));
        query.insert("client_id".to_string(), ParamTree::from(self.client_id.as_str()));
        query.insert(
            "client_secret".to_string(),
            ParamTree::from(self.client_secret.as_str()),
        );
        query.insert("code".to_string(), ParamTree::from(auth_code));
        query.insert("grant_type".to_string(), ParamTree::from("authorization_code"));

        let _guard = self.refresh_lock.lock().await;
        self.request_tokens(query).await
    }

    /// Trades the cached refresh token for a new pair.
    pub async fn refresh_auth(&self, extra: ParamMap) -> Result<TokenResponse> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(extra).await
    }

    /// Current access token, refreshed first if it has expired.
    pub async fn access_token(&self) -> Result<String> {
        match self.tokens.get() {
            None => return Err(Error::NotAuthorized),
            Some(tokens) if !tokens.is_expired() => return Ok(tokens.access_token),
            Some(_) => {}
        }

        let _guard = self.refresh_lock.lock().await;
        // another caller may have refreshed while we waited
        if let Some(tokens) = self.tokens.get() {
            if !tokens.is_expired() {
                return Ok(tokens.access_token);
            }
        }
        tracing::info!("Access token expired, refreshing");
        Ok(self.refresh_locked(ParamMap::new()).await?.access_token)
    }

    async fn refresh_locked(&self, extra: ParamMap) -> Result<TokenResponse> {
        let refresh_token = self
            .tokens
            .get()
            .map(|tokens| tokens.refresh_token)
            .ok_or(Error::NotAuthorized)?;

        let mut query = extra;
        query.insert("client_id".to_string(), ParamTree::from(self.client_id.as_str()));
        query.insert(
            "client_secret".to_string(),
            ParamTree::from(self.client_secret.as_str()),
        );
        query.insert("grant_type".to_string(), ParamTree::from("refresh_token"));
        query.insert("refresh_token".to_string(), ParamTree::from(refresh_token));
        self.request_tokens(query).await
    }

    async fn request_tokens(&self, query: ParamMap) -> Result<TokenResponse> {
        let grant = query
            .get("grant_type")
            .and_then(ParamTree::as_str)
            .unwrap_or_default()
            .to_string();
        let url = self
            .urls
            .format(&self.hostname, &["oauth", "token", ""], Some(&query))?;

        tracing::debug!("Requesting {} grant from {}", grant, self.hostname);
        let body = self.transport.post(&url, None, &[]).await?;

        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to parse token response: {}", e);
            e
        })?;
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            let description = value
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            tracing::error!("Token request failed: {} {}", error, description);
            return Err(Error::Api {
                error: error.to_string(),
                description,
            });
        }

        let tokens: TokenResponse = serde_json::from_value(value)?;
        self.tokens.set(
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in,
        );
        tracing::info!("Obtained tokens via {} grant", grant);
        tracing::debug!(
            "Received token: {}...",
            token_preview(&tokens.access_token)
        );
        Ok(tokens)
    }
}

/// First ten characters of a token, safe for logs.
fn token_preview(token: &str) -> String {
    token.chars().take(10).collect()
}
