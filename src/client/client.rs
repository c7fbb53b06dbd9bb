use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::batch::{Batch, BatchRequest, MAX_BATCH_CALLS};
use crate::client::{
    auth::OAuth2Client,
    transport::{HttpTransport, ReqwestTransport},
    types::ApiResponse,
    url::UrlFormatter,
};
use crate::config::{Config, Mode};
use crate::error::Result;
use crate::query::{ParamMap, ParamTree};

/// How requests are authorized.
pub enum Credentials {
    /// Inbound webhook: the secret code is part of the URL path.
    Webhook { auth_code: String },
    /// OAuth2 application: an access token travels in the `auth` query parameter.
    Application(Arc<OAuth2Client>),
}

pub struct Bitrix24Client {
    hostname: String,
    user_id: u64,
    credentials: Credentials,
    urls: UrlFormatter,
    transport: Arc<dyn HttpTransport>,
}

impl Bitrix24Client {
    pub fn new(hostname: String, credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            hostname,
            user_id: 1,
            credentials,
            urls: UrlFormatter::https(),
            transport,
        }
    }

    /// Client for an inbound webhook created by `user_id`.
    pub fn inbound_webhook(hostname: String, user_id: u64, auth_code: String) -> Self {
        Self::new(
            hostname,
            Credentials::Webhook { auth_code },
            Arc::new(ReqwestTransport::new()),
        )
        .with_user_id(user_id)
    }

    /// Client for an OAuth2 application. Tokens must be obtained through
    /// [`Bitrix24Client::oauth2`] before the first call.
    pub fn application(hostname: String, client_id: String, client_secret: String) -> Self {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
        let oauth = OAuth2Client::new(hostname.clone(), client_id, client_secret, transport.clone());
        Self::new(hostname, Credentials::Application(Arc::new(oauth)), transport)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let urls = UrlFormatter::new(config.scheme.as_str());
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
        let credentials = match config.mode()? {
            Mode::Webhook { auth_code } => Credentials::Webhook {
                auth_code: auth_code.to_string(),
            },
            Mode::Application {
                client_id,
                client_secret,
            } => {
                let oauth = OAuth2Client::new(
                    config.hostname.clone(),
                    client_id.to_string(),
                    client_secret.to_string(),
                    transport.clone(),
                )
                .with_url_formatter(urls.clone());
                Credentials::Application(Arc::new(oauth))
            }
        };
        Ok(Self::new(config.hostname.clone(), credentials, transport)
            .with_user_id(config.user_id)
            .with_url_formatter(urls))
    }

    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_url_formatter(mut self, urls: UrlFormatter) -> Self {
        self.urls = urls;
        self
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// The OAuth2 client, for application credentials.
    pub fn oauth2(&self) -> Option<&OAuth2Client> {
        match &self.credentials {
            Credentials::Application(oauth) => Some(oauth.as_ref()),
            Credentials::Webhook { .. } => None,
        }
    }

    fn base_path(&self) -> Vec<String> {
        match &self.credentials {
            Credentials::Webhook { auth_code } => vec![
                "rest".to_string(),
                self.user_id.to_string(),
                auth_code.clone(),
            ],
            Credentials::Application(_) => vec!["rest".to_string()],
        }
    }

    async fn auth_query(&self) -> Result<Option<ParamMap>> {
        match &self.credentials {
            Credentials::Webhook { .. } => Ok(None),
            Credentials::Application(oauth) => {
                let mut query = ParamMap::new();
                query.insert("auth".to_string(), ParamTree::from(oauth.access_token().await?));
                Ok(Some(query))
            }
        }
    }

    /// Calls a REST method with JSON-serialized `params`.
    pub async fn call<P: Serialize + ?Sized>(&self, method: &str, params: &P) -> Result<ApiResponse> {
        let mut path = self.base_path();
        path.push(format!("{}.json", method));
        let query = self.auth_query().await?;
        let url = self.urls.format(&self.hostname, path.as_slice(), query.as_ref())?;

        let body = serde_json::to_string(params)?;
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        tracing::debug!("Calling {} on {}", method, self.hostname);
        let raw = self.transport.post(&url, Some(body), &headers).await?;

        let response: ApiResponse = serde_json::from_slice(&raw).map_err(|e| {
            tracing::error!("Failed to parse response of {}: {}", method, e);
            e
        })?;
        if let Some(error) = response.error.as_deref() {
            tracing::warn!("{} failed: {}", method, error);
        }
        response.into_checked()
    }

    /// Runs the calls of `batch` in one request. With `halt` the server stops
    /// at the first failing call. Batches above [`MAX_BATCH_CALLS`] are still
    /// sent; the server decides what to do with the excess.
    pub async fn call_batch(&self, batch: &Batch, halt: bool) -> Result<ApiResponse> {
        if batch.exceeds_limit() {
            tracing::warn!(
                "Batch holds {} calls, more than the {} the server accepts",
                batch.len(),
                MAX_BATCH_CALLS
            );
        }
        let request = BatchRequest {
            cmd: batch.compile()?,
            halt,
        };
        tracing::debug!("Sending batch of {} calls (halt: {})", request.cmd.len(), halt);
        self.call("batch", &request).await
    }

    /// Installs an event handler. `auth_type` defaults to the client's user id.
    pub async fn call_bind(&self, event: &str, handler: &str, auth_type: Option<u64>) -> Result<ApiResponse> {
        let params = json!({
            "auth_type": auth_type.unwrap_or(self.user_id),
            "event": event,
            "handler": handler,
        });
        self.call("event.bind", &params).await
    }

    /// Removes a previously installed event handler.
    pub async fn call_unbind(&self, event: &str, handler: &str, auth_type: Option<u64>) -> Result<ApiResponse> {
        let params = json!({
            "auth_type": auth_type.unwrap_or(self.user_id),
            "event": event,
            "handler": handler,
        });
        self.call("event.unbind", &params).await
    }
}
