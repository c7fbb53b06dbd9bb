//! HTTP transport used by the client.
//!
//! The client only ever POSTs, and it treats the response body as opaque
//! bytes; decoding and error mapping happen a layer up. Anything implementing
//! [`HttpTransport`] can stand in for the default [`ReqwestTransport`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

pub trait HttpTransport: Send + Sync {
    /// Sends `body` to `url` and returns the raw response body.
    fn post<'a>(
        &'a self,
        url: &'a str,
        body: Option<String>,
        headers: &'a [(String, String)],
    ) -> TransportFuture<'a>;
}

/// [`HttpTransport`] over a shared `reqwest` client.
///
/// Non-2xx responses are not errors here: Bitrix24 reports failures as a JSON
/// envelope in the body, so the body is handed back either way.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl HttpTransport for ReqwestTransport {
    fn post<'a>(
        &'a self,
        url: &'a str,
        body: Option<String>,
        headers: &'a [(String, String)],
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            // the query may carry an access token
            let endpoint = url.split('?').next().unwrap_or(url);
            tracing::debug!("POST {}", endpoint);

            let mut request = self.client.post(url).timeout(self.timeout);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some(body) = body {
                request = request.body(body);
            }

            let response = request.send().await.map_err(|e| {
                tracing::error!("Network error calling {}: {}", endpoint, e);
                e
            })?;

            let status = response.status();
            tracing::debug!("Response status from {}: {}", endpoint, status);
            if !status.is_success() {
                tracing::warn!("Bitrix24 answered {} with status {}", endpoint, status);
            }

            Ok(response.bytes().await?.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_body_and_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/profile.json"))
            .and(header("Content-Type", "application/json"))
            .and(body_string("{\"a\":1}"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"result\":{}}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new();
        let url = format!("{}/rest/profile.json", mock_server.uri());
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let body = transport
            .post(&url, Some("{\"a\":1}".to_string()), &headers)
            .await
            .unwrap();

        assert_eq!(body, b"{\"result\":{}}".to_vec());
    }

    #[tokio::test]
    async fn error_statuses_still_return_the_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/profile.json"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("{\"error\":\"expired_token\"}"),
            )
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new();
        let url = format!("{}/rest/profile.json", mock_server.uri());
        let body = transport.post(&url, None, &[]).await.unwrap();

        assert_eq!(body, b"{\"error\":\"expired_token\"}".to_vec());
    }

    #[tokio::test]
    async fn connection_failures_are_transport_errors() {
        let transport = ReqwestTransport::new().with_timeout(Duration::from_secs(2));
        let result = transport.post("http://127.0.0.1:1/rest/x.json", None, &[]).await;

        assert!(matches!(result, Err(crate::error::Error::Transport(_))));
    }
}
