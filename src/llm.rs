//! Client for the hosted text-generation endpoint.
//!
//! The wire format is a JSON object `{"question": ..., "search": ...}` posted
//! with a bearer token; the answer is a JSON object whose `output` field holds
//! the generated text. Every other field in the answer is ignored.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::{DocgenError, Result};

/// Routes every request to one deployment instead of the endpoint's traffic rules.
pub const DEPLOYMENT_HEADER: &str = "azureml-model-deployment";
pub const DEPLOYMENT_NAME: &str = "blue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Request {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Response {
    pub output: String,
}

/// Raw HTTP answer as seen by the transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam of the client. Production code uses [`ReqwestTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<TransportResponse>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// `accept_invalid_certs` disables TLS verification for this client only,
    /// for endpoints served with self-signed certificates.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        if accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the endpoint");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| DocgenError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<TransportResponse> {
        let mut builder = self.client.post(url).body(body);
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DocgenError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<non-ascii>").to_string(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| DocgenError::Transport(format!("failed to read response body: {}", e)))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

pub struct EndpointClient<T> {
    transport: T,
    credential: Option<SecretString>,
    url: String,
}

impl<T> std::fmt::Debug for EndpointClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointClient")
            .field("credential", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

impl<T: Transport> EndpointClient<T> {
    pub fn new(transport: T, credential: Option<SecretString>, url: impl Into<String>) -> Self {
        Self {
            transport,
            credential,
            url: url.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn headers(credential: &SecretString) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", "application/json".to_string()),
            (
                "Authorization",
                format!("Bearer {}", credential.expose_secret()),
            ),
            (DEPLOYMENT_HEADER, DEPLOYMENT_NAME.to_string()),
        ]
    }

    /// Send one request and parse the answer.
    ///
    /// The credential is checked before the transport is touched, so a
    /// missing key never produces network traffic.
    pub async fn invoke(&self, request: &Request) -> Result<Response> {
        let credential = self
            .credential
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or_else(|| DocgenError::config("a key must be provided to invoke the endpoint"))?;

        let body = serde_json::to_vec(request)
            .map_err(|e| DocgenError::Transport(format!("failed to encode request: {}", e)))?;

        debug!(url = %self.url, search = ?request.search, "Invoking endpoint");
        let response = self
            .transport
            .post(&self.url, &Self::headers(credential), body)
            .await?;

        if !response.is_success() {
            // Headers carry the request id and timestamp needed to trace the failure server-side.
            error!(
                status = response.status,
                headers = ?response.headers,
                body = %response.body,
                "The request failed"
            );
            return Err(DocgenError::Endpoint {
                status: response.status,
                body: response.body,
            });
        }

        debug!(body = %response.body, "Endpoint response");
        serde_json::from_str(&response.body).map_err(|e| DocgenError::InvalidResponse(e.to_string()))
    }
}
