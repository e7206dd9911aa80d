//! HTTP transport seam.
//!
//! [`Transport`] is the only place bytes leave the process. [`HttpTransport`]
//! is the reqwest implementation; tests substitute scripted fakes.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::{TransportError, map_reqwest_error};
use crate::request::Endpoint;

/// Response body as it arrives.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A fully built request.
#[derive(Clone)]
pub struct TransportRequest {
    /// Which endpoint this targets.
    pub endpoint: Endpoint,
    /// Absolute URL.
    pub url: String,
    /// Header pairs, sent in order. Includes `cookie`.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: serde_json::Value,
}

impl TransportRequest {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("cookie") {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("TransportRequest")
            .field("endpoint", &self.endpoint)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Status plus a streaming body.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body chunks.
    pub body: ByteStream,
}

impl TransportResponse {
    /// A response whose body is delivered as one chunk.
    pub fn buffered(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: Box::pin(futures::stream::once(async move { Ok::<_, TransportError>(body) })),
        }
    }

    /// A response whose body is delivered as the given chunks, in order.
    pub fn chunked(status: u16, chunks: Vec<Result<Bytes, TransportError>>) -> Self {
        Self {
            status,
            body: Box::pin(futures::stream::iter(chunks)),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drain the body into a (lossy) string. Used for error bodies.
    pub async fn text(self) -> Result<String, TransportError> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Delivers a request and returns the status and body stream.
///
/// Non-success statuses are returned, not turned into errors; the session
/// decides what they mean.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] over [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over a preconfigured client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error));

        Ok(TransportResponse {
            status,
            body: Box::pin(body),
        })
    }
}
