//! `reqwest`-backed transport.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Response};

use super::{ByteStream, Transport};
use crate::error::TransportError;

/// HTTP transport with a pooled client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .pool_max_idle_per_host(1)
            .user_agent(concat!("bragi/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn open(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        let url = reqwest::Url::parse(url).map_err(|err| {
            TransportError::Client(format!("invalid URL {url:?}: {err}"))
        })?;
        let request = self.client.get(url).send();
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| TransportError::Timeout { after: timeout })??;

        Ok(Box::new(HttpStream::new(response, timeout)))
    }
}

/// Response body read chunk by chunk.
///
/// One chunk is buffered at a time; the stream only reports itself
/// disconnected once that chunk has been consumed.
#[derive(Debug)]
pub struct HttpStream {
    status: u16,
    declared: Option<u64>,
    response: Option<Response>,
    pending: Bytes,
    read_timeout: Duration,
}

impl HttpStream {
    fn new(response: Response, read_timeout: Duration) -> Self {
        Self {
            status: response.status().as_u16(),
            declared: response.content_length(),
            response: Some(response),
            pending: Bytes::new(),
            read_timeout,
        }
    }

    fn disconnect(&mut self) {
        self.response = None;
    }
}

#[async_trait::async_trait]
impl ByteStream for HttpStream {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn declared_length(&self) -> Option<u64> {
        self.declared
    }

    fn is_connected(&self) -> bool {
        self.response.is_some() || !self.pending.is_empty()
    }

    async fn available(&mut self) -> usize {
        if !self.pending.is_empty() {
            return self.pending.len();
        }

        let read_timeout = self.read_timeout;
        let Some(response) = self.response.as_mut() else {
            return 0;
        };

        match tokio::time::timeout(read_timeout, response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                self.pending = chunk;
            }
            Ok(Ok(None)) => {
                self.disconnect();
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "image body read failed");
                self.disconnect();
            }
            Err(_) => {
                tracing::warn!(timeout = ?read_timeout, "image body read timed out");
                self.disconnect();
            }
        }

        self.pending.len()
    }

    fn read(&mut self, dest: &mut [u8]) -> usize {
        let n = dest.len().min(self.pending.len());
        dest[..n].copy_from_slice(&self.pending[..n]);
        self.pending = self.pending.slice(n..);
        n
    }

    fn close(&mut self) {
        self.pending = Bytes::new();
        self.disconnect();
    }
}
