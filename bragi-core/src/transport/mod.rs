//! The network seam the loader reads through.
//!
//! A [`Transport`] opens a request and hands back a [`ByteStream`] that
//! mirrors how the display firmware talks to its HTTP client: a status code,
//! a declared length that may be missing or wrong, and a stream that is
//! polled for available bytes until it disconnects.

use std::time::Duration;

use crate::error::TransportError;

pub mod http;

pub use http::{HttpStream, HttpTransport};

/// Opens byte streams for URLs.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and wait (at most `timeout`) for response headers.
    async fn open(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ByteStream>, TransportError>;
}

/// An open response body.
#[async_trait::async_trait]
pub trait ByteStream: Send {
    fn status_code(&self) -> u16;

    /// Content length as reported by the response, if any.
    fn declared_length(&self) -> Option<u64>;

    fn is_connected(&self) -> bool;

    /// Number of bytes that [`read`](Self::read) can return without waiting.
    ///
    /// When nothing is buffered this waits for the next chunk. End of body,
    /// a read error, or a timeout marks the stream disconnected and
    /// returns `0`.
    async fn available(&mut self) -> usize;

    /// Copy buffered bytes into `dest`; returns how many were written.
    fn read(&mut self, dest: &mut [u8]) -> usize;

    fn close(&mut self);
}
