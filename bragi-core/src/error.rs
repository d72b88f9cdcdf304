use std::time::Duration;

use thiserror::Error;

use crate::units::ByteSize;

/// Failures raised by a [`Transport`](crate::transport::Transport) before a
/// response is available.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The request was refused before reaching the network.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Why a load did not commit an image.
///
/// Every variant leaves the cache slot empty. None are retried internally.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("connection failed: {0}")]
    Connect(#[source] TransportError),

    #[error("HTTP status {status}")]
    BadStatus { status: u16 },

    #[error("invalid declared size {declared:?} (limit {max} bytes)")]
    InvalidSize { declared: Option<u64>, max: usize },

    #[error("not enough memory: need {required}, have {available}")]
    InsufficientMemory {
        required: ByteSize,
        available: ByteSize,
    },

    #[error("allocation of {requested} bytes failed")]
    AllocationFailure { requested: usize },

    #[error("received {received} of {declared} declared bytes")]
    PartialTransfer { received: usize, declared: usize },
}

/// Flat classification of [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    BadStatus,
    InvalidSize,
    InsufficientMemory,
    AllocationFailure,
    PartialTransfer,
}

impl LoadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            // A connection that never produced a status is reported the same
            // way as a non-200 response.
            LoadError::Connect(_) | LoadError::BadStatus { .. } => {
                FailureKind::BadStatus
            }
            LoadError::InvalidSize { .. } => FailureKind::InvalidSize,
            LoadError::InsufficientMemory { .. } => {
                FailureKind::InsufficientMemory
            }
            LoadError::AllocationFailure { .. } => {
                FailureKind::AllocationFailure
            }
            LoadError::PartialTransfer { .. } => FailureKind::PartialTransfer,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
