use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::limits;

/// What to do when the body ends before the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Commit the bytes that arrived and report the shortfall.
    #[default]
    Accept,
    /// Treat a short body as a failed load.
    Reject,
}

/// Tuning for [`ImageLoader`](super::ImageLoader).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Upper bound on the declared content length, checked before any
    /// allocation.
    pub max_image_bytes: usize,
    /// Free memory must be at least `declared * headroom_factor`.
    pub headroom_factor: u64,
    /// Applied to the request and to every chunk wait.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    pub truncation: TruncationPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: limits::MAX_IMAGE_BYTES,
            headroom_factor: limits::HEADROOM_FACTOR,
            timeout: limits::FETCH_TIMEOUT,
            truncation: TruncationPolicy::Accept,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
