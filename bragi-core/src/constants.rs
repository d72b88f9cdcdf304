//! Loader limits.
//!
//! These are the defaults behind [`LoaderConfig`](crate::loader::LoaderConfig).
//! Deployments can override them through `bragi-config`, but the display
//! firmware is sized around these numbers.

pub mod limits {
    use std::time::Duration;

    /// Largest declared content length accepted before any allocation.
    pub const MAX_IMAGE_BYTES: usize = 50_000;

    /// Free memory must be at least `requested * HEADROOM_FACTOR`.
    pub const HEADROOM_FACTOR: u64 = 2;

    /// Connect timeout and per-chunk read timeout.
    pub const FETCH_TIMEOUT: Duration = Duration::from_millis(5_000);

    /// The only response status treated as success.
    pub const HTTP_OK: u16 = 200;
}
