//! # Bragi Core
//!
//! Album-art loader for the Bragi display controller: a device with a small
//! heap, no swap, and room for exactly one cached image.
//!
//! ## Overview
//!
//! - **Single-slot cache**: [`cache::CacheSlot`] holds one image keyed by an
//!   opaque cache key; a repeated key is served without touching the network
//! - **Memory budgeting**: [`memory::MemoryGuard`] refuses downloads that
//!   would not leave `2x` headroom, and declared lengths above the cap are
//!   rejected before any allocation
//! - **Chunked streaming**: [`loader::StreamReader`] copies the body into a
//!   preallocated buffer one chunk at a time, yielding between chunks
//! - **Display glue**: [`text`] cleans dashes the font cannot draw, parses
//!   playlist options and derives album-art keys
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bragi_core::{loader::ImageLoader, transport::HttpTransport};
//!
//! async fn show_art(url: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ImageLoader::new(Arc::new(HttpTransport::new()?));
//!     if loader.load(url, "daft_punk_discovery").await {
//!         let image = loader.current_data().await;
//!         println!("{} bytes ready for the decoder", image.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod constants;
pub mod error;
pub mod loader;
pub mod memory;
pub mod text;
pub mod transport;
pub mod units;

pub use cache::{CacheSlot, ImageView};
pub use error::{FailureKind, LoadError, TransportError};
pub use loader::{FetchOutcome, ImageLoader, LoaderConfig, TruncationPolicy};
pub use units::ByteSize;
