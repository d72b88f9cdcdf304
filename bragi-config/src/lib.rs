//! Configuration loading for the Bragi album-art loader.
//!
//! Resolves a [`LoaderConfig`](bragi_core::LoaderConfig) from a config file,
//! inline JSON or per-field environment overrides, then validates it so the
//! device is never started with limits that cannot work.

pub mod loader;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, LoaderConfigSource, error::ConfigLoadError,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
