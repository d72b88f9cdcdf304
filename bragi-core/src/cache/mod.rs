//! The single image slot.

pub mod slot;

pub use slot::{CacheSlot, ImageView};
