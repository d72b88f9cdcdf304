//! Display-string glue around the loader: dash cleanup, playlist option
//! parsing and album-art key derivation.

pub mod art_key;
pub mod playlist;
pub mod unicode;

pub use art_key::art_cache_key;
pub use playlist::Playlists;
pub use unicode::clean_unicode;
