/// Album names the media player reports when it has none.
const PLACEHOLDER_ALBUMS: &[&str] = &["", "unknown", "none", "null"];

/// Stable album-art cache key for a track.
///
/// Tracks on the same album share art, so the key is `artist_album`; when
/// the album is missing the title stands in. The result is lowercased and
/// every non-alphanumeric character becomes `_`.
pub fn art_cache_key(artist: &str, album: Option<&str>, title: &str) -> String {
    let album = album.filter(|album| {
        let lowered = album.to_lowercase();
        !PLACEHOLDER_ALBUMS.contains(&lowered.as_str())
    });

    let raw = match album {
        Some(album) => format!("{artist}_{album}"),
        None => format!("{artist}_{title}"),
    };

    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
