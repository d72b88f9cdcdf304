use std::{fmt, ops::Deref};

use tokio::sync::RwLockReadGuard;

/// Holds at most one committed image.
///
/// `buffer` is `Some` iff the image has at least one byte. Clearing always
/// resets key and buffer together, and a commit releases the previous buffer
/// before publishing the new one.
#[derive(Default)]
pub struct CacheSlot {
    key: String,
    buffer: Option<Box<[u8]>>,
    generation: u64,
}

impl fmt::Debug for CacheSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSlot")
            .field("key", &self.key)
            .field("size", &self.size())
            .field("generation", &self.generation)
            .finish()
    }
}

impl CacheSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `key` is non-empty and byte-equal to the stored key.
    ///
    /// The empty key never matches, so requests without an identity always
    /// fetch.
    pub fn matches(&self, key: &str) -> bool {
        !key.is_empty() && self.key == key
    }

    /// Release the buffer and forget the key. Idempotent.
    pub fn clear(&mut self) {
        if self.buffer.is_none() && self.key.is_empty() {
            return;
        }

        let released = self.size();
        self.buffer = None;
        self.key.clear();
        self.generation += 1;
        tracing::debug!(released, "image slot cleared");
    }

    /// Publish `data` under `key`, replacing whatever was held.
    ///
    /// A zero-length image records the key but holds no buffer.
    pub fn commit(&mut self, key: &str, data: Vec<u8>) {
        if self.buffer.is_some() {
            tracing::debug!(
                previous = %self.key,
                "committing over an uncleared image slot"
            );
            self.buffer = None;
        }

        self.key.clear();
        self.key.push_str(key);
        self.buffer = if data.is_empty() {
            None
        } else {
            Some(data.into_boxed_slice())
        };
        self.generation += 1;
    }

    /// The committed bytes, or an empty slice.
    pub fn snapshot(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buf| buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Bumped on every commit and on every clear that released something.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Read access to the committed image.
///
/// The view holds a read lock on the slot, so the next commit or release
/// waits until it is dropped. Do not hold one across an `await` on
/// [`ImageLoader::load`](crate::loader::ImageLoader::load) from the same
/// task; copy the bytes out instead.
pub struct ImageView<'a> {
    slot: RwLockReadGuard<'a, CacheSlot>,
}

impl<'a> ImageView<'a> {
    pub(crate) fn new(slot: RwLockReadGuard<'a, CacheSlot>) -> Self {
        Self { slot }
    }

    pub fn key(&self) -> &str {
        self.slot.key()
    }

    pub fn generation(&self) -> u64 {
        self.slot.generation()
    }
}

impl Deref for ImageView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.slot.snapshot()
    }
}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("key", &self.key())
            .field("size", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::CacheSlot;

    #[test]
    fn empty_key_never_matches() {
        let mut slot = CacheSlot::new();
        assert!(!slot.matches(""));

        slot.commit("", vec![1, 2, 3]);
        assert_eq!(slot.size(), 3);
        assert!(!slot.matches(""));
    }

    #[test]
    fn matching_is_byte_exact() {
        let mut slot = CacheSlot::new();
        slot.commit("track1", vec![0xff; 4]);

        assert!(slot.matches("track1"));
        assert!(!slot.matches("Track1"));
        assert!(!slot.matches("track1 "));
    }

    #[test]
    fn clear_empties_key_and_buffer_together() {
        let mut slot = CacheSlot::new();
        slot.commit("track1", vec![7; 10]);
        slot.clear();

        assert!(slot.is_empty());
        assert_eq!(slot.size(), 0);
        assert_eq!(slot.key(), "");
        assert!(slot.snapshot().is_empty());
        assert!(!slot.matches("track1"));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut slot = CacheSlot::new();
        slot.commit("a", vec![1]);
        slot.clear();
        let generation = slot.generation();

        slot.clear();
        assert_eq!(slot.generation(), generation);
    }

    #[test]
    fn commit_replaces_previous_image() {
        let mut slot = CacheSlot::new();
        slot.commit("a", vec![1, 1]);
        let first = slot.generation();

        slot.commit("b", vec![2, 2, 2]);
        assert_eq!(slot.key(), "b");
        assert_eq!(slot.snapshot(), &[2, 2, 2]);
        assert!(slot.generation() > first);
    }

    #[test]
    fn zero_length_commit_holds_no_buffer() {
        let mut slot = CacheSlot::new();
        slot.commit("silent", Vec::new());

        assert!(slot.is_empty());
        assert_eq!(slot.size(), 0);
        assert!(slot.matches("silent"));
    }
}
