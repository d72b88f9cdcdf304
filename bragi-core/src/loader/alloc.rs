/// Fallible buffer allocation.
///
/// Checking free memory first does not guarantee the allocation succeeds
/// (fragmentation, or another task allocating in between), so the loader
/// goes through this seam and handles `None` as its own failure.
pub trait BufferAllocator: Send + Sync {
    /// A zero-filled buffer of exactly `len` bytes, or `None`.
    fn allocate(&self, len: usize) -> Option<Vec<u8>>;
}

/// Allocates on the global heap without aborting on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        let mut buffer = Vec::new();
        if let Err(err) = buffer.try_reserve_exact(len) {
            tracing::error!(len, error = %err, "image buffer reservation failed");
            return None;
        }
        buffer.resize(len, 0);
        Some(buffer)
    }
}
