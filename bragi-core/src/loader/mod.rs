//! Single-slot image loader.
//!
//! [`ImageLoader::fetch`] runs the full load sequence: cache check,
//! unconditional release, request, declared-length validation, headroom
//! check, allocation, chunked copy and commit. Each step is a hard gate and
//! every failure leaves the slot empty; a failed refresh never leaves a
//! stale image behind.

use std::{fmt, sync::Arc};

use tokio::sync::{Mutex, RwLock};

use crate::{
    cache::{CacheSlot, ImageView},
    error::{LoadError, Result},
    memory::{MemoryGuard, MemoryProbe, SystemMemoryProbe},
    transport::{ByteStream, Transport},
    units::ByteSize,
};

pub mod alloc;
pub mod config;
pub mod stats;
pub mod stream;

pub use alloc::{BufferAllocator, HeapAllocator};
pub use config::{LoaderConfig, TruncationPolicy};
pub use stats::{LoaderStats, LoaderStatsSnapshot};
pub use stream::{DrainStep, StreamReader};

/// How a successful load was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The slot already held this key; nothing was fetched.
    CacheHit,
    /// A new image was published.
    Committed { bytes: usize, declared: usize },
}

impl FetchOutcome {
    /// True when fewer bytes arrived than the response declared.
    pub fn is_partial(&self) -> bool {
        matches!(self, FetchOutcome::Committed { bytes, declared } if bytes < declared)
    }
}

/// Loads images into a single owned [`CacheSlot`].
///
/// Whole load sequences are serialised by an internal gate, so a shared
/// `Arc<ImageLoader>` is safe to call from several tasks. Readers see either
/// the previous image (cache hit) or an empty slot until the commit.
pub struct ImageLoader {
    transport: Arc<dyn Transport>,
    memory: MemoryGuard,
    allocator: Arc<dyn BufferAllocator>,
    config: LoaderConfig,
    slot: RwLock<CacheSlot>,
    load_gate: Mutex<()>,
    stats: LoaderStats,
}

impl fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoader")
            .field("memory", &self.memory)
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Loader with the host memory probe, heap allocation and default
    /// limits.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<dyn Transport>) -> ImageLoaderBuilder {
        ImageLoaderBuilder {
            transport,
            probe: None,
            allocator: None,
            config: LoaderConfig::default(),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Boolean surface over [`fetch`](Self::fetch): cache hits and commits
    /// both succeed.
    pub async fn load(&self, url: &str, key: &str) -> bool {
        self.fetch(url, key).await.is_ok()
    }

    pub async fn fetch(&self, url: &str, key: &str) -> Result<FetchOutcome> {
        let _gate = self.load_gate.lock().await;

        {
            let mut slot = self.slot.write().await;
            if slot.matches(key) {
                self.stats.on_cache_hit();
                tracing::debug!(key, "image already loaded");
                return Ok(FetchOutcome::CacheHit);
            }
            slot.clear();
        }

        tracing::info!(url, key, "loading image");

        match self.fetch_uncached(url, key).await {
            Ok(outcome) => {
                self.stats.on_commit();
                Ok(outcome)
            }
            Err(err) => {
                self.stats.on_failure();
                tracing::warn!(url, key, kind = ?err.kind(), error = %err, "image load failed");
                Err(err)
            }
        }
    }

    /// Drop the cached image, waiting for any in-flight load to finish.
    pub async fn release(&self) {
        let _gate = self.load_gate.lock().await;
        self.slot.write().await.clear();
    }

    /// Read access to the committed image; empty while a load is between
    /// release and commit.
    pub async fn current_data(&self) -> ImageView<'_> {
        ImageView::new(self.slot.read().await)
    }

    /// Like [`current_data`](Self::current_data) but returns `None` instead
    /// of waiting for a commit or release in progress.
    pub fn try_current_data(&self) -> Option<ImageView<'_>> {
        self.slot.try_read().ok().map(ImageView::new)
    }

    pub fn stats(&self) -> LoaderStatsSnapshot {
        self.stats.snapshot()
    }

    async fn fetch_uncached(&self, url: &str, key: &str) -> Result<FetchOutcome> {
        self.stats.on_transport_open();
        let mut stream = self
            .transport
            .open(url, self.config.timeout)
            .await
            .map_err(LoadError::Connect)?;

        let result = self.receive(stream.as_mut(), key).await;
        stream.close();
        result
    }

    async fn receive(
        &self,
        stream: &mut dyn ByteStream,
        key: &str,
    ) -> Result<FetchOutcome> {
        let status = stream.status_code();
        if status != crate::constants::limits::HTTP_OK {
            return Err(LoadError::BadStatus { status });
        }

        let declared = self.validate_length(stream.declared_length())?;

        let assessment = self.memory.assess(ByteSize::from_usize(declared));
        tracing::info!(
            declared,
            available = %assessment.available,
            "image size"
        );
        if !assessment.is_safe() {
            return Err(LoadError::InsufficientMemory {
                required: assessment.required,
                available: assessment.available,
            });
        }

        let mut buffer = self
            .allocator
            .allocate(declared)
            .filter(|buffer| buffer.len() == declared)
            .ok_or(LoadError::AllocationFailure {
                requested: declared,
            })?;

        let received = StreamReader::drain(stream, &mut buffer, declared).await;
        self.stats.on_received(received);

        if received != declared {
            self.stats.on_partial_transfer();
            tracing::warn!(received, declared, "downloaded fewer bytes than declared");
            if self.config.truncation == TruncationPolicy::Reject {
                return Err(LoadError::PartialTransfer { received, declared });
            }
            buffer.truncate(received);
        }

        self.slot.write().await.commit(key, buffer);
        tracing::info!(
            key,
            bytes = received,
            available = %self.memory.assess(ByteSize::ZERO).available,
            "image loaded"
        );

        Ok(FetchOutcome::Committed {
            bytes: received,
            declared,
        })
    }

    fn validate_length(&self, declared: Option<u64>) -> Result<usize> {
        let max = self.config.max_image_bytes;
        declared
            .and_then(|len| usize::try_from(len).ok())
            .filter(|&len| len > 0 && len <= max)
            .ok_or(LoadError::InvalidSize { declared, max })
    }
}

/// Builder for [`ImageLoader`].
pub struct ImageLoaderBuilder {
    transport: Arc<dyn Transport>,
    probe: Option<Arc<dyn MemoryProbe>>,
    allocator: Option<Arc<dyn BufferAllocator>>,
    config: LoaderConfig,
}

impl fmt::Debug for ImageLoaderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoaderBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImageLoaderBuilder {
    pub fn memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn allocator(mut self, allocator: Arc<dyn BufferAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ImageLoader {
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(SystemMemoryProbe));
        let allocator = self
            .allocator
            .unwrap_or_else(|| Arc::new(HeapAllocator));

        ImageLoader {
            transport: self.transport,
            memory: MemoryGuard::new(probe, self.config.headroom_factor),
            allocator,
            config: self.config,
            slot: RwLock::new(CacheSlot::new()),
            load_gate: Mutex::new(()),
            stats: LoaderStats::default(),
        }
    }
}
