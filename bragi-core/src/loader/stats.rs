use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStatsSnapshot {
    pub cache_hits: u64,
    pub transport_opens: u64,
    pub commits: u64,
    pub failures: u64,
    pub partial_transfers: u64,
    pub bytes_received: u64,
}

#[derive(Debug, Default)]
pub struct LoaderStats {
    cache_hits: AtomicU64,
    transport_opens: AtomicU64,
    commits: AtomicU64,
    failures: AtomicU64,
    partial_transfers: AtomicU64,
    bytes_received: AtomicU64,
}

impl LoaderStats {
    pub fn on_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_transport_open(&self) {
        self.transport_opens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(
            u64::try_from(bytes).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    pub fn on_partial_transfer(&self) {
        self.partial_transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoaderStatsSnapshot {
        LoaderStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            transport_opens: self.transport_opens.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            partial_transfers: self
                .partial_transfers
                .load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}
