//! Free-memory probing and the allocation headroom check.

use std::{fmt, sync::Arc};

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::{constants::limits, units::ByteSize};

/// Source of the "how much memory is free right now" figure.
pub trait MemoryProbe: Send + Sync {
    fn available(&self) -> ByteSize;
}

/// Reports the host's available memory via `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemoryProbe;

impl MemoryProbe for SystemMemoryProbe {
    fn available(&self) -> ByteSize {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        ByteSize::from_bytes(system.available_memory())
    }
}

/// A fixed free-memory figure, used to emulate a device heap.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub ByteSize);

impl MemoryProbe for FixedMemoryProbe {
    fn available(&self) -> ByteSize {
        self.0
    }
}

/// The numbers behind a single headroom decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAssessment {
    pub available: ByteSize,
    pub required: ByteSize,
}

impl MemoryAssessment {
    pub fn is_safe(&self) -> bool {
        self.available >= self.required
    }
}

/// Decides whether an allocation leaves enough headroom for the transport
/// and fragmentation while the copy is in flight.
#[derive(Clone)]
pub struct MemoryGuard {
    probe: Arc<dyn MemoryProbe>,
    headroom_factor: u64,
}

impl fmt::Debug for MemoryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryGuard")
            .field("headroom_factor", &self.headroom_factor)
            .finish_non_exhaustive()
    }
}

impl MemoryGuard {
    pub fn new(probe: Arc<dyn MemoryProbe>, headroom_factor: u64) -> Self {
        Self {
            probe,
            headroom_factor,
        }
    }

    pub fn with_default_headroom(probe: Arc<dyn MemoryProbe>) -> Self {
        Self::new(probe, limits::HEADROOM_FACTOR)
    }

    pub fn headroom_factor(&self) -> u64 {
        self.headroom_factor
    }

    pub fn assess(&self, requested: ByteSize) -> MemoryAssessment {
        MemoryAssessment {
            available: self.probe.available(),
            required: requested.saturating_mul(self.headroom_factor),
        }
    }

    pub fn can_allocate(&self, requested: ByteSize) -> bool {
        self.assess(requested).is_safe()
    }
}
