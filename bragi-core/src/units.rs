use std::fmt;

/// A strongly-typed byte size.
///
/// This is intentionally base-2 (KiB, MiB) because that's how heap budgets
/// on the display controller are reported.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const ZERO: Self = Self(0);
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn from_usize(bytes: usize) -> Self {
        Self(u64::try_from(bytes).unwrap_or(u64::MAX))
    }

    pub const fn from_kib(kib: u64) -> Self {
        Self(kib.saturating_mul(1024))
    }

    pub const fn as_bytes(self) -> u64 {
        self.0
    }

    /// Multiply by a headroom factor without wrapping.
    pub const fn saturating_mul(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0 as f64;
        if bytes >= Self::MIB {
            write!(f, "{:.1} MiB", bytes / Self::MIB)
        } else if bytes >= Self::KIB {
            write!(f, "{:.1} KiB", bytes / Self::KIB)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}
