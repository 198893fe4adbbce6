//! Capability traits: the store interface and the injected probes.

use std::time::Duration;

use crate::error::StoreError;
use crate::record::StoreKind;
use crate::view::VectorView;

/// The capability set every benchmarked store exposes.
///
/// Creation is not part of the trait: each kind needs different inputs
/// (a fill value, a file path), so construction goes through a factory
/// and the trait only covers what happens to a live store. Indices are
/// row indices for flat stores and keys for the boxed store.
pub trait VectorStore {
    /// Which representation this is.
    fn kind(&self) -> StoreKind;

    /// Number of vectors currently held.
    fn len(&self) -> usize;

    /// Whether the store holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every valid index, in storage order.
    ///
    /// Row indices `0..len` for flat stores; keyed stores override this
    /// with their actual keys.
    fn keys(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }

    /// Zero-copy view of the vector at `index`.
    fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError>;

    /// Overwrite (or insert, for keyed stores) the vector at `index`.
    fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError>;

    /// Sum every element of the vectors in `[start, end)`.
    fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError>;

    /// Bytes of memory attributable to the stored vectors.
    ///
    /// Exact for flat stores; an estimate including per-entry overhead for
    /// keyed stores.
    fn footprint_bytes(&self) -> usize;
}

/// Source of "resident memory of the current process".
///
/// Returns `None` when the figure is unavailable on this platform; the
/// runner then omits memory from its records.
pub trait MemoryProbe {
    /// Current resident set size in bytes.
    fn resident_bytes(&mut self) -> Option<u64>;
}

/// Monotonic time source with sub-millisecond resolution.
pub trait MonotonicClock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Elapsed time since an earlier [`now`](MonotonicClock::now) reading.
    fn since(&self, earlier: Duration) -> Duration {
        self.now().saturating_sub(earlier)
    }
}

impl<P: MemoryProbe + ?Sized> MemoryProbe for Box<P> {
    fn resident_bytes(&mut self) -> Option<u64> {
        (**self).resident_bytes()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}
