//! Timed, store-agnostic operation sequences.
//!
//! [`BenchmarkRunner`] drives any [`StoreFactory`] through the same steps
//! and returns one [`MeasurementRecord`] per step. The clock and memory
//! probe are injected, so tests can substitute deterministic ones.
//!
//! # Steps
//!
//! | Method | Records |
//! |--------|---------|
//! | [`run`](BenchmarkRunner::run) | `Create`, `RandomAccess`, `RangeSum` |
//! | [`access_profile`](BenchmarkRunner::access_profile) | `ColdAccess`, `HotAccess` |
//! | [`traverse`](BenchmarkRunner::traverse) | `Traverse` |
//!
//! Memory is read before and after every step when a probe is installed.
//! Timings include only the operation itself: probe reads and traversal
//! order generation happen outside the timed region.

use std::hint::black_box;
use std::path::Path;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;
use stride_core::{
    MeasurementRecord, MemoryProbe, MonotonicClock, Operation, RecordSet, StoreError, StoreKind,
    VectorStore,
};

use crate::config::{BenchConfig, BenchError};
use crate::factory::{BoxedFactory, FixedFactory, MappedFactory, StoreFactory};
use crate::probe::SystemClock;

/// Order in which [`BenchmarkRunner::traverse`] visits vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOrder {
    /// The store's own key order.
    Sequential,
    /// A Fisher–Yates permutation of the keys drawn from a ChaCha8 stream.
    Shuffled {
        /// Stream seed. Equal seeds yield equal permutations.
        seed: u64,
    },
}

impl AccessOrder {
    /// The visiting order for a store of `len` vectors.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        self.arrange((0..len).collect())
    }

    /// `keys` in this order: untouched for `Sequential`, permuted in place
    /// for `Shuffled`.
    pub fn arrange(&self, mut keys: Vec<usize>) -> Vec<usize> {
        if let Self::Shuffled { seed } = *self {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for i in (1..keys.len()).rev() {
                let j = (rng.next_u64() % (i as u64 + 1)) as usize;
                keys.swap(i, j);
            }
        }
        keys
    }
}

/// Records and footprint of one store kind in a [`compare`](BenchmarkRunner::compare).
#[derive(Clone, Debug, PartialEq)]
pub struct StoreRun {
    /// Which store kind was driven.
    pub kind: StoreKind,
    /// `Create`, `RandomAccess`, `RangeSum`, in that order.
    pub records: RecordSet,
    /// The store's own footprint estimate after creation.
    pub footprint_bytes: usize,
}

/// Drives stores through timed operation sequences.
///
/// Generic over the clock so tests can use a stepping one; the probe is
/// optional and boxed because it is only read between steps.
pub struct BenchmarkRunner<C: MonotonicClock = SystemClock> {
    config: BenchConfig,
    clock: C,
    probe: Option<Box<dyn MemoryProbe>>,
}

impl BenchmarkRunner<SystemClock> {
    /// Runner on the system clock with no memory probe.
    pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: MonotonicClock> BenchmarkRunner<C> {
    /// Runner on the given clock with no memory probe.
    ///
    /// Fails with [`BenchError::Config`] if `config` does not validate.
    pub fn with_clock(config: BenchConfig, clock: C) -> Result<Self, BenchError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            probe: None,
        })
    }

    /// Install a memory probe, read before and after every step.
    pub fn with_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// The validated workload.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Whether a memory probe is installed.
    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    fn resident(&mut self) -> Option<u64> {
        self.probe.as_mut().and_then(|p| p.resident_bytes())
    }

    fn measure<T>(
        &mut self,
        operation: Operation,
        store_kind: StoreKind,
        step: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<(T, MeasurementRecord), StoreError> {
        let before = self.resident();
        let start = self.clock.now();
        let out = step()?;
        let elapsed = self.clock.since(start);
        let after = self.resident();

        let record = MeasurementRecord {
            operation,
            store_kind,
            elapsed_seconds: elapsed.as_secs_f64(),
            resident_memory_bytes: after,
            resident_before_bytes: before,
        };
        tracing::trace!(
            %operation,
            %store_kind,
            elapsed_seconds = record.elapsed_seconds,
            resident = ?after,
            "step measured"
        );
        Ok((out, record))
    }

    /// Create, random-access, range-sum: three records in step order.
    ///
    /// The access index and sample size come from the config, so every
    /// store kind sees the identical sequence.
    pub fn run<F: StoreFactory>(&mut self, factory: &F) -> Result<RecordSet, BenchError> {
        self.run_with_store(factory).map(|(_, records)| records)
    }

    /// As [`run`](Self::run), but also hands back the store.
    pub fn run_with_store<F: StoreFactory>(
        &mut self,
        factory: &F,
    ) -> Result<(F::Store, RecordSet), BenchError> {
        let kind = factory.kind();
        let config = self.config.clone();
        tracing::debug!(%kind, capacity = config.capacity, dim = config.dim, "run started");

        let (store, create) = self.measure(Operation::Create, kind, || factory.create(&config))?;

        let index = config.resolved_access_index();
        let (_, access) = self.measure(Operation::RandomAccess, kind, || {
            store.read(index).map(|v| {
                black_box(&*v);
            })
        })?;

        let n = config.resolved_sample_size();
        let (_, sum) = self.measure(Operation::RangeSum, kind, || {
            store.sum_range(0, n).map(black_box)
        })?;

        Ok((store, smallvec![create, access, sum]))
    }

    /// Two consecutive reads of the vector at `index`: `ColdAccess` then
    /// `HotAccess`.
    ///
    /// On a freshly opened mapped store the first read may block on a
    /// page fault; the second runs at resident-page speed.
    pub fn access_profile<S: VectorStore + ?Sized>(
        &mut self,
        store: &S,
        index: usize,
    ) -> Result<[MeasurementRecord; 2], BenchError> {
        let kind = store.kind();
        let read = || {
            store.read(index).map(|v| {
                black_box(&*v);
            })
        };
        let (_, cold) = self.measure(Operation::ColdAccess, kind, read)?;
        let (_, hot) = self.measure(Operation::HotAccess, kind, read)?;
        Ok([cold, hot])
    }

    /// Read and sum every vector of `store` in `order`.
    ///
    /// Visits the store's [`keys`](VectorStore::keys), so sparse keyed
    /// stores traverse exactly their entries. Returns the record and the
    /// total, which is the same for every order up to floating-point
    /// reassociation.
    pub fn traverse<S: VectorStore + ?Sized>(
        &mut self,
        store: &S,
        order: AccessOrder,
    ) -> Result<(f64, MeasurementRecord), BenchError> {
        let kind = store.kind();
        let indices = order.arrange(store.keys());
        tracing::debug!(%kind, ?order, vectors = indices.len(), "traversal started");
        let out = self.measure(Operation::Traverse, kind, || {
            let mut total = 0.0f64;
            for &i in &indices {
                let view = store.read(i)?;
                total += view.iter().map(|&x| f64::from(x)).sum::<f64>();
            }
            Ok(black_box(total))
        })?;
        Ok(out)
    }

    /// Run the three standard factories in turn, each store dropped before
    /// the next is built. The mapped store is backed by `mapped_path`.
    pub fn compare(&mut self, mapped_path: &Path) -> Result<Vec<StoreRun>, BenchError> {
        Ok(vec![
            self.run_kind(&FixedFactory)?,
            self.run_kind(&BoxedFactory)?,
            self.run_kind(&MappedFactory::new(mapped_path))?,
        ])
    }

    fn run_kind<F: StoreFactory>(&mut self, factory: &F) -> Result<StoreRun, BenchError> {
        let (store, records) = self.run_with_store(factory)?;
        Ok(StoreRun {
            kind: factory.kind(),
            records,
            footprint_bytes: store.footprint_bytes(),
        })
    }
}

impl<C: MonotonicClock + std::fmt::Debug> std::fmt::Debug for BenchmarkRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkRunner")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("probe", &self.probe.is_some())
            .finish()
    }
}
