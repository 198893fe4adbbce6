//! Stride: a harness that compares boxed, flat, and memory-mapped layouts
//! for large collections of fixed-size `f32` vectors.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! stride sub-crates. For most users, adding `stride` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use stride::prelude::*;
//!
//! // One contiguous allocation; views share it.
//! let store = FixedVectorStore::create(1000, 128, 0.5).unwrap();
//! assert_eq!(store.sum_range(0, 1000).unwrap(), 64000.0);
//!
//! let flat = store.flatten().unwrap();
//! assert_eq!(flat.buffer_address(), store.buffer_address());
//!
//! // Drive every store kind through the same timed steps.
//! let config = BenchConfig { sample_size: 100, ..BenchConfig::new(1000, 16) };
//! let mut runner = BenchmarkRunner::new(config).unwrap();
//! let records = runner.run(&FixedFactory).unwrap();
//! let ops: Vec<_> = records.iter().map(|r| r.operation).collect();
//! assert_eq!(ops, [Operation::Create, Operation::RandomAccess, Operation::RangeSum]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stride-core` | Errors, shapes, views, store and probe traits, records |
//! | [`store`] | `stride-store` | Fixed, boxed, and mapped store implementations |
//! | [`bench`] | `stride-bench` | Runner, factories, profiles, cycle stress harness |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`stride-core`).
///
/// Contains [`types::StoreError`], [`types::Shape`], [`types::VectorView`],
/// and the [`types::VectorStore`], [`types::MemoryProbe`] and
/// [`types::MonotonicClock`] traits.
pub use stride_core as types;

/// Store implementations (`stride-store`).
///
/// [`store::FixedVectorStore`] for one shared contiguous buffer,
/// [`store::BoxedVectorStore`] for the per-vector allocation baseline, and
/// [`store::MappedFileVectorStore`] for file-backed mappings.
pub use stride_store as store;

/// Benchmark runner and harnesses (`stride-bench`).
///
/// [`bench::BenchmarkRunner`] times stores built by a
/// [`bench::StoreFactory`]; [`bench::CycleStressHarness`] measures
/// allocation under a [`bench::ReclamationPolicy`].
pub use stride_bench as bench;

/// Common imports for typical stride usage.
///
/// ```rust
/// use stride::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use stride_core::{
        MeasurementRecord, MemoryProbe, MonotonicClock, Operation, Shape, StoreKind, VectorStore,
        VectorView,
    };

    // Errors
    pub use stride_core::StoreError;
    pub use stride_bench::{BenchError, ConfigError};

    // Stores
    pub use stride_store::{
        BoxedVectorStore, Fill, FixedVectorStore, MappedFileVectorStore, OpenMode,
    };

    // Runner and harness
    pub use stride_bench::{
        reference_profile, small_profile, AccessOrder, BenchConfig, BenchmarkRunner,
        BoxedFactory, CycleStressHarness, FixedFactory, MappedFactory, NodeKind,
        ReclamationPolicy, StoreFactory, StressOutcome,
    };
}
