//! Benchmark runner, store factories, and profiles for the stride vector
//! stores.
//!
//! - [`BenchmarkRunner`]: times create / random-access / range-sum (plus
//!   cold-vs-hot access and traversal order) uniformly across store kinds
//! - [`StoreFactory`]: how each kind is built from a [`BenchConfig`]
//! - [`CycleStressHarness`]: allocation throughput with and without
//!   self-referential links under a [`ReclamationPolicy`]
//! - [`reference_profile`] / [`small_profile`]: standard workloads
//!
//! Library code never installs a `tracing` subscriber; the `showdown`
//! example does.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod factory;
pub mod probe;
pub mod runner;
pub mod stress;

pub use config::{reference_profile, small_profile, BenchConfig, BenchError, ConfigError};
pub use factory::{BoxedFactory, FixedFactory, MappedFactory, MappedSource, StoreFactory};
pub use probe::{ProcessMemoryProbe, SystemClock};
pub use runner::{AccessOrder, BenchmarkRunner, StoreRun};
pub use stress::{
    reference_scenarios, stress, CycleStressHarness, NodeHandle, NodeKind, Reclaimer,
    ReclamationPolicy, StressNode, StressOutcome, StressScenario, REFERENCE_NODE_COUNT,
};
