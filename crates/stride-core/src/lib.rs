//! Core types and traits for the stride vector-store harness.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the stores and the benchmark runner: the error
//! type, shape and stride arithmetic, zero-copy vector views, the
//! [`VectorStore`] capability trait, the injected probe traits, and the
//! [`MeasurementRecord`] the runner emits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod record;
pub mod shape;
pub mod traits;
pub mod view;

pub use error::StoreError;
pub use record::{MeasurementRecord, Operation, RecordSet, StoreKind};
pub use shape::{Shape, Strides, ELEMENT_SIZE};
pub use traits::{MemoryProbe, MonotonicClock, VectorStore};
pub use view::VectorView;
