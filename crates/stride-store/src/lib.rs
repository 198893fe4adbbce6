//! Contiguous, boxed, and memory-mapped vector stores.
//!
//! Three representations of the same data, all implementing
//! [`VectorStore`](stride_core::VectorStore) so the benchmark runner can
//! drive them identically. This crate is the only one in the workspace
//! that may contain `unsafe` code, confined to `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! FixedVectorStore (Shape view)
//! └── SharedBuffer  (Rc<RefCell<Vec<f32>>>, one allocation, shared by reshapes)
//!
//! BoxedVectorStore
//! └── IndexMap<usize, Vec<f32>>  (one allocation per vector)
//!
//! MappedFileVectorStore (Shape view)
//! └── Mapping: Mmap | MmapMut | Empty  (file pages, faulted in lazily)
//! ```
//!
//! # Layout
//!
//! Flat stores are row-major `f32`: row `i` starts at element `i * dim`.
//! The mapped file format is the same bytes with no header, so a buffer
//! written by one store can be mapped by another.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod boxed;
pub mod buffer;
pub mod fill;
pub mod fixed;
pub mod mapped;
mod raw;

pub use boxed::BoxedVectorStore;
pub use buffer::SharedBuffer;
pub use fill::{Fill, FillStream};
pub use fixed::FixedVectorStore;
pub use mapped::{MappedFileVectorStore, OpenMode};
