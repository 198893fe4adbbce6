//! Store construction for the runner.
//!
//! Creation is the one step whose inputs differ per store kind, so it sits
//! behind [`StoreFactory`] rather than on [`VectorStore`]. Every factory
//! builds a store holding `capacity` vectors of `dim` elements, all equal
//! to `fill_value`, so the runner's later steps see identical data.

use std::path::{Path, PathBuf};

use stride_core::{StoreError, StoreKind, VectorStore};
use stride_store::{BoxedVectorStore, FixedVectorStore, MappedFileVectorStore, OpenMode};

use crate::config::BenchConfig;

/// Builds a populated store from a [`BenchConfig`].
pub trait StoreFactory {
    /// The store type produced.
    type Store: VectorStore;

    /// Which kind of store this factory builds.
    fn kind(&self) -> StoreKind;

    /// Build and populate a store. This is the timed `Create` step.
    fn create(&self, config: &BenchConfig) -> Result<Self::Store, StoreError>;
}

/// Closure factory: `(kind, |config| build(config))`.
impl<S, F> StoreFactory for (StoreKind, F)
where
    S: VectorStore,
    F: Fn(&BenchConfig) -> Result<S, StoreError>,
{
    type Store = S;

    fn kind(&self) -> StoreKind {
        self.0
    }

    fn create(&self, config: &BenchConfig) -> Result<S, StoreError> {
        (self.1)(config)
    }
}

/// Builds a [`FixedVectorStore`]: one allocation, filled in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedFactory;

impl StoreFactory for FixedFactory {
    type Store = FixedVectorStore;

    fn kind(&self) -> StoreKind {
        StoreKind::Fixed
    }

    fn create(&self, config: &BenchConfig) -> Result<FixedVectorStore, StoreError> {
        FixedVectorStore::create(config.capacity, config.dim, config.fill_value)
    }
}

/// Builds a [`BoxedVectorStore`] one vector at a time under keys
/// `0..capacity`.
///
/// The index and every vector are reserved fallibly, so a capacity the
/// allocator cannot satisfy fails with [`StoreError::ResourceExhausted`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxedFactory;

impl StoreFactory for BoxedFactory {
    type Store = BoxedVectorStore;

    fn kind(&self) -> StoreKind {
        StoreKind::Boxed
    }

    fn create(&self, config: &BenchConfig) -> Result<BoxedVectorStore, StoreError> {
        if config.dim == 0 {
            return Err(StoreError::InvalidShape {
                capacity: config.capacity,
                dim: config.dim,
            });
        }
        let vector = vec![config.fill_value; config.dim];
        let mut store = BoxedVectorStore::try_with_capacity(config.capacity)?;
        for key in 0..config.capacity {
            store.try_insert(key, &vector)?;
        }
        Ok(store)
    }
}

/// How [`MappedFactory`] obtains its store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappedSource {
    /// Create or resize the file and write every vector through the
    /// mapping, then flush. A reused file never leaks stale contents.
    Populate,
    /// Map an existing file read-only and touch nothing. `Create` then
    /// times only the mapping, and no page is resident until first read.
    Existing,
}

/// Builds a [`MappedFileVectorStore`] over a file at a fixed path.
#[derive(Clone, Debug)]
pub struct MappedFactory {
    path: PathBuf,
    source: MappedSource,
}

impl MappedFactory {
    /// Factory that creates and populates the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: MappedSource::Populate,
        }
    }

    /// Factory that maps the already populated file at `path` read-only.
    ///
    /// Pair with [`prepare_sparse`](Self::prepare_sparse), or any earlier
    /// populating run over the same path and shape.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: MappedSource::Existing,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How stores are obtained.
    pub fn source(&self) -> MappedSource {
        self.source
    }

    /// Size the file for `config` and write `fill_value` into only its
    /// first and last vectors. Everything between stays a hole, so the
    /// file costs almost no disk and a later read-only map starts cold.
    pub fn prepare_sparse(&self, config: &BenchConfig) -> Result<(), StoreError> {
        let mut store = MappedFileVectorStore::open(
            &self.path,
            config.capacity,
            config.dim,
            OpenMode::CreateWrite,
        )?;
        if config.capacity > 0 {
            let vector = vec![config.fill_value; config.dim];
            store.write(0, &vector)?;
            store.write(config.capacity - 1, &vector)?;
        }
        store.flush()?;
        store.close();
        tracing::debug!(path = %self.path.display(), capacity = config.capacity, "prepared sparse file");
        Ok(())
    }
}

impl StoreFactory for MappedFactory {
    type Store = MappedFileVectorStore;

    fn kind(&self) -> StoreKind {
        StoreKind::Mapped
    }

    fn create(&self, config: &BenchConfig) -> Result<MappedFileVectorStore, StoreError> {
        match self.source {
            MappedSource::Existing => MappedFileVectorStore::open(
                &self.path,
                config.capacity,
                config.dim,
                OpenMode::ReadOnly,
            ),
            MappedSource::Populate => {
                let mut store = MappedFileVectorStore::open(
                    &self.path,
                    config.capacity,
                    config.dim,
                    OpenMode::CreateWrite,
                )?;
                let vector = vec![config.fill_value; config.dim];
                for index in 0..config.capacity {
                    store.write(index, &vector)?;
                }
                store.flush()?;
                Ok(store)
            }
        }
    }
}
