//! File-backed vector storage via memory mapping.
//!
//! [`MappedFileVectorStore`] gives a file the same `capacity x dim`
//! row-major layout as a [`FixedVectorStore`](crate::FixedVectorStore).
//! Opening only sizes the file and establishes the mapping, so it costs
//! the same for ten vectors or ten million. Pages are faulted in on first
//! touch.
//!
//! # Blocking contract
//!
//! [`read`](MappedFileVectorStore::read) and
//! [`sum_range`](MappedFileVectorStore::sum_range) may block the calling
//! thread while the OS pages data in from storage. The first touch of a
//! page is slow and non-deterministic; subsequent touches run at RAM
//! speed. [`flush`](MappedFileVectorStore::flush) blocks until the
//! kernel reports every dirty page written. Neither can be cancelled.
//!
//! # File format
//!
//! Exactly `capacity * dim * 4` bytes of native-endian `f32`, row-major,
//! no header.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use stride_core::{Shape, StoreError, StoreKind, VectorStore, VectorView};

use crate::raw;

/// How a backing file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file if needed and size it to exactly the shape's byte
    /// length (extending with zeros or truncating). Writable; durable only
    /// after [`flush`](MappedFileVectorStore::flush).
    CreateWrite,
    /// Map an existing file that is at least the shape's byte length.
    /// Immutable.
    ReadOnly,
}

enum Mapping {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
    /// Zero-byte shapes are never mapped.
    Empty,
}

impl Mapping {
    fn elements(&self) -> &[f32] {
        match self {
            Self::ReadOnly(m) => raw::as_elements(m),
            Self::ReadWrite(m) => raw::as_elements(m),
            Self::Empty => &[],
        }
    }
}

/// A fixed-shape vector store whose buffer is a memory-mapped file.
///
/// The mapping is released by [`close`](MappedFileVectorStore::close) or
/// on drop. After `close`, every data operation fails with
/// [`StoreError::UseAfterClose`].
pub struct MappedFileVectorStore {
    path: PathBuf,
    shape: Shape,
    mode: OpenMode,
    /// `None` once closed.
    mapping: Option<Mapping>,
}

impl MappedFileVectorStore {
    /// Open `path` as a `capacity x dim` store.
    ///
    /// Neither mode reads file contents; cost is independent of
    /// `capacity`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidShape`] for `dim == 0` or overflow.
    /// - [`StoreError::FileTooSmall`] in `ReadOnly` mode when the file is
    ///   shorter than `capacity * dim * 4` bytes.
    /// - [`StoreError::ResourceExhausted`] when the filesystem cannot hold
    ///   the file.
    /// - [`StoreError::Io`] for any other OS failure.
    pub fn open(
        path: impl AsRef<Path>,
        capacity: usize,
        dim: usize,
        mode: OpenMode,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let shape = Shape::new(capacity, dim)?;
        let required = shape.byte_len() as u64;

        let mapping = match mode {
            OpenMode::CreateWrite => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .map_err(|e| StoreError::from_io("open", &e, required))?;
                file.set_len(required)
                    .map_err(|e| StoreError::from_io("set_len", &e, required))?;
                if required == 0 {
                    Mapping::Empty
                } else {
                    let map = raw::map_read_write(&file, shape.byte_len())
                        .map_err(|e| StoreError::from_io("map", &e, required))?;
                    Mapping::ReadWrite(map)
                }
            }
            OpenMode::ReadOnly => {
                let file =
                    File::open(&path).map_err(|e| StoreError::from_io("open", &e, required))?;
                let actual = file
                    .metadata()
                    .map_err(|e| StoreError::from_io("metadata", &e, required))?
                    .len();
                if actual < required {
                    return Err(StoreError::FileTooSmall { required, actual });
                }
                if required == 0 {
                    Mapping::Empty
                } else {
                    let map = raw::map_read_only(&file, shape.byte_len())
                        .map_err(|e| StoreError::from_io("map", &e, required))?;
                    Mapping::ReadOnly(map)
                }
            }
        };

        tracing::debug!(path = %path.display(), %shape, ?mode, bytes = required, "mapped backing file");
        Ok(Self {
            path,
            shape,
            mode,
            mapping: Some(mapping),
        })
    }

    fn mapping(&self) -> Result<&Mapping, StoreError> {
        self.mapping.as_ref().ok_or(StoreError::UseAfterClose)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the file was opened in.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Logical shape of the store.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Whether the mapping is still established.
    pub fn is_open(&self) -> bool {
        self.mapping.is_some()
    }

    /// Zero-copy view of vector `index` inside the mapping.
    ///
    /// May block on a page fault the first time the page is touched.
    pub fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError> {
        let mapping = self.mapping()?;
        let offset = self.shape.row_offset(index)?;
        let row = &mapping.elements()[offset..offset + self.shape.dim()];
        Ok(VectorView::borrowed(row))
    }

    /// Copy `vector` into row `index` of the mapping.
    ///
    /// Not durable until [`flush`](Self::flush) returns.
    pub fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError> {
        let shape = self.shape;
        let mode = self.mode;
        let map = match self.mapping.as_mut() {
            None => return Err(StoreError::UseAfterClose),
            Some(Mapping::ReadOnly(_)) => return Err(StoreError::ReadOnlyViolation),
            Some(Mapping::Empty) if mode == OpenMode::ReadOnly => {
                return Err(StoreError::ReadOnlyViolation)
            }
            Some(Mapping::Empty) => None,
            Some(Mapping::ReadWrite(map)) => Some(map),
        };
        shape.check_dim(vector)?;
        let offset = shape.row_offset(index)?;
        // An empty mapping has capacity 0, so `row_offset` has already failed.
        if let Some(map) = map {
            raw::as_elements_mut(map)[offset..offset + vector.len()].copy_from_slice(vector);
        }
        Ok(())
    }

    /// Sum every element of vectors `[start, end)` in file order.
    pub fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        let mapping = self.mapping()?;
        let span = self.shape.row_span(start, end)?;
        Ok(mapping.elements()[span]
            .iter()
            .map(|&v| f64::from(v))
            .sum())
    }

    /// Block until every prior write has reached the backing file.
    ///
    /// A no-op for read-only stores.
    pub fn flush(&self) -> Result<(), StoreError> {
        match self.mapping()? {
            Mapping::ReadWrite(map) => {
                map.flush()
                    .map_err(|e| StoreError::from_io("flush", &e, self.shape.byte_len() as u64))?;
                tracing::debug!(path = %self.path.display(), "flushed mapping");
                Ok(())
            }
            Mapping::ReadOnly(_) | Mapping::Empty => Ok(()),
        }
    }

    /// Release the mapping. Idempotent.
    ///
    /// Unflushed writes on a writable mapping are still handed to the OS
    /// page cache but are not guaranteed durable; call
    /// [`flush`](Self::flush) first.
    pub fn close(&mut self) {
        if self.mapping.take().is_some() {
            tracing::debug!(path = %self.path.display(), "unmapped backing file");
        }
    }

    /// Bytes mapped (zero after close).
    pub fn footprint_bytes(&self) -> usize {
        if self.is_open() {
            self.shape.byte_len()
        } else {
            0
        }
    }
}

impl VectorStore for MappedFileVectorStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Mapped
    }

    fn len(&self) -> usize {
        self.shape.capacity()
    }

    fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError> {
        MappedFileVectorStore::read(self, index)
    }

    fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError> {
        MappedFileVectorStore::write(self, index, vector)
    }

    fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        MappedFileVectorStore::sum_range(self, start, end)
    }

    fn footprint_bytes(&self) -> usize {
        MappedFileVectorStore::footprint_bytes(self)
    }
}

impl std::fmt::Debug for MappedFileVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFileVectorStore")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
