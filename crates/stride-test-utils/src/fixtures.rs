//! Ready-made stores for tests.

use std::path::Path;

use stride_core::StoreError;
use stride_store::{BoxedVectorStore, FixedVectorStore, MappedFileVectorStore, OpenMode};

/// Fixed store whose element `i` (in buffer order) equals `i as f32`.
///
/// Makes layout visible: row `r`, column `c` holds `r * dim + c`.
pub fn ramp_fixed(capacity: usize, dim: usize) -> FixedVectorStore {
    FixedVectorStore::from_fn(capacity, dim, |i| i as f32).expect("valid fixture shape")
}

/// Boxed store with keys `0..count`, each vector `[value; dim]`.
pub fn uniform_boxed(count: usize, dim: usize, value: f32) -> BoxedVectorStore {
    let mut store = BoxedVectorStore::with_capacity(count);
    let vector = vec![value; dim];
    for key in 0..count {
        store.insert(key, &vector);
    }
    store
}

/// Create a mapped file at `path`, write row `r` as `[r as f32; dim]`,
/// flush and close it. Returns nothing; reopen to inspect.
pub fn write_row_indexed_file(
    path: &Path,
    capacity: usize,
    dim: usize,
) -> Result<(), StoreError> {
    let mut store = MappedFileVectorStore::open(path, capacity, dim, OpenMode::CreateWrite)?;
    for row in 0..capacity {
        store.write(row, &vec![row as f32; dim])?;
    }
    store.flush()?;
    store.close();
    Ok(())
}
