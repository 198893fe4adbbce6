//! Flat, contiguous vector storage with zero-copy reshaping.
//!
//! [`FixedVectorStore`] keeps `capacity * dim` elements in one
//! [`SharedBuffer`]. Rows are addressed by stride arithmetic, reads return
//! views into the buffer, and [`reshape`](FixedVectorStore::reshape)
//! reinterprets the same allocation under a different `capacity x dim`
//! split without moving a byte.

use stride_core::{Shape, StoreError, StoreKind, Strides, VectorStore, VectorView};

use crate::buffer::SharedBuffer;
use crate::fill::Fill;

/// A `capacity x dim` matrix of `f32` in one contiguous buffer.
///
/// Cloning a store (or reshaping it) produces another view of the same
/// buffer; the allocation lives until the last view is dropped.
#[derive(Clone)]
pub struct FixedVectorStore {
    buffer: SharedBuffer,
    shape: Shape,
    /// Element index of row 0 within the buffer.
    offset: usize,
}

impl FixedVectorStore {
    /// Allocate a store with every element set to `fill_value`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidShape`] if `dim == 0` or the element count
    /// overflows; [`StoreError::ResourceExhausted`] if the allocation fails.
    pub fn create(capacity: usize, dim: usize, fill_value: f32) -> Result<Self, StoreError> {
        Self::with_fill(capacity, dim, Fill::Value(fill_value))
    }

    /// Allocate a store initialised according to `fill`.
    pub fn with_fill(capacity: usize, dim: usize, fill: Fill) -> Result<Self, StoreError> {
        let shape = Shape::new(capacity, dim)?;
        let buffer = SharedBuffer::new(shape.element_count(), fill)?;
        tracing::debug!(%shape, ?fill, bytes = shape.byte_len(), "allocated fixed store");
        Ok(Self {
            buffer,
            shape,
            offset: 0,
        })
    }

    /// Allocate a store with seeded uniform values in `[0, 1)`.
    pub fn seeded(capacity: usize, dim: usize, seed: u64) -> Result<Self, StoreError> {
        Self::with_fill(capacity, dim, Fill::Seeded(seed))
    }

    /// Allocate a store whose element at linear position `i` is `f(i)`.
    pub fn from_fn(
        capacity: usize,
        dim: usize,
        f: impl FnMut(usize) -> f32,
    ) -> Result<Self, StoreError> {
        let shape = Shape::new(capacity, dim)?;
        let buffer = SharedBuffer::from_fn(shape.element_count(), f)?;
        Ok(Self {
            buffer,
            shape,
            offset: 0,
        })
    }

    /// The current logical shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of vectors.
    pub fn capacity(&self) -> usize {
        self.shape.capacity()
    }

    /// Elements per vector.
    pub fn dim(&self) -> usize {
        self.shape.dim()
    }

    /// Element strides of the current shape.
    pub fn strides(&self) -> Strides {
        self.shape.strides()
    }

    /// Byte strides of the current shape, `(row, element)`.
    pub fn byte_strides(&self) -> (usize, usize) {
        self.shape.byte_strides()
    }

    /// Zero-copy view of vector `index`.
    pub fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError> {
        let offset = self.offset + self.shape.row_offset(index)?;
        let view = self.buffer.slice(offset..offset + self.shape.dim())?;
        Ok(VectorView::shared(view))
    }

    /// Copy `vector` into row `index`.
    ///
    /// Validation happens before any byte is written, so a failed write
    /// leaves the buffer untouched.
    pub fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError> {
        self.shape.check_dim(vector)?;
        let offset = self.offset + self.shape.row_offset(index)?;
        self.buffer.write(offset, vector)
    }

    /// A new view of the same buffer as `new_capacity x new_dim`.
    ///
    /// Never copies. Both views stay valid and observe each other's
    /// writes.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShapeMismatch`] if the element count would change,
    /// [`StoreError::InvalidShape`] if `new_dim == 0`.
    pub fn reshape(&self, new_capacity: usize, new_dim: usize) -> Result<Self, StoreError> {
        let shape = self.shape.reshape(new_capacity, new_dim)?;
        tracing::debug!(from = %self.shape, to = %shape, "reshaped fixed store");
        Ok(Self {
            buffer: self.buffer.clone(),
            shape,
            offset: self.offset,
        })
    }

    /// A view of vectors `[start, end)` over the same buffer.
    ///
    /// Never copies. The view's row 0 is this store's row `start`, so its
    /// [`offset`](Self::offset) advances by `start * dim` elements.
    ///
    /// # Errors
    ///
    /// [`StoreError::IndexOutOfRange`] if `end > capacity`.
    pub fn rows(&self, start: usize, end: usize) -> Result<Self, StoreError> {
        let span = self.shape.row_span(start, end)?;
        let shape = Shape::new(end - start, self.shape.dim())?;
        Ok(Self {
            buffer: self.buffer.clone(),
            shape,
            offset: self.offset + span.start,
        })
    }

    /// View the whole buffer as a single vector (`1 x capacity*dim`).
    ///
    /// An empty store cannot be flattened (a zero-length row is not a
    /// valid shape) and returns [`StoreError::InvalidShape`].
    pub fn flatten(&self) -> Result<Self, StoreError> {
        self.reshape(1, self.shape.element_count())
    }

    /// Sum every element of vectors `[start, end)`.
    ///
    /// Walks the buffer front to back; with row-major layout buffer order
    /// and index order coincide.
    pub fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        let span = self.shape.row_span(start, end)?;
        self.buffer.sum(self.offset + span.start..self.offset + span.end)
    }

    /// Sum of every element in the store.
    pub fn sum_all(&self) -> Result<f64, StoreError> {
        self.sum_range(0, self.capacity())
    }

    /// Element index of row 0 within the shared buffer. Zero for stores
    /// created directly; [`rows`](Self::rows) advances it and reshapes
    /// inherit it.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Address of the first element of the shared buffer.
    pub fn buffer_address(&self) -> usize {
        self.buffer.address()
    }

    /// Whether `self` and `other` are views of the same buffer.
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        self.buffer.ptr_eq(&other.buffer)
    }

    /// Number of live views keeping the buffer alive.
    pub fn view_count(&self) -> usize {
        self.buffer.owners()
    }

    /// Exact payload size in bytes.
    pub fn footprint_bytes(&self) -> usize {
        self.buffer.memory_bytes()
    }
}

impl VectorStore for FixedVectorStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Fixed
    }

    fn len(&self) -> usize {
        self.capacity()
    }

    fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError> {
        FixedVectorStore::read(self, index)
    }

    fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError> {
        FixedVectorStore::write(self, index, vector)
    }

    fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        FixedVectorStore::sum_range(self, start, end)
    }

    fn footprint_bytes(&self) -> usize {
        FixedVectorStore::footprint_bytes(self)
    }
}

impl std::fmt::Debug for FixedVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedVectorStore")
            .field("shape", &self.shape)
            .field("views", &self.view_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_fills_every_vector() {
        let store = FixedVectorStore::create(16, 8, 0.5).unwrap();
        for i in 0..16 {
            let v = store.read(i).unwrap();
            assert_eq!(v.len(), 8);
            assert!(v.iter().all(|&x| x == 0.5));
        }
    }

    #[test]
    fn create_rejects_zero_dim() {
        assert_eq!(
            FixedVectorStore::create(10, 0, 1.0).unwrap_err(),
            StoreError::InvalidShape {
                capacity: 10,
                dim: 0
            }
        );
    }

    #[test]
    fn read_out_of_range() {
        let store = FixedVectorStore::create(3, 2, 0.0).unwrap();
        assert_eq!(
            store.read(3).unwrap_err(),
            StoreError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn read_is_zero_copy() {
        let store = FixedVectorStore::create(4, 4, 0.0).unwrap();
        let v = store.read(2).unwrap();
        assert_eq!(v.as_ptr() as usize, store.buffer_address() + 2 * 4 * 4);
    }

    #[test]
    fn write_then_read() {
        let mut store = FixedVectorStore::create(4, 3, 0.0).unwrap();
        store.write(1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(store.read(1).unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(store.read(0).unwrap().to_vec(), vec![0.0; 3]);
        assert_eq!(store.read(2).unwrap().to_vec(), vec![0.0; 3]);
    }

    #[test]
    fn write_wrong_length_has_no_effect() {
        let mut store = FixedVectorStore::create(2, 3, 1.0).unwrap();
        assert_eq!(
            store.write(0, &[9.0; 4]).unwrap_err(),
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        );
        assert_eq!(store.sum_all().unwrap(), 6.0);
    }

    #[test]
    fn write_while_view_alive_is_rejected() {
        let store = FixedVectorStore::create(2, 2, 0.0).unwrap();
        let mut other = store.reshape(4, 1).unwrap();
        let view = store.read(0).unwrap();
        assert_eq!(other.write(0, &[1.0]), Err(StoreError::BufferInUse));
        drop(view);
        other.write(0, &[1.0]).unwrap();
        assert_eq!(store.read(0).unwrap()[0], 1.0);
    }

    #[test]
    fn reshape_shares_buffer_and_preserves_address() {
        let store = FixedVectorStore::from_fn(1000, 10, |i| i as f32).unwrap();
        let matrix = store.reshape(10, 1000).unwrap();
        assert!(matrix.shares_buffer_with(&store));
        assert_eq!(matrix.buffer_address(), store.buffer_address());
        assert_eq!(matrix.byte_strides(), (4000, 4));
        assert_eq!(store.byte_strides(), (40, 4));
        assert_eq!(store.view_count(), 2);
        assert_eq!(matrix.offset(), 0);
    }

    #[test]
    fn row_range_view_is_offset_into_the_same_buffer() {
        let store = FixedVectorStore::from_fn(6, 2, |i| i as f32).unwrap();
        let mut tail = store.rows(2, 5).unwrap();
        assert!(tail.shares_buffer_with(&store));
        assert_eq!(tail.offset(), 4);
        assert_eq!(tail.capacity(), 3);
        assert_eq!(tail.read(0).unwrap().to_vec(), vec![4.0, 5.0]);
        assert_eq!(tail.sum_all().unwrap(), 4.0 + 5.0 + 6.0 + 7.0 + 8.0 + 9.0);
        assert!(matches!(
            tail.read(3),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        ));

        tail.write(1, &[-1.0, -1.0]).unwrap();
        assert_eq!(store.read(3).unwrap().to_vec(), vec![-1.0, -1.0]);

        let nested = tail.rows(1, 3).unwrap().reshape(1, 4).unwrap();
        assert_eq!(nested.offset(), 6);
        assert_eq!(nested.read(0).unwrap().to_vec(), vec![-1.0, -1.0, 8.0, 9.0]);
        assert!(matches!(
            store.rows(4, 7),
            Err(StoreError::IndexOutOfRange { index: 7, len: 6 })
        ));
    }

    #[test]
    fn reshape_keeps_linear_layout() {
        let store = FixedVectorStore::from_fn(6, 2, |i| i as f32).unwrap();
        let r = store.reshape(3, 4).unwrap().reshape(2, 6).unwrap();
        assert_eq!(r.read(1).unwrap().to_vec(), vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn reshape_mismatch_leaves_original_intact() {
        let store = FixedVectorStore::from_fn(4, 2, |i| i as f32).unwrap();
        assert_eq!(
            store.reshape(3, 3).unwrap_err(),
            StoreError::ShapeMismatch {
                from: (4, 2),
                to: (3, 3)
            }
        );
        assert_eq!(store.shape(), Shape::new(4, 2).unwrap());
        assert_eq!(store.view_count(), 1);
        assert_eq!(store.sum_all().unwrap(), 28.0);
    }

    #[test]
    fn writes_visible_across_views() {
        let store = FixedVectorStore::create(4, 2, 0.0).unwrap();
        let mut flat = store.flatten().unwrap();
        flat.write(0, &[1.0; 8]).unwrap();
        assert_eq!(store.sum_all().unwrap(), 8.0);
    }

    #[test]
    fn buffer_outlives_original_view() {
        let store = FixedVectorStore::create(2, 2, 3.0).unwrap();
        let flat = store.flatten().unwrap();
        drop(store);
        assert_eq!(flat.view_count(), 1);
        assert_eq!(flat.sum_all().unwrap(), 12.0);
    }

    #[test]
    fn sum_range_uniform() {
        let store = FixedVectorStore::create(1000, 128, 0.5).unwrap();
        assert_eq!(store.sum_range(0, 1000).unwrap(), 64000.0);
        assert_eq!(store.sum_range(10, 20).unwrap(), 10.0 * 128.0 * 0.5);
        assert_eq!(store.sum_range(5, 5).unwrap(), 0.0);
    }

    #[test]
    fn sum_range_bounds() {
        let store = FixedVectorStore::create(10, 2, 1.0).unwrap();
        assert!(matches!(
            store.sum_range(0, 11),
            Err(StoreError::IndexOutOfRange { index: 11, len: 10 })
        ));
        assert!(store.sum_range(6, 5).is_err());
    }

    #[test]
    fn empty_store_is_valid_but_cannot_flatten() {
        let store = FixedVectorStore::create(0, 4, 1.0).unwrap();
        assert_eq!(store.sum_all().unwrap(), 0.0);
        assert!(matches!(
            store.flatten(),
            Err(StoreError::InvalidShape { .. })
        ));
    }

    #[test]
    fn seeded_stores_are_reproducible() {
        let a = FixedVectorStore::seeded(8, 4, 7).unwrap();
        let b = FixedVectorStore::seeded(8, 4, 7).unwrap();
        for i in 0..8 {
            assert_eq!(a.read(i).unwrap().to_vec(), b.read(i).unwrap().to_vec());
        }
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fill_value_visible_everywhere(
                capacity in 1usize..64,
                dim in 1usize..32,
                v in -100.0f32..100.0,
            ) {
                let store = FixedVectorStore::create(capacity, dim, v).unwrap();
                for i in 0..capacity {
                    let view = store.read(i).unwrap();
                    prop_assert_eq!(view.len(), dim);
                    prop_assert!(view.iter().all(|&x| x == v));
                }
            }

            #[test]
            fn reshape_round_trip_matches_linear_layout(
                a in 1usize..12,
                b in 1usize..12,
                c_idx in 0usize..8,
            ) {
                let total = a * b;
                let store = FixedVectorStore::from_fn(a, b, |i| i as f32).unwrap();
                let divisors: Vec<usize> = (1..=total).filter(|d| total % d == 0).collect();
                let d = divisors[c_idx % divisors.len()];
                let view = store.reshape(b, a).unwrap().reshape(total / d, d).unwrap();
                for row in 0..total / d {
                    let got = view.read(row).unwrap().to_vec();
                    let want: Vec<f32> = (row * d..(row + 1) * d).map(|i| i as f32).collect();
                    prop_assert_eq!(got, want);
                }
            }

            #[test]
            fn uniform_sum_is_n_dim_v(
                capacity in 1usize..200,
                dim in 1usize..16,
                n_frac in 0.0f64..=1.0,
            ) {
                let n = (capacity as f64 * n_frac) as usize;
                let store = FixedVectorStore::create(capacity, dim, 0.25).unwrap();
                let expected = n as f64 * dim as f64 * 0.25;
                prop_assert!((store.sum_range(0, n).unwrap() - expected).abs() < 1e-6);
            }
        }
    }
}
