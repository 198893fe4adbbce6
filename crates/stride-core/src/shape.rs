//! Logical shapes and stride arithmetic for row-major vector buffers.

use std::fmt;

use crate::error::StoreError;

/// Size in bytes of one stored element (`f32`).
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f32>();

/// Distance between consecutive rows and consecutive elements, in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strides {
    /// Elements between the start of row `i` and row `i + 1`.
    pub row: usize,
    /// Elements between adjacent values of one row. Always 1 for
    /// contiguous shapes.
    pub element: usize,
}

/// A `capacity x dim` row-major interpretation of a flat element buffer.
///
/// Construction validates the shape once; afterwards every derived
/// quantity (element count, strides, offsets) is infallible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    capacity: usize,
    dim: usize,
}

impl Shape {
    /// Validate and build a shape.
    ///
    /// Fails with [`StoreError::InvalidShape`] if `dim == 0` or if
    /// `capacity * dim * ELEMENT_SIZE` overflows `usize`.
    pub fn new(capacity: usize, dim: usize) -> Result<Self, StoreError> {
        let invalid = StoreError::InvalidShape { capacity, dim };
        if dim == 0 {
            return Err(invalid);
        }
        capacity
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(ELEMENT_SIZE))
            .ok_or(invalid)?;
        Ok(Self { capacity, dim })
    }

    /// Number of vectors.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements per vector.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Total number of elements (`capacity * dim`).
    pub fn element_count(&self) -> usize {
        self.capacity * self.dim
    }

    /// Total payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.element_count() * ELEMENT_SIZE
    }

    /// Element strides for this shape.
    pub fn strides(&self) -> Strides {
        Strides {
            row: self.dim,
            element: 1,
        }
    }

    /// Strides in bytes, `(row, element)`.
    pub fn byte_strides(&self) -> (usize, usize) {
        let s = self.strides();
        (s.row * ELEMENT_SIZE, s.element * ELEMENT_SIZE)
    }

    /// Element offset of row `index`.
    ///
    /// Fails with [`StoreError::IndexOutOfRange`] unless `index < capacity`.
    pub fn row_offset(&self, index: usize) -> Result<usize, StoreError> {
        self.check_index(index)?;
        Ok(index * self.strides().row)
    }

    /// Ensure `index` addresses an existing row.
    pub fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index >= self.capacity {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.capacity,
            });
        }
        Ok(())
    }

    /// Element range covered by rows `[start, end)`.
    ///
    /// `start == end` is an empty range. `start > end` or `end > capacity`
    /// fails with [`StoreError::IndexOutOfRange`].
    pub fn row_span(&self, start: usize, end: usize) -> Result<std::ops::Range<usize>, StoreError> {
        if end > self.capacity {
            return Err(StoreError::IndexOutOfRange {
                index: end,
                len: self.capacity,
            });
        }
        if start > end {
            return Err(StoreError::IndexOutOfRange {
                index: start,
                len: self.capacity,
            });
        }
        Ok(start * self.dim..end * self.dim)
    }

    /// Ensure `vector` has this shape's dimension.
    pub fn check_dim(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Reinterpret the same elements as `new_capacity x new_dim`.
    ///
    /// Only the element count has to match; every contiguous row-major
    /// split of the same buffer is compatible.
    pub fn reshape(&self, new_capacity: usize, new_dim: usize) -> Result<Self, StoreError> {
        let target = Self::new(new_capacity, new_dim)?;
        if target.element_count() != self.element_count() {
            return Err(StoreError::ShapeMismatch {
                from: (self.capacity, self.dim),
                to: (new_capacity, new_dim),
            });
        }
        Ok(target)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.capacity, self.dim)
    }
}
