//! Shared, contiguous element buffers.
//!
//! A [`SharedBuffer`] is one heap allocation of `f32` elements with shared
//! ownership. Every [`FixedVectorStore`](crate::FixedVectorStore) view
//! produced by reshaping points at the same `SharedBuffer`; the allocation
//! is released when the last view drops.

use std::cell::{Ref, RefCell};
use std::ops::Range;
use std::rc::Rc;

use stride_core::{StoreError, ELEMENT_SIZE};

use crate::fill::Fill;

/// A reference-counted contiguous `Vec<f32>`.
///
/// Single-threaded by construction (`Rc<RefCell<_>>`), which makes every
/// store built on it `!Send` and `!Sync`. Reads hand out runtime borrows;
/// a write while any borrow is live fails with
/// [`StoreError::BufferInUse`] instead of aliasing.
#[derive(Clone)]
pub struct SharedBuffer {
    data: Rc<RefCell<Vec<f32>>>,
    len: usize,
    address: usize,
}

impl SharedBuffer {
    /// Allocate `len` elements initialised from `fill`.
    ///
    /// The allocation is reserved up front in one request; failure surfaces
    /// as [`StoreError::ResourceExhausted`].
    pub fn new(len: usize, fill: Fill) -> Result<Self, StoreError> {
        let mut data = reserve(len)?;
        match fill {
            Fill::Value(v) => data.resize(len, v),
            seeded => data.extend(seeded.stream().take(len)),
        }
        Ok(Self::from_vec(data))
    }

    /// Allocate `len` elements, computing each from its linear index.
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> f32) -> Result<Self, StoreError> {
        let mut data = reserve(len)?;
        data.extend((0..len).map(&mut f));
        Ok(Self::from_vec(data))
    }

    fn from_vec(data: Vec<f32>) -> Self {
        // The Vec is never resized after this point, so its heap pointer
        // and length are fixed for the buffer's lifetime.
        let len = data.len();
        let address = data.as_ptr() as usize;
        Self {
            data: Rc::new(RefCell::new(data)),
            len,
            address,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the elements in `range` without copying.
    ///
    /// # Panics
    ///
    /// Panics if `range` exceeds the buffer; callers validate against their
    /// [`Shape`](stride_core::Shape) first.
    pub fn slice(&self, range: Range<usize>) -> Result<Ref<'_, [f32]>, StoreError> {
        let data = self.data.try_borrow().map_err(|_| StoreError::BufferInUse)?;
        Ok(Ref::map(data, |d| &d[range]))
    }

    /// Copy `values` into the buffer starting at element `offset`.
    pub fn write(&self, offset: usize, values: &[f32]) -> Result<(), StoreError> {
        let mut data = self
            .data
            .try_borrow_mut()
            .map_err(|_| StoreError::BufferInUse)?;
        data[offset..offset + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Sum the elements in `range` in buffer order, accumulating in `f64`.
    pub fn sum(&self, range: Range<usize>) -> Result<f64, StoreError> {
        let data = self.slice(range)?;
        Ok(data.iter().map(|&v| f64::from(v)).sum())
    }

    /// Address of the first element. Stable for the buffer's lifetime.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Whether `self` and `other` are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live views sharing this buffer.
    pub fn owners(&self) -> usize {
        Rc::strong_count(&self.data)
    }

    /// Memory usage of the payload in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.len() * ELEMENT_SIZE
    }
}

fn reserve(len: usize) -> Result<Vec<f32>, StoreError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| StoreError::ResourceExhausted {
            requested_bytes: (len as u64).saturating_mul(ELEMENT_SIZE as u64),
        })?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_buffer_has_requested_values() {
        let buf = SharedBuffer::new(10, Fill::Value(0.5)).unwrap();
        assert_eq!(buf.len(), 10);
        assert!(buf.slice(0..10).unwrap().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn from_fn_sees_linear_indices() {
        let buf = SharedBuffer::from_fn(5, |i| i as f32).unwrap();
        assert_eq!(&*buf.slice(0..5).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn write_visible_through_clone() {
        let a = SharedBuffer::new(4, Fill::Value(0.0)).unwrap();
        let b = a.clone();
        a.write(2, &[7.0, 8.0]).unwrap();
        assert_eq!(&*b.slice(0..4).unwrap(), &[0.0, 0.0, 7.0, 8.0]);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.owners(), 2);
    }

    #[test]
    fn write_while_borrowed_fails_without_effect() {
        let buf = SharedBuffer::new(4, Fill::Value(1.0)).unwrap();
        let held = buf.slice(0..2).unwrap();
        assert_eq!(buf.write(0, &[9.0]), Err(StoreError::BufferInUse));
        drop(held);
        assert_eq!(buf.sum(0..4).unwrap(), 4.0);
    }

    #[test]
    fn impossible_allocation_is_resource_exhausted() {
        let result = SharedBuffer::new(usize::MAX / ELEMENT_SIZE, Fill::Value(0.0));
        assert!(matches!(
            result,
            Err(StoreError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn memory_bytes_is_exact_payload() {
        let buf = SharedBuffer::new(1024, Fill::Value(0.0)).unwrap();
        assert_eq!(buf.memory_bytes(), 4096);
    }
}
