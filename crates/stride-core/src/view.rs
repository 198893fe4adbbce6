//! Zero-copy views of a single stored vector.

use std::cell::Ref;
use std::fmt;
use std::ops::Deref;

/// A read-only, zero-copy view of one vector.
///
/// Stores hand out views that point directly into their backing memory
/// (heap buffer, mapped file, or boxed entry). A view never owns a copy of
/// the data; call [`to_vec`](VectorView::to_vec) when an owned vector is
/// needed.
///
/// Views of a shared buffer hold a runtime borrow: writes to any store
/// sharing that buffer fail with
/// [`StoreError::BufferInUse`](crate::StoreError::BufferInUse) until the
/// view is dropped.
pub struct VectorView<'a> {
    inner: Inner<'a>,
}

enum Inner<'a> {
    Borrowed(&'a [f32]),
    Shared(Ref<'a, [f32]>),
}

impl<'a> VectorView<'a> {
    /// View over a plain borrowed slice.
    pub fn borrowed(data: &'a [f32]) -> Self {
        Self {
            inner: Inner::Borrowed(data),
        }
    }

    /// View over a slice of a `RefCell`-guarded shared buffer.
    pub fn shared(data: Ref<'a, [f32]>) -> Self {
        Self {
            inner: Inner::Shared(data),
        }
    }

    /// Copy the viewed values into an owned vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.deref().to_vec()
    }
}

impl Deref for VectorView<'_> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        match &self.inner {
            Inner::Borrowed(s) => s,
            Inner::Shared(r) => r,
        }
    }
}

impl AsRef<[f32]> for VectorView<'_> {
    fn as_ref(&self) -> &[f32] {
        self
    }
}

impl fmt::Debug for VectorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq<[f32]> for VectorView<'_> {
    fn eq(&self, other: &[f32]) -> bool {
        self.deref() == other
    }
}
