//! Key-to-allocation vector storage, the pointer-chasing baseline.
//!
//! [`BoxedVectorStore`] keeps every vector in its own heap allocation,
//! indexed by an integer key. It is deliberately naive: range sums look
//! each key up and walk its values one at a time, so the measured cost
//! includes hashing, pointer chasing and scattered memory.

use indexmap::IndexMap;
use stride_core::{StoreError, StoreKind, VectorStore, VectorView, ELEMENT_SIZE};

/// Bookkeeping bytes per entry beyond the payload: the `Vec` header, the
/// stored key, and the map's hash slot and index.
const ENTRY_OVERHEAD_BYTES: usize =
    std::mem::size_of::<Vec<f32>>() + std::mem::size_of::<usize>() * 2 + std::mem::size_of::<u64>();

/// Integer-keyed map of independently allocated vectors.
///
/// Keys need not be dense. Vectors are not required to share a dimension;
/// the store is a control, not a matrix.
#[derive(Clone, Debug, Default)]
pub struct BoxedVectorStore {
    entries: IndexMap<usize, Vec<f32>>,
}

impl BoxedVectorStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store with room for `n` entries in the index.
    ///
    /// Only the key index is pre-sized; each vector is still allocated on
    /// insert.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(n),
        }
    }

    /// As [`with_capacity`](Self::with_capacity), but a failed index
    /// allocation returns [`StoreError::ResourceExhausted`] instead of
    /// aborting.
    pub fn try_with_capacity(n: usize) -> Result<Self, StoreError> {
        let mut entries = IndexMap::new();
        entries
            .try_reserve(n)
            .map_err(|_| exhausted(n, ENTRY_OVERHEAD_BYTES))?;
        Ok(Self { entries })
    }

    /// Store a copy of `vector` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: usize, vector: &[f32]) {
        self.entries.insert(key, vector.to_vec());
    }

    /// As [`insert`](Self::insert), but allocation failure of the copy or
    /// of the index returns [`StoreError::ResourceExhausted`]. On failure
    /// the store is unchanged.
    pub fn try_insert(&mut self, key: usize, vector: &[f32]) -> Result<(), StoreError> {
        let mut copy = Vec::new();
        copy.try_reserve_exact(vector.len())
            .map_err(|_| exhausted(vector.len(), ELEMENT_SIZE))?;
        copy.extend_from_slice(vector);
        if !self.entries.contains_key(&key) {
            self.entries
                .try_reserve(1)
                .map_err(|_| exhausted(1, ENTRY_OVERHEAD_BYTES))?;
        }
        self.entries.insert(key, copy);
        Ok(())
    }

    /// Stored keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// Remove and return the vector under `key`.
    pub fn remove(&mut self, key: usize) -> Result<Vec<f32>, StoreError> {
        self.entries
            .swap_remove(&key)
            .ok_or(StoreError::KeyNotFound { key })
    }

    /// View of the vector under `key`.
    pub fn read(&self, key: usize) -> Result<VectorView<'_>, StoreError> {
        self.entries
            .get(&key)
            .map(|v| VectorView::borrowed(v))
            .ok_or(StoreError::KeyNotFound { key })
    }

    /// Whether a vector is stored under `key`.
    pub fn contains(&self, key: usize) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum every value of every vector whose key lies in `[start_key, end_key)`.
    ///
    /// Each key is looked up individually and each value added one at a
    /// time. When the key range is wider than the number of entries, the
    /// entries are walked instead and filtered by key, so the cost is
    /// bounded by `len()`. Missing keys contribute nothing; an inverted
    /// range sums to zero.
    pub fn sum_range(&self, start_key: usize, end_key: usize) -> f64 {
        let keys = start_key..end_key;
        let mut total = 0.0f64;
        if keys.len() > self.entries.len() {
            for (_, vector) in self.entries.iter().filter(|(k, _)| keys.contains(*k)) {
                for &value in vector {
                    total += f64::from(value);
                }
            }
        } else {
            for key in keys {
                if let Some(vector) = self.entries.get(&key) {
                    for &value in vector {
                        total += f64::from(value);
                    }
                }
            }
        }
        total
    }

    /// Estimated bytes held: payload plus per-entry bookkeeping.
    pub fn footprint_bytes(&self) -> usize {
        self.entries
            .values()
            .map(|v| v.capacity() * ELEMENT_SIZE + ENTRY_OVERHEAD_BYTES)
            .sum()
    }

    /// Bytes of vector payload alone.
    pub fn payload_bytes(&self) -> usize {
        self.entries.values().map(|v| v.len() * ELEMENT_SIZE).sum()
    }
}

fn exhausted(count: usize, unit: usize) -> StoreError {
    StoreError::ResourceExhausted {
        requested_bytes: (count as u64).saturating_mul(unit as u64),
    }
}

impl VectorStore for BoxedVectorStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Boxed
    }

    fn len(&self) -> usize {
        BoxedVectorStore::len(self)
    }

    fn read(&self, index: usize) -> Result<VectorView<'_>, StoreError> {
        BoxedVectorStore::read(self, index)
    }

    fn keys(&self) -> Vec<usize> {
        BoxedVectorStore::keys(self).collect()
    }

    fn write(&mut self, index: usize, vector: &[f32]) -> Result<(), StoreError> {
        self.try_insert(index, vector)
    }

    fn sum_range(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        Ok(BoxedVectorStore::sum_range(self, start, end))
    }

    fn footprint_bytes(&self) -> usize {
        BoxedVectorStore::footprint_bytes(self)
    }
}
