//! Initial-value policies for freshly created stores.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// How a new store's elements are initialised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    /// Every element takes the same value.
    Value(f32),
    /// Uniform values in `[0, 1)` from a ChaCha8 stream seeded with the
    /// given value. Identical seeds produce identical contents.
    Seeded(u64),
}

impl Fill {
    /// An endless stream of element values following this policy.
    pub fn stream(&self) -> FillStream {
        match *self {
            Self::Value(v) => FillStream::Constant(v),
            Self::Seeded(seed) => FillStream::Seeded(Box::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Self::Value(0.0)
    }
}

/// Iterator returned by [`Fill::stream`]. Never ends.
pub enum FillStream {
    /// Yields the same value forever.
    Constant(f32),
    /// Yields seeded uniform values.
    Seeded(Box<ChaCha8Rng>),
}

impl Iterator for FillStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self {
            Self::Constant(v) => Some(*v),
            Self::Seeded(rng) => Some(unit_f32(rng.next_u32())),
        }
    }
}

/// Map 32 random bits onto `[0, 1)` using the top 24 (the f32 mantissa width).
pub(crate) fn unit_f32(bits: u32) -> f32 {
    (bits >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}
