//! Benchmark configuration, validation, and error types.
//!
//! [`BenchConfig`] fixes the workload every store kind is driven through.
//! [`validate()`](BenchConfig::validate) checks it once up front so the
//! runner can assume a coherent shape.

use std::error::Error;
use std::fmt;

use stride_core::{Shape, StoreError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`BenchConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `dim` is zero.
    ZeroDimension,
    /// The access index does not address a vector.
    AccessIndexOutOfRange {
        /// The configured index.
        index: usize,
        /// The configured capacity.
        capacity: usize,
    },
    /// `sample_size` is zero.
    ZeroSampleSize,
    /// `capacity * dim` bytes does not fit in `usize`.
    ShapeOverflow {
        /// The configured capacity.
        capacity: usize,
        /// The configured dimension.
        dim: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "dim must be at least 1"),
            Self::AccessIndexOutOfRange { index, capacity } => {
                write!(f, "access_index {index} is outside capacity {capacity}")
            }
            Self::ZeroSampleSize => write!(f, "sample_size must be at least 1"),
            Self::ShapeOverflow { capacity, dim } => {
                write!(f, "shape {capacity}x{dim} overflows the address space")
            }
        }
    }
}

impl Error for ConfigError {}

// ── BenchError ─────────────────────────────────────────────────────

/// Failure of a benchmark run: either the config or a store operation.
#[derive(Clone, Debug, PartialEq)]
pub enum BenchError {
    /// The configuration was rejected before any store was built.
    Config(ConfigError),
    /// A store operation failed mid-run.
    Store(StoreError),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

impl Error for BenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BenchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StoreError> for BenchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ── BenchConfig ────────────────────────────────────────────────────

/// Workload shared by every store kind in one comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    /// Number of vectors. Default: 1 000 000.
    pub capacity: usize,
    /// Elements per vector. Default: 128.
    pub dim: usize,
    /// Value every element is initialised to. Default: 0.5.
    pub fill_value: f32,
    /// Vector read by the random-access step. `None` = `capacity / 2`.
    pub access_index: Option<usize>,
    /// Vectors summed by the range-sum step, clamped to `capacity`.
    /// Default: 10 000.
    pub sample_size: usize,
    /// Seed for shuffled traversal orders. Default: 42.
    pub seed: u64,
}

impl BenchConfig {
    /// Default number of vectors.
    pub const DEFAULT_CAPACITY: usize = 1_000_000;
    /// Default vector dimension.
    pub const DEFAULT_DIM: usize = 128;
    /// Default fill value.
    pub const DEFAULT_FILL: f32 = 0.5;
    /// Default range-sum sample size.
    pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;
    /// Default traversal seed.
    pub const DEFAULT_SEED: u64 = 42;

    /// Config with the given shape and every other field at its default.
    pub fn new(capacity: usize, dim: usize) -> Self {
        Self {
            capacity,
            dim,
            ..Self::default()
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dim == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if Shape::new(self.capacity, self.dim).is_err() {
            return Err(ConfigError::ShapeOverflow {
                capacity: self.capacity,
                dim: self.dim,
            });
        }
        if self.sample_size == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        // Also rejects capacity 0, where the default index addresses nothing.
        let index = self.resolved_access_index();
        if index >= self.capacity {
            return Err(ConfigError::AccessIndexOutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// The validated shape.
    pub fn shape(&self) -> Result<Shape, ConfigError> {
        self.validate()?;
        Shape::new(self.capacity, self.dim).map_err(|_| ConfigError::ShapeOverflow {
            capacity: self.capacity,
            dim: self.dim,
        })
    }

    /// Vector read by the random-access step.
    pub fn resolved_access_index(&self) -> usize {
        self.access_index.unwrap_or(self.capacity / 2)
    }

    /// Vectors summed by the range-sum step.
    pub fn resolved_sample_size(&self) -> usize {
        self.sample_size.min(self.capacity)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            dim: Self::DEFAULT_DIM,
            fill_value: Self::DEFAULT_FILL,
            access_index: None,
            sample_size: Self::DEFAULT_SAMPLE_SIZE,
            seed: Self::DEFAULT_SEED,
        }
    }
}

// ── Profiles ───────────────────────────────────────────────────────

/// Reference profile: 1 000 000 vectors of 128 `f32` (512 MB flat).
pub fn reference_profile() -> BenchConfig {
    BenchConfig::default()
}

/// Small profile: 10 000 vectors of 128 `f32` (5 MB flat), for CI and
/// criterion iterations.
pub fn small_profile() -> BenchConfig {
    BenchConfig::new(10_000, BenchConfig::DEFAULT_DIM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        reference_profile().validate().unwrap();
        small_profile().validate().unwrap();
    }

    #[test]
    fn reference_profile_matches_documented_defaults() {
        let config = reference_profile();
        assert_eq!(config.capacity, 1_000_000);
        assert_eq!(config.dim, 128);
        assert_eq!(config.fill_value, 0.5);
        assert_eq!(config.resolved_sample_size(), 10_000);
        assert_eq!(config.resolved_access_index(), 500_000);
    }

    #[test]
    fn zero_dim_rejected() {
        let config = BenchConfig::new(10, 0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroDimension));
    }

    #[test]
    fn zero_sample_rejected() {
        let config = BenchConfig {
            sample_size: 0,
            ..BenchConfig::new(10, 4)
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleSize));
    }

    #[test]
    fn access_index_must_be_in_range() {
        let config = BenchConfig {
            access_index: Some(10),
            ..BenchConfig::new(10, 4)
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AccessIndexOutOfRange {
                index: 10,
                capacity: 10
            })
        );
    }

    #[test]
    fn empty_capacity_rejected() {
        let config = BenchConfig::new(0, 4);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AccessIndexOutOfRange {
                index: 0,
                capacity: 0
            })
        );
    }

    #[test]
    fn overflowing_shape_rejected() {
        let config = BenchConfig::new(usize::MAX, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ShapeOverflow { .. })
        ));
    }

    #[test]
    fn sample_size_clamps_to_capacity() {
        let config = BenchConfig::new(100, 4);
        assert_eq!(config.resolved_sample_size(), 100);
    }

    #[test]
    fn bench_error_exposes_source() {
        let err = BenchError::from(StoreError::UseAfterClose);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("store: "));
    }
}
