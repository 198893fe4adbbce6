//! Measurement records emitted by the benchmark runner.

use std::fmt;

use smallvec::SmallVec;

/// Which store representation produced a measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKind {
    /// One contiguous heap buffer (`FixedVectorStore`).
    Fixed,
    /// Key to independently allocated vector (`BoxedVectorStore`).
    Boxed,
    /// File-backed mapping (`MappedFileVectorStore`).
    Mapped,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fixed => "fixed",
            Self::Boxed => "boxed",
            Self::Mapped => "mapped",
        };
        f.write_str(name)
    }
}

/// The timed step a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Store construction through its factory.
    Create,
    /// One read at the configured access index.
    RandomAccess,
    /// `sum_range(0, sample_size)`.
    RangeSum,
    /// First read of a vector (may page-fault on mapped stores).
    ColdAccess,
    /// Immediate re-read of the same vector.
    HotAccess,
    /// Read-and-sum of every vector in a given visiting order.
    Traverse,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::RandomAccess => "random_access",
            Self::RangeSum => "range_sum",
            Self::ColdAccess => "cold_access",
            Self::HotAccess => "hot_access",
            Self::Traverse => "traverse",
        };
        f.write_str(name)
    }
}

/// One timed step.
///
/// Records are plain `Copy` data with no setters: once the runner emits
/// one, it never changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasurementRecord {
    /// What was timed.
    pub operation: Operation,
    /// Which store kind was driven.
    pub store_kind: StoreKind,
    /// Wall-clock duration of the step in seconds.
    pub elapsed_seconds: f64,
    /// Resident memory after the step, if a probe is installed.
    pub resident_memory_bytes: Option<u64>,
    /// Resident memory before the step, if a probe is installed.
    pub resident_before_bytes: Option<u64>,
}

impl MeasurementRecord {
    /// Resident memory growth across the step, when both readings exist.
    pub fn resident_delta_bytes(&self) -> Option<i64> {
        let after = self.resident_memory_bytes? as i64;
        let before = self.resident_before_bytes? as i64;
        Some(after - before)
    }
}

/// Records of one runner pass, in step order.
pub type RecordSet = SmallVec<[MeasurementRecord; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(before: Option<u64>, after: Option<u64>) -> MeasurementRecord {
        MeasurementRecord {
            operation: Operation::RangeSum,
            store_kind: StoreKind::Fixed,
            elapsed_seconds: 0.25,
            resident_memory_bytes: after,
            resident_before_bytes: before,
        }
    }

    #[test]
    fn delta_requires_both_readings() {
        assert_eq!(record(Some(100), Some(160)).resident_delta_bytes(), Some(60));
        assert_eq!(record(Some(160), Some(100)).resident_delta_bytes(), Some(-60));
        assert_eq!(record(None, Some(100)).resident_delta_bytes(), None);
    }

    #[test]
    fn display_names_are_snake_case() {
        assert_eq!(Operation::RandomAccess.to_string(), "random_access");
        assert_eq!(StoreKind::Mapped.to_string(), "mapped");
    }
}
