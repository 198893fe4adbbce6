//! Test utilities and deterministic stand-ins for stride development.
//!
//! Provides a stepping [`MonotonicClock`], a scripted [`MemoryProbe`],
//! temporary backing files for mapped stores, and store fixtures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::Cell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stride_core::{MemoryProbe, MonotonicClock};
use tempfile::TempDir;

/// Clock that advances by a fixed step on every reading.
///
/// The first reading is `step`, the second `2 * step`, and so on, so any
/// measured interval made of two readings is exactly `step`.
#[derive(Debug)]
pub struct SteppingClock {
    step: Duration,
    ticks: Cell<u32>,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            ticks: Cell::new(0),
        }
    }

    /// Number of readings taken so far.
    pub fn readings(&self) -> u32 {
        self.ticks.get()
    }
}

impl MonotonicClock for SteppingClock {
    fn now(&self) -> Duration {
        let ticks = self.ticks.get() + 1;
        self.ticks.set(ticks);
        self.step * ticks
    }
}

/// Memory probe that replays a fixed script of readings.
///
/// Once the script runs out, every further reading is `None`.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    readings: VecDeque<u64>,
    taken: usize,
}

impl ScriptedProbe {
    pub fn new(readings: impl IntoIterator<Item = u64>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            taken: 0,
        }
    }

    /// Number of readings handed out so far.
    pub fn taken(&self) -> usize {
        self.taken
    }
}

impl MemoryProbe for ScriptedProbe {
    fn resident_bytes(&mut self) -> Option<u64> {
        let next = self.readings.pop_front()?;
        self.taken += 1;
        Some(next)
    }
}

/// A temporary directory holding one backing-file path.
///
/// The file itself is not created; mapped stores create it on open. The
/// directory and everything in it are removed on drop.
#[derive(Debug)]
pub struct TempBacking {
    dir: TempDir,
    path: PathBuf,
}

impl TempBacking {
    /// Backing path named `vectors.bin`.
    pub fn new() -> std::io::Result<Self> {
        Self::named("vectors.bin")
    }

    /// Backing path with the given file name.
    pub fn named(file_name: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(file_name);
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Another path in the same directory.
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Current length of the backing file, if it exists.
    pub fn file_len(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_clock_advances_per_reading() {
        let clock = SteppingClock::new(Duration::from_millis(2));
        let start = clock.now();
        assert_eq!(clock.since(start), Duration::from_millis(2));
        assert_eq!(clock.readings(), 2);
    }

    #[test]
    fn scripted_probe_runs_dry() {
        let mut probe = ScriptedProbe::new([1, 2]);
        assert_eq!(probe.resident_bytes(), Some(1));
        assert_eq!(probe.resident_bytes(), Some(2));
        assert_eq!(probe.resident_bytes(), None);
        assert_eq!(probe.taken(), 2);
    }

    #[test]
    fn temp_backing_cleans_up() {
        let backing = TempBacking::new().unwrap();
        std::fs::write(backing.path(), [0u8; 8]).unwrap();
        assert_eq!(backing.file_len(), Some(8));
        let dir = backing.path().parent().unwrap().to_path_buf();
        drop(backing);
        assert!(!dir.exists());
    }
}
