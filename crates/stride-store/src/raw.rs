//! Low-level primitives for file-mapped storage.
//!
//! The only `unsafe` in the workspace lives here: establishing mappings and
//! reinterpreting mapped bytes as `f32` elements. Each block carries a
//! `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::fs::File;
use std::io;

use memmap2::{Mmap, MmapMut, MmapOptions};

/// Map the first `len` bytes of `file` read-only.
pub(crate) fn map_read_only(file: &File, len: usize) -> io::Result<Mmap> {
    // SAFETY: the mapping is private to one store and the harness never
    // truncates a file it has mapped. Concurrent modification by another
    // process is outside the single-writer contract.
    unsafe { MmapOptions::new().len(len).map(file) }
}

/// Map the first `len` bytes of `file` read-write (shared with the file).
pub(crate) fn map_read_write(file: &File, len: usize) -> io::Result<MmapMut> {
    // SAFETY: as for `map_read_only`; the file was just sized to at least
    // `len` bytes by the caller.
    unsafe { MmapOptions::new().len(len).map_mut(file) }
}

/// Reinterpret mapped bytes as native-endian `f32` elements.
///
/// # Panics
///
/// Panics if `bytes` is not `f32`-aligned or not a whole number of
/// elements. Mappings are page-aligned and sized from a `Shape`, so this
/// only fires on a programming error.
pub(crate) fn as_elements(bytes: &[u8]) -> &[f32] {
    // SAFETY: every bit pattern is a valid `f32`, and `align_to` only
    // yields the correctly aligned middle part.
    let (head, body, tail) = unsafe { bytes.align_to::<f32>() };
    assert!(
        head.is_empty() && tail.is_empty(),
        "mapped region is not a whole number of aligned f32 elements"
    );
    body
}

/// Mutable counterpart of [`as_elements`].
pub(crate) fn as_elements_mut(bytes: &mut [u8]) -> &mut [f32] {
    // SAFETY: as for `as_elements`; exclusivity follows from `&mut`.
    let (head, body, tail) = unsafe { bytes.align_to_mut::<f32>() };
    assert!(
        head.is_empty() && tail.is_empty(),
        "mapped region is not a whole number of aligned f32 elements"
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_bytes_mut(v: &mut [f32]) -> &mut [u8] {
        let len = std::mem::size_of_val(v);
        // SAFETY: u8 has no alignment or validity requirements.
        unsafe { std::slice::from_raw_parts_mut(v.as_mut_ptr().cast::<u8>(), len) }
    }

    #[test]
    fn aligned_bytes_reinterpret_in_place() {
        let mut backing = vec![0f32; 4];
        as_elements_mut(as_bytes_mut(&mut backing))[2] = 1.5;
        assert_eq!(backing, vec![0.0, 0.0, 1.5, 0.0]);
        assert_eq!(as_elements(as_bytes_mut(&mut backing)).len(), 4);
    }

    #[test]
    #[should_panic(expected = "whole number")]
    fn ragged_length_is_rejected() {
        let mut backing = vec![0f32; 2];
        let bytes = as_bytes_mut(&mut backing);
        as_elements(&bytes[..6]);
    }

    #[test]
    fn mapping_round_trip() {
        let file = tempfile::tempfile().unwrap();
        file.set_len(16).unwrap();
        {
            let mut map = map_read_write(&file, 16).unwrap();
            as_elements_mut(&mut map)[3] = 99.0;
            map.flush().unwrap();
        }
        let map = map_read_only(&file, 16).unwrap();
        assert_eq!(as_elements(&map), &[0.0, 0.0, 0.0, 99.0]);
    }
}
