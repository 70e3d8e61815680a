//! Row payloads on the wire: native-endian `f64` cells viewed as bytes.
//!
//! Workers of one run share a machine architecture (threads of one process,
//! or ranks of one MPI job), so rows are shipped without re-encoding.

use bytemuck::Pod;
use static_assertions::const_assert_eq;
use std::mem::size_of;

const_assert_eq!(size_of::<f64>(), 8);

/// Bytes occupied by `cells` grid values.
pub const fn cell_bytes(cells: usize) -> usize {
    cells * size_of::<f64>()
}

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Copy a received payload into `dst`, which must be exactly as long.
///
/// The payload comes back as a plain `Vec<u8>` with no alignment promise,
/// so it is copied bytewise instead of reinterpreted in place.
pub fn copy_cells_into(dst: &mut [f64], payload: &[u8]) -> Result<(), String> {
    expect_exact_len(payload.len(), cell_bytes(dst.len()))?;
    cast_slice_mut(dst).copy_from_slice(payload);
    Ok(())
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_survive_the_byte_view() {
        let row = [0.0, 1.5, -2.25, 100.0 / 3.0];
        let bytes = cast_slice(&row).to_vec();
        let mut out = [0.0f64; 4];
        copy_cells_into(&mut out, &bytes).unwrap();
        assert_eq!(out, row);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let mut out = [0.0f64; 2];
        let err = copy_cells_into(&mut out, &[0u8; 12]).unwrap_err();
        assert_eq!(err, "expected 16 bytes, got 12");
    }
}
