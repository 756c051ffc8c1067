//! Utility functions.

/// Rounds `value` down to the nearest multiple of `align`.
/// `align` must be non-zero.
pub fn align_down(value: u64, align: u64) -> u64 {
    (value / align) * align
}
