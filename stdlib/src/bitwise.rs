//! Guarded shift primitives for hostrt
//!
//! Native Rust shifts panic in debug builds (and mask in release) when the
//! shift amount is outside the bit width. Compiled programs expect neither:
//! any amount outside `[0, 31]` produces zero.

/// Returns true when `b` is a usable 32-bit shift amount.
///
/// This is a guard, not a mask: `b & 31` must equal `b` itself, so negative
/// amounts and amounts of 32 or more are rejected.
#[inline]
pub fn shift_in_range(b: i32) -> bool {
    (b & 31) == b
}

/// Guarded left shift.
///
/// # Parameters
/// - a "The value to shift"
/// - b "The shift amount"
///
/// # Test Cases
/// - shl(1, 0) = 1
/// - shl(1, 31) = i32::MIN
/// - shl(1, 32) = 0
/// - shl(1, -1) = 0
#[inline]
pub fn shl(a: i32, b: i32) -> i32 {
    if shift_in_range(b) {
        a << b
    } else {
        0
    }
}

/// Guarded unsigned (zero-fill) right shift.
///
/// The bit pattern of `a` is shifted as if it were unsigned; the result is
/// reinterpreted as `i32`.
///
/// # Test Cases
/// - shr(-1, 28) = 15
/// - shr(i32::MIN, 31) = 1
/// - shr(-1, 32) = 0
/// - shr(-1, -1) = 0
#[inline]
pub fn shr(a: i32, b: i32) -> i32 {
    if shift_in_range(b) {
        ((a as u32) >> b) as i32
    } else {
        0
    }
}
