//! Engine-wide constants.
//!
//! Address arithmetic in every simulator works on 64-bit values; the helpers
//! here keep shift and mask construction safe at the edges of that width.

/// Width in bits of the simulated address space.
pub const ADDRESS_WIDTH: u32 = 64;

/// Returns a mask with the low `bits` bits set.
///
/// Saturates at an all-ones mask for `bits >= 64`.
#[inline]
pub const fn low_mask(bits: u32) -> u64 {
    if bits >= ADDRESS_WIDTH {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
