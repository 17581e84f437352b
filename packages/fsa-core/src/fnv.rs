//! FNV-1a hashing for interned keys
//!
//! 32-bit FNV-1a over `i32` values, fed byte by byte from the low byte up,
//! with a finalization step that widens the mixed code to `u64`:
//! - positive codes are preserved as-is
//! - zero and negative codes `c` map to `2^32 - c`, which lands them in
//!   `(2^32, 2^32 + 2^31]`
//!
//! The finalization is a bijection on the 32-bit code space, so distinct
//! codes stay distinct after widening. Table probing reduces the result
//! modulo the table length, so the exact arithmetic here decides every
//! probe sequence and must stay stable across versions.
//!
//! # References
//! - Fowler, G., Noll, L. C., Vo, P. "FNV Hash" (draft-eastlake-fnv)

/// FNV-1a 32-bit offset basis, kept in the `i32` domain used by the mixer.
pub const OFFSET_BASIS: i32 = 0x811C_9DC5_u32 as i32;

/// FNV-1a 32-bit prime
pub const PRIME: i32 = 0x0100_0193;

/// Mix one `i32` into a running code, low byte first
#[inline]
pub fn mix_int(code: i32, value: i32) -> i32 {
    let mut c = code;
    c = (c ^ (value & 0xff)).wrapping_mul(PRIME);
    c = (c ^ ((value >> 8) & 0xff)).wrapping_mul(PRIME);
    c = (c ^ ((value >> 16) & 0xff)).wrapping_mul(PRIME);
    c = (c ^ (((value as u32) >> 24) as i32)).wrapping_mul(PRIME);
    c
}

/// Widen a mixed code to the `u64` probe domain
#[inline]
pub fn finalize(code: i32) -> u64 {
    if code > 0 {
        code as u64
    } else {
        (0x1_0000_0000_i64 - code as i64) as u64
    }
}

/// Finalized hash of a single `i32`
#[inline]
pub fn hash_int(value: i32) -> u64 {
    finalize(mix_int(OFFSET_BASIS, value))
}

/// Finalized hash of a slice of `i32`s, in slice order
#[inline]
pub fn hash_ints(values: &[i32]) -> u64 {
    let mut code = OFFSET_BASIS;
    for &value in values {
        code = mix_int(code, value);
    }
    finalize(code)
}
