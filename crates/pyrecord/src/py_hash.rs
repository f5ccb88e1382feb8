//! CPython-compatible hash helpers used for deterministic record hashing.
//!
//! pyrecord uses deterministic hashing equivalent to `PYTHONHASHSEED=0` so
//! generated `__hash__` values are stable across runs and match CPython. Text
//! is hashed with SipHash-1-3 and a zeroed key; numbers use the Mersenne-prime
//! modular scheme; tuples use CPython's xxHash-derived combiner.
//!
//! ## Cross-type hash invariant
//!
//! If `a == b` then `hash(a) == hash(b)`. Since `1 == 1.0 == True`, int, float
//! and bool hashing must agree on equal inputs, which [`hash_int`] and
//! [`hash_float`] guarantee.
//!
//! All helpers return the signed value Python would report from `hash(x)`.

/// Mersenne prime used by CPython for numeric hashing: `2^61 - 1`.
const MODULUS: i64 = (1 << 61) - 1;

/// Hash of `None` in CPython 3.12+ (a fixed constant rather than an address).
pub(crate) const NONE_HASH: i64 = 0xFCA8_6420;

/// Hashes UTF-8 string content with CPython's deterministic seed-0 algorithm.
///
/// Empty input hashes to `0` and a computed `-1` is remapped to `-2`.
#[must_use]
pub(crate) fn hash_str(value: &str) -> i64 {
    let bytes = value.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let signed = i64::from_ne_bytes(siphash13_with_seed0(bytes).to_ne_bytes());
    if signed == -1 { -2 } else { signed }
}

/// Hashes a signed 64-bit integer using CPython's modular algorithm.
///
/// The algorithm is `n % MODULUS` (sign-preserving), with `-1` remapped to `-2`
/// because CPython reserves `-1` as an error sentinel.
#[must_use]
pub(crate) fn hash_int(value: i64) -> i64 {
    if value == 0 {
        return 0;
    }
    let sign: i64 = if value < 0 { -1 } else { 1 };
    // i64::MIN has no positive counterpart, so widen before taking the magnitude.
    let abs_val = i128::from(value).unsigned_abs() as u64;
    let remainder = (abs_val % MODULUS as u64) as i64;
    let result = sign * remainder;
    if result == -1 { -2 } else { result }
}

/// Hashes an `f64` using CPython's float hashing algorithm.
///
/// Integral floats delegate to [`hash_int`] so `hash(n) == hash(float(n))`.
/// Special values: `+inf` → `314159`, `-inf` → `-314159`, `NaN` → `0`.
#[must_use]
pub(crate) fn hash_float(value: f64) -> i64 {
    if value.is_infinite() {
        return if value > 0.0 { 314_159 } else { -314_159 };
    }
    if value.is_nan() {
        return 0;
    }

    let truncated = value.trunc();
    // 2^63 does not fit in i64
    if value == truncated && truncated >= i64::MIN as f64 && truncated < -(i64::MIN as f64) {
        return hash_int(truncated as i64);
    }

    // frexp-based decomposition, matching `_Py_HashDouble` in `Python/pyhash.c`.
    let (frac, exp) = frexp(value);
    let mut m = frac;
    let mut e = exp;
    let sign: i64 = if m < 0.0 {
        m = -m;
        -1
    } else {
        1
    };

    let mut x: u64 = 0;
    while m > 0.0 {
        x = ((x << 28) & (MODULUS as u64)) | (x >> 33);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let w = m as u64;
        m -= w as f64;
        x = x.wrapping_add(w);
        if x >= MODULUS as u64 {
            x -= MODULUS as u64;
        }
    }

    e %= 61;
    if e < 0 {
        e += 61;
    }
    x = ((x << e as u32) & (MODULUS as u64)) | (x >> (61 - e) as u32);

    let result = (sign * x as i64) % MODULUS;
    if result == -1 { -2 } else { result }
}

/// Combines element hashes with CPython's tuple hash (xxHash-based, 3.8+).
///
/// The empty tuple hashes to a fixed constant, so field-less records are
/// hashable and all instances share one hash.
#[must_use]
pub(crate) fn hash_tuple(lanes: &[i64]) -> i64 {
    const XXPRIME_1: u64 = 11_400_714_785_074_694_791;
    const XXPRIME_2: u64 = 14_029_467_366_897_019_727;
    const XXPRIME_5: u64 = 2_870_177_450_012_600_261;
    const TUPLE_HASH_SUFFIX: u64 = 3_527_539;

    let mut acc = XXPRIME_5;
    for &lane in lanes {
        let lane = u64::from_ne_bytes(lane.to_ne_bytes());
        acc = acc.wrapping_add(lane.wrapping_mul(XXPRIME_2));
        acc = acc.rotate_left(31);
        acc = acc.wrapping_mul(XXPRIME_1);
    }

    acc = acc.wrapping_add((lanes.len() as u64) ^ (XXPRIME_5 ^ TUPLE_HASH_SUFFIX));
    if acc == u64::MAX {
        return 1_546_275_796;
    }
    i64::from_ne_bytes(acc.to_ne_bytes())
}

/// Hash used for values without a value-based hash (plain instances, functions, classes).
///
/// Mirrors CPython's `_Py_HashPointer`: the address rotated right by four bits.
#[must_use]
pub(crate) fn hash_pointer(addr: usize) -> i64 {
    let rotated = (addr as u64).rotate_right(4);
    let signed = i64::from_ne_bytes(rotated.to_ne_bytes());
    if signed == -1 { -2 } else { signed }
}

/// Returns `(frac, exp)` such that `value == frac * 2^exp` with `0.5 <= |frac| < 1.0`.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || value.is_nan() || value.is_infinite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: scale by 2^64 to normalize, then adjust exponent.
        let normalized = value * (1u64 << 63) as f64 * 2.0;
        let (frac, exp) = frexp(normalized);
        return (frac, exp - 64);
    }
    let frac_bits = (bits & 0x800F_FFFF_FFFF_FFFF) | 0x3FE0_0000_0000_0000;
    (f64::from_bits(frac_bits), exponent - 1022)
}

/// Computes SipHash-1-3 with a zero key, matching CPython seed-0 parameters.
#[must_use]
fn siphash13_with_seed0(bytes: &[u8]) -> u64 {
    let mut v0: u64 = 0x736f_6d65_7073_6575;
    let mut v1: u64 = 0x646f_7261_6e64_6f6d;
    let mut v2: u64 = 0x6c79_6765_6e65_7261;
    let mut v3: u64 = 0x7465_6462_7974_6573;

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut block = [0_u8; 8];
        block.copy_from_slice(chunk);
        let message = u64::from_le_bytes(block);
        v3 ^= message;
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        v0 ^= message;
    }

    let mut tail = (bytes.len() as u64) << 56;
    for (index, byte) in chunks.remainder().iter().copied().enumerate() {
        tail |= u64::from(byte) << (index * 8);
    }

    v3 ^= tail;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    v0 ^= tail;
    v2 ^= 0xff;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^ v1 ^ v2 ^ v3
}

fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Expected values taken from CPython 3.11 with PYTHONHASHSEED=0.

    #[test]
    fn int_hash_remaps_minus_one() {
        assert_eq!(hash_int(-1), -2);
        assert_eq!(hash_int(0), 0);
        assert_eq!(hash_int(42), 42);
        assert_eq!(hash_int(1 << 61), 1);
    }

    #[test]
    fn float_hash_agrees_with_int_hash() {
        assert_eq!(hash_float(1.0), hash_int(1));
        assert_eq!(hash_float(-7.0), hash_int(-7));
        assert_eq!(hash_float(1.5), 1_152_921_504_606_846_977);
        assert_eq!(hash_float(-0.5), -1_152_921_504_606_846_976);
        assert_eq!(hash_float(f64::INFINITY), 314_159);
        assert_eq!(hash_float(f64::NAN), 0);
    }

    #[test]
    fn float_hash_at_the_i64_boundary() {
        // 2^63 mod (2^61 - 1) == 4
        assert_eq!(hash_float(9_223_372_036_854_775_808.0), 4);
        assert_eq!(hash_float(-9_223_372_036_854_775_808.0), -4);
        assert_eq!(hash_float(-9_223_372_036_854_775_808.0), hash_int(i64::MIN));
    }

    #[test]
    fn str_hash_matches_seed_zero() {
        assert_eq!(hash_str(""), 0);
        assert_eq!(hash_str("a"), 4_644_417_185_603_328_019);
    }

    #[test]
    fn tuple_hash_matches_cpython() {
        assert_eq!(hash_tuple(&[]), 5_740_354_900_026_072_187);
        assert_eq!(hash_tuple(&[1, 2]), -3_550_055_125_485_641_917);
        assert_eq!(hash_tuple(&[hash_str("a"), 1]), 6_955_645_834_154_447_545);
    }
}
