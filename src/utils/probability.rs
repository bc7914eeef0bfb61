//! The probability check of the receive branch.
//!
//! A recipient wins when the last 8 bytes of `HASH160(salt || secret)`, read as
//! a big-endian integer and compared as a *signed* 64-bit number, are strictly
//! below the covenant's probability threshold. The covenant script performs the
//! same comparison, so [`is_winning_secret`] must stay bit-identical to it.
//!
//! # Signedness
//!
//! The threshold is an `i64` and the hash value is compared as an `i64` too.
//! Every hash value with the top bit set is negative and therefore wins against
//! any non-negative threshold. [`probability_ratio`] and [`probability_from_ratio`]
//! nevertheless map a threshold `t` to the ratio `t / 2^64`; they are the
//! conventional conversions, not the exact winning fraction, which is
//! `(t + 2^63) / 2^64`.
//!
//! # Precision
//!
//! An `f64` carries 53 significant bits, so thresholds whose magnitude needs
//! more than 53 significant bits do not survive a round trip through a ratio
//! exactly. Ratios at or above `0.5` saturate to `i64::MAX`, ratios below
//! `-0.5` saturate to `i64::MIN`, and `NaN` maps to `0`.
use crate::utils::hash::hash160;

/// A probability threshold over the signed 64-bit hash space.
pub type ProbabilityThreshold = i64;

/// 2^64 as a float, exact.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Checks whether revealing `secret` would clear the covenant's probability
/// check for the given `salt` and `threshold`.
pub fn is_winning_secret(
    secret: &[u8; 32],
    salt: &[u8; 4],
    threshold: ProbabilityThreshold,
) -> bool {
    secret_value(secret, salt) < threshold
}

/// The signed value the probability check compares against the threshold.
pub fn secret_value(secret: &[u8; 32], salt: &[u8; 4]) -> i64 {
    let mut preimage = [0u8; 36];
    preimage[..4].copy_from_slice(salt);
    preimage[4..].copy_from_slice(secret);

    let digest = hash160(&preimage);
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[12..]);
    u64::from_be_bytes(tail) as i64
}

/// Converts a threshold to the ratio `threshold / 2^64`.
pub fn probability_ratio(threshold: ProbabilityThreshold) -> f64 {
    threshold as f64 / TWO_POW_64
}

/// Converts a ratio to the threshold `floor(ratio * 2^64)`.
///
/// Only ratios in `[-0.5, 0.5)` are represented. Anything at or above `0.5`
/// (including `1.0` and `+inf`) saturates to `i64::MAX`, which converts back
/// to the ratio `0.5`. Anything below `-0.5` saturates to `i64::MIN`, and
/// `NaN` gives `0`. Within the range, ratios keep 53 significant bits.
pub fn probability_from_ratio(ratio: f64) -> ProbabilityThreshold {
    (ratio * TWO_POW_64).floor() as i64
}
