//! Stable bucketing hashes.
//!
//! FNV-1a is fully specified (offset basis and prime), so bucket positions
//! survive process restarts and can be recomputed by any other
//! implementation replaying or auditing an experiment. Bucketing needs
//! uniformity, not cryptographic strength.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bits of hash used as the variant bucketing point.
pub const BUCKET_BITS: u32 = 32;

/// Size of the bucketing space. Variant allocations are converted to
/// integer widths over this span, so cumulative widths cover it exactly.
pub const BUCKET_SPAN: u64 = 1 << BUCKET_BITS;

fn fnv1a_update(mut hash: u64, data: &[u8]) -> u64 {
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// 64-bit FNV-1a hash.
#[must_use]
pub fn fnv1a(data: &[u8]) -> u64 {
    fnv1a_update(FNV_OFFSET, data)
}

/// Map a hash to the unit interval [0, 1) using its top 53 bits.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn unit_interval(hash: u64) -> f64 {
    // 53 bits fit an f64 mantissa exactly, so the result is uniform on a
    // 2^53-point grid and strictly below 1.0.
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Traffic-gating position for a user in [0, 1).
///
/// Hashes the user id alone, independent of experiment identity, so a
/// user's global eligibility position is consistent across experiments
/// sharing a traffic allocation fraction.
#[must_use]
pub fn traffic_position(user_id: &str) -> f64 {
    unit_interval(fnv1a(user_id.as_bytes()))
}

/// Variant bucketing point for (user, experiment) in [0, `BUCKET_SPAN`).
///
/// Equivalent to hashing the concatenation `user_id + ":" + experiment_id`
/// and taking the top [`BUCKET_BITS`] bits; seeding per experiment keeps
/// this independent of the traffic-gating hash.
#[must_use]
pub fn bucket_point(user_id: &str, experiment_id: &str) -> u64 {
    let hash = fnv1a_update(
        fnv1a_update(fnv1a_update(FNV_OFFSET, user_id.as_bytes()), b":"),
        experiment_id.as_bytes(),
    );
    hash >> (64 - BUCKET_BITS)
}

/// Convert a variant allocation fraction to an integer bucket width.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn allocation_width(allocation: f64) -> u64 {
    (allocation * BUCKET_SPAN as f64).round() as u64
}
