//! Balance transform between a signed balance value and two channel scalars.
//!
//! The mapping is triangular: the louder side always stays at full scale
//! and only the quieter side is attenuated, so decoding a freshly encoded
//! value yields the input back.

/// Levels below this are treated as silence when normalizing.
pub const SILENCE_EPSILON: f32 = 1e-6;

/// Clamp a requested balance to [-1, 1]. NaN centers.
pub fn clamp_balance(balance: f32) -> f32 {
    if balance.is_nan() {
        0.0
    } else {
        balance.clamp(-1.0, 1.0)
    }
}

/// Per-channel gain factors `(left, right)` for a balance value.
///
/// Both factors are in [0, 1]; at least one of them is exactly 1.
pub fn channel_factors(balance: f32) -> (f32, f32) {
    let balance = clamp_balance(balance);
    let right = 1.0 + balance.min(0.0);
    let left = 1.0 - balance.max(0.0);
    (left, right)
}

/// Balance of channels expressed relative to an independent master level.
///
/// The result is not clamped: channel levels above master yield a value
/// outside [-1, 1].
pub fn decode_master_relative(master: f32, left: f32, right: f32) -> f32 {
    let master = master.max(SILENCE_EPSILON);
    (right - left) / master
}

/// Balance of two channels normalized by the louder one.
///
/// Two silent channels decode as centered.
pub fn decode_self_normalizing(left: f32, right: f32) -> f32 {
    let norm = left.max(right);
    if norm < SILENCE_EPSILON {
        return 0.0;
    }
    (right - left) / norm
}
