//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers shared by every polyvox crate. All functions are
//! suitable for `no_std` and safe to call on the audio thread.
//!
//! # Pitch
//!
//! - [`midi_to_freq`] - Equal-tempered note number to Hz (A4 = 440 Hz)
//! - [`tuned_midi_to_freq`] - Same, with a master-tune offset in cents
//! - [`cents_to_ratio`] / [`semitones_to_ratio`] - Interval to frequency ratio
//!
//! # Levels and mixing
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`wet_dry_mix`] - Dry/wet crossfade
//! - [`equal_power_pan`] - Constant-power stereo pan law
//!
//! # Numeric hygiene
//!
//! - [`flush_denormal`] - Zero out subnormal values in feedback loops
//! - [`sanitize`] - Replace NaN/Inf with a fallback
//! - [`soft_limit`] - Output-stage limiter with a knee at full scale

use core::f32::consts::FRAC_PI_4;
use libm::{copysignf, exp2f, expf, logf, sincosf, tanhf};

/// Ceiling that [`soft_limit`] approaches; output magnitude never exceeds it.
pub const SOFT_LIMIT_CEILING: f32 = 1.5;

/// Reference pitch of MIDI note 69 (A4) in Hz.
pub const A4_HZ: f32 = 440.0;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use polyvox_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below 1e-10 are floored so silence maps to -200 dB
/// instead of negative infinity.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Frequency ratio for an interval in cents (`2^(cents/1200)`).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    exp2f(cents / 1200.0)
}

/// Frequency ratio for an interval in semitones (`2^(semitones/12)`).
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Equal-tempered MIDI note to frequency, A4 (69) = 440 Hz.
///
/// # Example
/// ```rust
/// use polyvox_core::midi_to_freq;
///
/// assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-3);
/// assert!((midi_to_freq(60.0) - 261.63).abs() < 0.01);
/// ```
#[inline]
pub fn midi_to_freq(note: f32) -> f32 {
    A4_HZ * exp2f((note - 69.0) / 12.0)
}

/// MIDI note to frequency with a global master-tune offset.
///
/// `freq = 440 · 2^(((note − 69)·100 + tune_cents) / 1200)`
#[inline]
pub fn tuned_midi_to_freq(note: u8, tune_cents: f32) -> f32 {
    let cents = (f32::from(note) - 69.0) * 100.0 + tune_cents;
    A4_HZ * exp2f(cents / 1200.0)
}

/// Equal-power pan law.
///
/// Maps `pan` in [-1, 1] to `(gain_l, gain_r) = (cos θ, sin θ)` with
/// `θ = (pan + 1)·π/4`. Center pan yields `(√½, √½)`.
///
/// # Example
/// ```rust
/// use polyvox_core::equal_power_pan;
///
/// let (l, r) = equal_power_pan(0.0);
/// assert!((l * l + r * r - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    let (s, c) = sincosf(theta);
    (c, s)
}

/// Crossfade between dry and wet signals.
///
/// Equivalent to `dry * (1 - mix) + wet * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Flush subnormal floats to zero.
///
/// Replaces magnitudes below 1e-20 with zero, well before the IEEE 754
/// subnormal range. Use in feedback loops that decay toward silence.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Return `x` if finite, otherwise `fallback`.
///
/// Setters run every input through this before clamping, so a stray NaN
/// from a controller never reaches DSP state.
#[inline]
pub fn sanitize(x: f32, fallback: f32) -> f32 {
    if x.is_finite() { x } else { fallback }
}

/// Soft limiter for the final mix.
///
/// Identity for `|x| <= 1`. Above that a `tanh` knee with unit slope at the
/// joint bends the signal toward [`SOFT_LIMIT_CEILING`]. Non-finite input
/// yields silence.
///
/// ```rust
/// use polyvox_core::soft_limit;
///
/// assert_eq!(soft_limit(0.8), 0.8);
/// assert!(soft_limit(4.0) > 1.4 && soft_limit(4.0) < 1.5);
/// assert!(soft_limit(1e9) <= 1.5);
/// ```
#[inline]
pub fn soft_limit(x: f32) -> f32 {
    let x = sanitize(x, 0.0);
    let mag = x.abs();
    if mag <= 1.0 {
        return x;
    }
    let headroom = SOFT_LIMIT_CEILING - 1.0;
    let limited = 1.0 + headroom * tanhf((mag - 1.0) / headroom);
    copysignf(limited, x)
}
