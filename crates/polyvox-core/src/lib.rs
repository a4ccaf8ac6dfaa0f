//! Polyvox Core - DSP primitives for the polyvox synthesizer
//!
//! Foundational building blocks shared by the synth engine and its effects,
//! designed for real-time use with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`StereoEffect`] - Object-safe stereo effect with an enabled flag
//! - [`EffectChain`] - Ordered chain; disabled effects pass through
//! - [`EffectHandle`] - Typed handle returned when adding an effect
//!
//! ## Reverb Building Blocks
//!
//! - [`DelayBuffer`] - Preallocated circular buffer with a variable length
//! - [`DampedComb`] - Feedback comb with one-pole damping
//! - [`SchroederAllpass`] - Diffusion allpass
//!
//! ## Modulation & Randomness
//!
//! - [`Lfo`] - Five-waveform LFO with sample-and-hold
//! - [`Noise`] - Seeded uniform noise; every random stream is reproducible
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Range, default, unit and scaling for one parameter
//!
//! ## Utilities
//!
//! - Pitch: [`midi_to_freq`], [`tuned_midi_to_freq`], [`cents_to_ratio`]
//! - Mixing: [`equal_power_pan`], [`wet_dry_mix`], [`db_to_linear`]
//! - Hygiene: [`flush_denormal`], [`sanitize`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature:
//!
//! ```toml
//! [dependencies]
//! polyvox-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use polyvox_core::{DampedComb, SchroederAllpass};
//!
//! let mut comb = DampedComb::new(4096);
//! comb.set_delay_samples(1310);
//! comb.set_feedback(0.84);
//!
//! let mut diffuser = SchroederAllpass::new(512);
//! diffuser.set_delay_samples(220);
//!
//! let mut tail = 0.0;
//! for n in 0..44100 {
//!     let input = if n == 0 { 1.0 } else { 0.0 };
//!     tail = diffuser.process(comb.process(input));
//! }
//! assert!(tail.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod allpass;
pub mod comb;
pub mod delay;
pub mod effect;
pub mod lfo;
pub mod math;
pub mod noise;
pub mod param_info;

pub use allpass::SchroederAllpass;
pub use comb::{DampedComb, MAX_COMB_FEEDBACK};
pub use delay::{AllocError, DelayBuffer};
pub use effect::{EffectChain, EffectHandle, StereoEffect};
pub use lfo::{Lfo, LfoWaveform, MIN_LFO_RATE_HZ};
pub use math::{
    A4_HZ, SOFT_LIMIT_CEILING, cents_to_ratio, db_to_linear, equal_power_pan, flush_denormal,
    linear_to_db, midi_to_freq, sanitize, semitones_to_ratio, soft_limit, tuned_midi_to_freq,
    wet_dry_mix,
};
pub use noise::{Noise, derive_seed};
pub use param_info::{ParamDescriptor, ParamFlags, ParamScale, ParamUnit};
