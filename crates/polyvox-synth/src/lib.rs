//! Polyvox Synth - polyphonic subtractive synthesis engine
//!
//! A two-oscillator analog-style voice (VCO-A, VCO-B, noise, ring mod,
//! drive) through a multimode VCF and two ADSR envelopes, pooled into a
//! polyphonic synth with unison, glide, PolyMod, cross-FM, a global LFO and
//! mod wheel, and a stereo reverb on the output.
//!
//! # Core Components
//!
//! ## Voice building blocks
//!
//! - [`Oscillator`] - 2× oversampled naive oscillator with PWM and additive mode
//! - [`Vcf`] / [`FilterType`] - 24 dB ladder plus 12 dB state-variable modes
//! - [`Envelope`] / [`EnvelopeParams`] - linear-segment ADSR
//! - [`AnalogDrift`] - slow seeded pink-ish wander for pitch and pulse width
//! - [`Voice`] / [`VoiceParams`] - one complete voice
//!
//! ## Modulation
//!
//! - [`ModMatrix`] - composes the shared LFO and wheel into a [`ModBundle`]
//!   once per frame
//!
//! ## Synth
//!
//! - [`PolySynth`] - voice pool, allocation, parameter dispatch, effects
//! - [`ParamId`] - stable identifiers with range metadata
//!
//! # no_std Support
//!
//! Everything except the cross-thread control queue works without `std`:
//!
//! ```toml
//! [dependencies]
//! polyvox-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use polyvox_synth::{ParamId, PolySynth, Waveform};
//!
//! let mut synth = PolySynth::new(48000.0, 8);
//! synth.set_int(ParamId::Osc1Waveform, Waveform::Saw.index()).unwrap();
//! synth.set_float(ParamId::Osc2Level, 0.6).unwrap();
//! synth.set_float(ParamId::VcoBDetune, 7.0).unwrap();
//! synth.set_float(ParamId::VcfCutoff, 1800.0).unwrap();
//! synth.set_int(ParamId::ReverbEnabled, 1).unwrap();
//!
//! synth.note_on(60, 100);
//! synth.note_on(64, 100);
//! synth.note_on(67, 100);
//!
//! let mut left = vec![0.0; 1024];
//! let mut right = vec![0.0; 1024];
//! synth.render(&mut left, &mut right);
//! assert!(left.iter().chain(&right).all(|s| s.is_finite()));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

#[cfg(feature = "std")]
pub mod control;
pub mod drift;
pub mod envelope;
pub mod filter;
pub mod modulation;
pub mod oscillator;
pub mod params;
pub mod synth;
pub mod voice;

#[cfg(feature = "std")]
pub use control::{CommandReceiver, ControlError, ControlHandle, SynthCommand, control_channel};
pub use drift::AnalogDrift;
pub use envelope::{Envelope, EnvelopeParams, EnvelopeState};
pub use filter::{FilterType, Vcf};
pub use modulation::{LfoRouting, ModBundle, ModMatrix, WheelRouting, WheelSource};
pub use oscillator::{MAX_HARMONICS, Oscillator, Waveform};
pub use params::{ParamError, ParamId, ParamValue};
pub use synth::{DEFAULT_SEED, PolySynth};
pub use voice::{Voice, VoiceParams};

// Re-export the shared pieces callers need alongside the synth
pub use polyvox_core::{LfoWaveform, ParamDescriptor, ParamScale, ParamUnit, StereoEffect};
pub use polyvox_effects::Reverb;
